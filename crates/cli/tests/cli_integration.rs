use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const GREET: &str = r#"{
    "fields": [
        { "name": "name", "kind": "scalar", "argument": { "index": 0 } },
        { "name": "tags", "kind": "collection", "argument": { "index": 1, "optional": true } },
        { "name": "mode", "kind": "scalar", "enum": ["loud", "quiet"],
          "option": { "description": "How to greet" } },
        { "name": "verbose", "kind": "flag", "option": { "description": "Print more" } },
        { "name": "help", "kind": "flag",
          "option": { "description": "Show this help", "autonomous": true } }
    ]
}"#;

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("argbind-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_descriptor(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write descriptor");
    path
}

fn argbind() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_argbind"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn help_works() {
    let out = argbind()
        .arg("--help")
        .output()
        .expect("failed to run argbind --help");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));
    let text = stdout(&out);
    assert!(
        text.contains("usage") && text.contains("parse"),
        "unexpected help output:\n{text}"
    );
}

#[test]
fn usage_renders_descriptor() {
    let dir = make_temp_dir("usage");
    let path = write_descriptor(&dir, "greet.json", GREET);

    let out = argbind()
        .arg("usage")
        .arg(&path)
        .output()
        .expect("failed to run argbind usage");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "Usage: greet [options] <name> [tags] [...]\n\
         Options\n\
         \x20 -m, --mode    How to greet\n\
         \x20 -v, --verbose Print more\n\
         \x20 -h, --help    Show this help\n"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn usage_honours_name_and_invocation() {
    let dir = make_temp_dir("usage-prefix");
    let path = write_descriptor(&dir, "greet.json", GREET);

    let out = argbind()
        .arg("usage")
        .arg(&path)
        .args(["--app-name", "hello.jar", "--invocation", "java -jar"])
        .output()
        .expect("failed to run argbind usage");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));
    assert!(
        stdout(&out).starts_with("Usage: java -jar hello.jar [options] <name>"),
        "unexpected usage:\n{}",
        stdout(&out)
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_prints_bound_values_in_declaration_order() {
    let dir = make_temp_dir("parse");
    let path = write_descriptor(&dir, "greet.json", GREET);

    let out = argbind()
        .arg("parse")
        .arg(&path)
        .args(["--", "-v", "Ada", "x", "y", "--mode", "LOUD"])
        .output()
        .expect("failed to run argbind parse");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));

    // Compared as text: a parsed `serde_json::Value` would sort the keys.
    assert_eq!(
        stdout(&out),
        r#"{
  "name": "Ada",
  "tags": [
    "x",
    "y"
  ],
  "mode": "loud",
  "verbose": true
}
"#
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_output_is_not_sorted_by_name() {
    let dir = make_temp_dir("parse-order");
    let path = write_descriptor(
        &dir,
        "order.json",
        r#"{
            "fields": [
                { "name": "zeta", "kind": "scalar", "argument": { "index": 0 } },
                { "name": "alpha", "kind": "flag", "option": { "description": "A" } }
            ]
        }"#,
    );

    let out = argbind()
        .arg("parse")
        .arg(&path)
        .args(["--", "-a", "z"])
        .output()
        .expect("failed to run argbind parse");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));
    assert_eq!(stdout(&out), "{\n  \"zeta\": \"z\",\n  \"alpha\": true\n}\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn usage_wraps_descriptions_to_width() {
    let dir = make_temp_dir("usage-width");
    let path = write_descriptor(
        &dir,
        "build.json",
        r#"{
            "fields": [
                { "name": "file", "kind": "scalar", "argument": { "index": 0 } },
                { "name": "verbose", "kind": "flag", "option": {
                    "description": "Print every step while the pipeline runs, including hidden files"
                } },
                { "name": "out", "kind": "scalar", "option": { "description": "Target" } }
            ]
        }"#,
    );

    let out = argbind()
        .arg("usage")
        .arg(&path)
        .args(["--width", "40"])
        .output()
        .expect("failed to run argbind usage");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));
    let text = stdout(&out);
    assert_eq!(
        text,
        "Usage: build [options] <file>\n\
         Options\n\
         \x20 -v, --verbose Print every step while\n\
         \x20               the pipeline runs,\n\
         \x20               including hidden files\n\
         \x20 -o, --out     Target\n"
    );
    assert!(text.lines().all(|line| line.chars().count() <= 40), "{text}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rejected_tokens_exit_with_usage_on_stderr() {
    let dir = make_temp_dir("reject");
    let path = write_descriptor(&dir, "greet.json", GREET);

    let out = argbind()
        .arg("parse")
        .arg(&path)
        .args(["--", "--verbose"])
        .output()
        .expect("failed to run argbind parse");
    assert_eq!(out.status.code(), Some(2), "stderr:\n{}", stderr(&out));
    assert!(stdout(&out).is_empty());
    assert!(
        stderr(&out).contains("Usage: greet [options] <name>"),
        "unexpected stderr:\n{}",
        stderr(&out)
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn autonomous_option_accepts_incomplete_input() {
    let dir = make_temp_dir("autonomous");
    let path = write_descriptor(&dir, "greet.json", GREET);

    let out = argbind()
        .arg("parse")
        .arg(&path)
        .args(["--", "-h"])
        .output()
        .expect("failed to run argbind parse");
    assert!(out.status.success(), "stderr:\n{}", stderr(&out));
    let json: serde_json::Value =
        serde_json::from_str(&stdout(&out)).expect("parse output is not JSON");
    assert_eq!(json, serde_json::json!({ "help": true }));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn conflicting_short_names_are_reported() {
    let dir = make_temp_dir("conflict");
    let path = write_descriptor(
        &dir,
        "bad.json",
        r#"{
            "fields": [
                { "name": "verbose", "kind": "flag", "option": { "description": "a" } },
                { "name": "version", "kind": "flag", "option": { "description": "b" } },
                { "name": "vendor", "kind": "flag", "option": { "description": "c" } }
            ]
        }"#,
    );

    let out = argbind()
        .arg("usage")
        .arg(&path)
        .output()
        .expect("failed to run argbind usage");
    assert_eq!(out.status.code(), Some(1));
    assert!(
        stderr(&out).contains("invalid descriptor"),
        "unexpected stderr:\n{}",
        stderr(&out)
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_descriptor_is_an_error() {
    let dir = make_temp_dir("missing");

    let out = argbind()
        .arg("usage")
        .arg(dir.join("nope.json"))
        .output()
        .expect("failed to run argbind usage");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("failed to read descriptor"));

    let _ = fs::remove_dir_all(&dir);
}
