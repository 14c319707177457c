mod descriptor;
mod record;

use anyhow::{Context, Result};
use argbind::{DEFAULT_LINE_WIDTH, ParseError, ParserSpec, UsageFormatter};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

use crate::descriptor::Descriptor;
use crate::record::JsonRecord;

#[derive(Parser)]
#[command(name = "argbind")]
#[command(version, about = "Bind argument lists against a JSON descriptor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the usage text for a descriptor
    Usage(UsageArgs),

    /// Parse tokens against a descriptor and print the bound values as JSON
    Parse(ParseArgs),
}

#[derive(Parser)]
struct UsageArgs {
    /// Path to the descriptor JSON file
    #[arg(value_name = "DESCRIPTOR")]
    descriptor: PathBuf,

    /// Application name shown in the usage line (default: descriptor file stem)
    #[arg(long, value_name = "NAME")]
    app_name: Option<String>,

    /// Maximum line width of the rendered text
    #[arg(long, value_name = "N", default_value_t = DEFAULT_LINE_WIDTH)]
    width: usize,

    /// Command prefix printed before the application name, e.g. "java -jar"
    #[arg(long, value_name = "PREFIX")]
    invocation: Option<String>,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the descriptor JSON file
    #[arg(value_name = "DESCRIPTOR")]
    descriptor: PathBuf,

    /// Application name shown in the usage line on rejection
    #[arg(long, value_name = "NAME")]
    app_name: Option<String>,

    /// Tokens to parse (pass them after `--`)
    #[arg(last = true, value_name = "TOKENS")]
    tokens: Vec<String>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Usage(args) => cmd_usage(args),
        Commands::Parse(args) => cmd_parse(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_spec(path: &Path) -> Result<ParserSpec> {
    let descriptor = Descriptor::from_file(path)?;
    let spec = ParserSpec::build(descriptor.decls())
        .with_context(|| format!("invalid descriptor: {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        fields = spec.slots().len(),
        "loaded descriptor"
    );
    Ok(spec)
}

fn app_name(explicit: Option<String>, descriptor: &Path) -> String {
    explicit
        .or_else(|| {
            descriptor
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "app".to_string())
}

fn cmd_usage(args: UsageArgs) -> Result<ExitCode> {
    let spec = load_spec(&args.descriptor)?;
    let mut formatter = UsageFormatter::new().line_width(args.width);
    if let Some(prefix) = args.invocation {
        formatter = formatter.invocation(prefix);
    }

    let name = app_name(args.app_name, &args.descriptor);
    print!("{}", formatter.format(&spec, &name));
    Ok(ExitCode::SUCCESS)
}

fn cmd_parse(args: ParseArgs) -> Result<ExitCode> {
    let spec = load_spec(&args.descriptor)?;
    let mut record = JsonRecord::new(&spec);

    match spec.parse_into(&mut record, &args.tokens) {
        Ok(()) => {}
        Err(ParseError::Rejected) => {
            let name = app_name(args.app_name, &args.descriptor);
            eprint!("{}", UsageFormatter::new().format(&spec, &name));
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(anyhow::Error::new(err).context("failed to bind arguments")),
    }

    let json = serde_json::to_string_pretty(&record.into_json(&spec))?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
