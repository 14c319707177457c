//! Single-pass token scan that binds options and positionals into a record.

use crate::descriptor::{Bind, BoundValue, ValueKind};
use crate::error::ParseError;
use crate::spec::{FieldSlot, OptionEntry, ParserSpec};

/// Scan state, owned by one parse call.
#[derive(Debug)]
struct Scan {
    /// Next positional to fill.
    cursor: usize,
    /// Cleared by soft failures; scanning goes on.
    valid: bool,
    /// Set once an autonomous option was seen.
    force_valid: bool,
    saw_collection_positional: bool,
}

impl Scan {
    fn new() -> Self {
        Self {
            cursor: 0,
            valid: true,
            force_valid: false,
            saw_collection_positional: false,
        }
    }

    fn finish(mut self, spec: &ParserSpec) -> Result<(), ParseError> {
        if self.saw_collection_positional {
            self.cursor += 1;
        }

        if self.force_valid {
            return Ok(());
        }

        let count_ok = spec.non_optional_count() <= self.cursor
            && self.cursor <= spec.positionals().len();
        if self.valid && count_ok {
            return Ok(());
        }

        tracing::debug!(
            valid = self.valid,
            filled = self.cursor,
            required = spec.non_optional_count(),
            declared = spec.positionals().len(),
            "rejecting arguments"
        );
        Err(ParseError::Rejected)
    }
}

impl ParserSpec {
    /// Bind `tokens` into `record`.
    ///
    /// Options are matched by exact name only; any token that is not a
    /// registered name goes to the next positional slot. Value-taking options
    /// always consume the next token. Collection options then keep consuming
    /// until the next registered option name, and a collection positional
    /// absorbs every later non-option token.
    ///
    /// On error the record may hold values bound before the failure; callers
    /// should discard it.
    pub fn parse_into<B, S>(&self, record: &mut B, tokens: &[S]) -> Result<(), ParseError>
    where
        B: Bind + ?Sized,
        S: AsRef<str>,
    {
        let mut scan = Scan::new();
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i].as_ref();

            if let Some(entry) = self.option(token) {
                i = self.consume_option(record, entry, tokens, i, &mut scan)?;
                continue;
            }

            if let Some(argument) = self.positionals().get(scan.cursor) {
                let slot = self.slot(argument.slot());
                tracing::trace!(token, field = slot.name(), "positional");
                record.bind(slot, coerce(slot, token)?)?;
                if slot.kind().is_collection() {
                    scan.saw_collection_positional = true;
                } else {
                    scan.cursor += 1;
                }
            } else {
                tracing::debug!(token, "no positional slot left");
                scan.valid = false;
            }
            i += 1;
        }

        scan.finish(self)
    }

    /// Handle the option at `tokens[at]`, returning the index of the next
    /// unconsumed token.
    fn consume_option<B, S>(
        &self,
        record: &mut B,
        entry: &OptionEntry,
        tokens: &[S],
        at: usize,
        scan: &mut Scan,
    ) -> Result<usize, ParseError>
    where
        B: Bind + ?Sized,
        S: AsRef<str>,
    {
        let slot = self.slot(entry.slot());
        let mut next = at + 1;

        if !slot.kind().takes_value() {
            tracing::trace!(option = entry.alias(), "flag");
            record.bind(slot, BoundValue::Flag)?;
        } else if let Some(value) = tokens.get(next) {
            tracing::trace!(option = entry.alias(), value = value.as_ref(), "option value");
            record.bind(slot, coerce(slot, value.as_ref())?)?;
            next += 1;

            if slot.kind().is_collection() {
                while let Some(value) = tokens.get(next).map(|t| t.as_ref()) {
                    if self.is_option_name(value) {
                        break;
                    }
                    record.bind(slot, coerce(slot, value)?)?;
                    next += 1;
                }
            }
        } else {
            tracing::debug!(option = entry.alias(), "missing option value");
            scan.valid = false;
        }

        if entry.is_autonomous() {
            scan.force_valid = true;
        }
        Ok(next)
    }
}

/// Resolve enum tokens case-insensitively. An unknown constant rejects the
/// whole parse on the spot, unlike surplus tokens which only mark it invalid.
fn coerce<'a>(slot: &'a FieldSlot, token: &'a str) -> Result<BoundValue<'a>, ParseError> {
    match slot.kind().value_kind() {
        Some(ValueKind::Enum(constants)) => {
            let wanted = token.to_uppercase();
            match constants.iter().position(|c| *c == wanted) {
                Some(index) => Ok(BoundValue::Constant {
                    index,
                    name: &constants[index],
                }),
                None => {
                    tracing::debug!(token, field = slot.name(), "unknown enum constant");
                    Err(ParseError::Rejected)
                }
            }
        }
        _ => Ok(BoundValue::Text(token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ArgumentDecl, FieldDecl, FieldKind, OptionDecl};
    use crate::error::BindError;

    /// Records every bind call as `(field, value)`.
    #[derive(Debug, Default)]
    struct Trace {
        calls: Vec<(String, String)>,
    }

    impl Trace {
        fn values(&self, field: &str) -> Vec<&str> {
            self.calls
                .iter()
                .filter(|(f, _)| f == field)
                .map(|(_, v)| v.as_str())
                .collect()
        }
    }

    impl Bind for Trace {
        fn bind(&mut self, slot: &FieldSlot, value: BoundValue<'_>) -> Result<(), BindError> {
            let value = match value {
                BoundValue::Flag => "true".to_string(),
                BoundValue::Text(text) => text.to_string(),
                BoundValue::Constant { index, name } => format!("{name}#{index}"),
            };
            if value == "poison" {
                return Err(BindError::new(slot, value, "anything but poison"));
            }
            self.calls.push((slot.name().to_string(), value));
            Ok(())
        }
    }

    fn text() -> FieldKind {
        FieldKind::Scalar(ValueKind::Text)
    }

    fn list() -> FieldKind {
        FieldKind::Collection(ValueKind::Text)
    }

    fn color() -> FieldKind {
        FieldKind::Scalar(ValueKind::enumeration(["RED", "GREEN"]))
    }

    fn parse(spec: &ParserSpec, tokens: &[&str]) -> Result<Trace, ParseError> {
        let mut trace = Trace::default();
        spec.parse_into(&mut trace, tokens)?;
        Ok(trace)
    }

    fn build(fields: Vec<FieldDecl>) -> ParserSpec {
        ParserSpec::build(fields).unwrap()
    }

    #[test]
    fn empty_spec_accepts_empty_input() {
        let spec = build(vec![]);
        let trace = parse(&spec, &[]).unwrap();
        assert!(trace.calls.is_empty());
    }

    #[test]
    fn empty_spec_rejects_surplus_token() {
        let spec = build(vec![]);
        assert_eq!(parse(&spec, &["x"]).unwrap_err(), ParseError::Rejected);
    }

    #[test]
    fn required_positional_count_is_enforced() {
        let spec = build(vec![
            FieldDecl::new("src", text()).argument(ArgumentDecl::new(0)),
            FieldDecl::new("dst", text()).argument(ArgumentDecl::new(1)),
            FieldDecl::new("mode", text()).argument(ArgumentDecl::new(2).optional()),
        ]);

        assert!(parse(&spec, &[]).unwrap_err().is_rejected());
        assert!(parse(&spec, &["a"]).unwrap_err().is_rejected());
        assert!(parse(&spec, &["a", "b"]).is_ok());
        let trace = parse(&spec, &["a", "b", "c"]).unwrap();
        assert_eq!(trace.values("mode"), ["c"]);
        assert!(parse(&spec, &["a", "b", "c", "d"]).unwrap_err().is_rejected());
    }

    #[test]
    fn surplus_token_keeps_scanning() {
        let spec = build(vec![
            FieldDecl::new("src", text()).argument(ArgumentDecl::new(0)),
            FieldDecl::new("help", FieldKind::Flag).option(OptionDecl::new("Help").autonomous()),
        ]);
        // The surplus token only marks the parse invalid; the later
        // autonomous option is still seen.
        let trace = parse(&spec, &["a", "b", "--help"]).unwrap();
        assert_eq!(trace.values("help"), ["true"]);
    }

    #[test]
    fn autonomous_option_overrides_missing_positionals() {
        let spec = build(vec![
            FieldDecl::new("src", text()).argument(ArgumentDecl::new(0)),
            FieldDecl::new("dst", text()).argument(ArgumentDecl::new(1)),
            FieldDecl::new("help", FieldKind::Flag).option(OptionDecl::new("Help").autonomous()),
        ]);
        assert!(parse(&spec, &["-h"]).is_ok());
        assert!(parse(&spec, &["only", "--help"]).is_ok());
        assert!(parse(&spec, &["only"]).unwrap_err().is_rejected());
    }

    #[test]
    fn value_option_consumes_next_token() {
        let spec = build(vec![
            FieldDecl::new("output", text()).option(OptionDecl::new("Output file")),
            FieldDecl::new("input", text()).argument(ArgumentDecl::new(0)),
        ]);
        let trace = parse(&spec, &["-o", "out.txt", "in.txt"]).unwrap();
        assert_eq!(trace.values("output"), ["out.txt"]);
        assert_eq!(trace.values("input"), ["in.txt"]);

        // The next token is the value even when it looks like an option.
        let spec = build(vec![
            FieldDecl::new("output", text()).option(OptionDecl::new("Output file")),
            FieldDecl::new("verbose", FieldKind::Flag).option(OptionDecl::new("Verbose")),
        ]);
        let trace = parse(&spec, &["--output", "--verbose"]).unwrap();
        assert_eq!(trace.values("output"), ["--verbose"]);
        assert!(trace.values("verbose").is_empty());
    }

    #[test]
    fn missing_option_value_is_rejected() {
        let spec = build(vec![
            FieldDecl::new("output", text()).option(OptionDecl::new("Output file")),
        ]);
        assert!(parse(&spec, &["--output"]).unwrap_err().is_rejected());
    }

    #[test]
    fn autonomous_value_option_without_value_still_succeeds() {
        let spec = build(vec![
            FieldDecl::new("topic", text()).option(OptionDecl::new("Help topic").autonomous()),
            FieldDecl::new("src", text()).argument(ArgumentDecl::new(0)),
        ]);
        assert!(parse(&spec, &["--topic"]).is_ok());
    }

    #[test]
    fn collection_option_is_greedy_until_next_option() {
        let spec = build(vec![
            FieldDecl::new("tags", list()).option(OptionDecl::new("Tags")),
            FieldDecl::new("verbose", FieldKind::Flag).option(OptionDecl::new("Verbose")),
        ]);
        let trace = parse(&spec, &["--tags", "a", "b", "--verbose"]).unwrap();
        assert_eq!(trace.values("tags"), ["a", "b"]);
        assert_eq!(trace.values("verbose"), ["true"]);
    }

    #[test]
    fn collection_option_never_yields_tokens_to_positionals() {
        let spec = build(vec![
            FieldDecl::new("tags", list()).option(OptionDecl::new("Tags")),
            FieldDecl::new("file", text()).argument(ArgumentDecl::new(0)),
        ]);
        // "x" and "y" both go to --tags, leaving the required positional empty.
        assert!(parse(&spec, &["--tags", "x", "y"]).unwrap_err().is_rejected());

        let trace = parse(&spec, &["f", "--tags", "x", "y"]).unwrap();
        assert_eq!(trace.values("file"), ["f"]);
        assert_eq!(trace.values("tags"), ["x", "y"]);
    }

    #[test]
    fn trailing_collection_positional_absorbs_rest() {
        let spec = build(vec![
            FieldDecl::new("first", text()).argument(ArgumentDecl::new(0)),
            FieldDecl::new("rest", list()).argument(ArgumentDecl::new(1)),
        ]);
        let trace = parse(&spec, &["x", "p", "q", "r"]).unwrap();
        assert_eq!(trace.values("first"), ["x"]);
        assert_eq!(trace.values("rest"), ["p", "q", "r"]);
    }

    #[test]
    fn collection_positional_continues_after_options() {
        let spec = build(vec![
            FieldDecl::new("files", list()).argument(ArgumentDecl::new(0)),
            FieldDecl::new("verbose", FieldKind::Flag).option(OptionDecl::new("Verbose")),
        ]);
        let trace = parse(&spec, &["a", "-v", "b"]).unwrap();
        assert_eq!(trace.values("files"), ["a", "b"]);
    }

    #[test]
    fn collection_positional_counts_as_one_slot() {
        let spec = build(vec![
            FieldDecl::new("first", text()).argument(ArgumentDecl::new(0)),
            FieldDecl::new("rest", list()).argument(ArgumentDecl::new(1)),
        ]);
        // Filling both slots is within the declared count.
        assert!(parse(&spec, &["x", "p"]).is_ok());
        // The collection is required too.
        assert!(parse(&spec, &["x"]).unwrap_err().is_rejected());
    }

    #[test]
    fn enum_positional_resolves_case_insensitively() {
        let spec = build(vec![FieldDecl::new("color", color()).argument(ArgumentDecl::new(0))]);
        let trace = parse(&spec, &["green"]).unwrap();
        assert_eq!(trace.values("color"), ["GREEN#1"]);
    }

    #[test]
    fn unknown_enum_constant_stops_the_scan() {
        let spec = build(vec![
            FieldDecl::new("color", color()).argument(ArgumentDecl::new(0)),
            FieldDecl::new("help", FieldKind::Flag).option(OptionDecl::new("Help").autonomous()),
        ]);
        let mut trace = Trace::default();
        let err = spec.parse_into(&mut trace, &["BLUE", "--help"]).unwrap_err();
        assert_eq!(err, ParseError::Rejected);
        // Nothing after the bad token was bound, so --help never took effect.
        assert!(trace.calls.is_empty());
    }

    #[test]
    fn enum_option_value_is_coerced() {
        let spec = build(vec![FieldDecl::new("color", color()).option(OptionDecl::new("Color"))]);
        let trace = parse(&spec, &["-c", "Red"]).unwrap();
        assert_eq!(trace.values("color"), ["RED#0"]);
        assert!(parse(&spec, &["-c", "blue"]).unwrap_err().is_rejected());
    }

    #[test]
    fn binding_error_aborts_the_scan() {
        let spec = build(vec![
            FieldDecl::new("files", list()).argument(ArgumentDecl::new(0)),
        ]);
        let mut trace = Trace::default();
        let err = spec
            .parse_into(&mut trace, &["ok", "poison", "after"])
            .unwrap_err();
        let ParseError::Binding(err) = err else {
            panic!("expected Binding, got: {err:?}");
        };
        assert_eq!(err.field, "files");
        assert_eq!(trace.values("files"), ["ok"]);
    }

    #[test]
    fn spec_can_be_shared_between_threads() {
        let spec = build(vec![FieldDecl::new("name", text()).argument(ArgumentDecl::new(0))]);
        std::thread::scope(|s| {
            for name in ["a", "b", "c"] {
                let spec = &spec;
                s.spawn(move || {
                    let trace = parse(spec, &[name]).unwrap();
                    assert_eq!(trace.values("name"), [name]);
                });
            }
        });
    }
}
