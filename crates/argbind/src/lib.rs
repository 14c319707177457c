//! Declarative command-line argument binding.
//!
//! A record type describes its positional arguments and options through
//! attributes; the parser binds a token list into a fresh instance and the
//! usage formatter renders help text from the same description.
//!
//! ```
//! use argbind::{ArgEnum, Args, Parser};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, ArgEnum)]
//! enum Format {
//!     Plain,
//!     Json,
//! }
//!
//! #[derive(Debug, Default, Args)]
//! struct Cli {
//!     #[argument(index = 0)]
//!     input: String,
//!     #[argument(index = 1, optional)]
//!     format: Option<Format>,
//!     #[option(description = "Print more output")]
//!     verbose: bool,
//!     #[option(description = "Show this help", autonomous)]
//!     help: bool,
//! }
//!
//! let parser = Parser::<Cli>::new().unwrap();
//! let cli = parser.parse(&["in.txt", "json", "-v"]).unwrap();
//! assert_eq!(cli.input, "in.txt");
//! assert_eq!(cli.format, Some(Format::Json));
//! assert!(cli.verbose);
//!
//! assert!(parser.parse::<&str>(&[]).unwrap_err().is_rejected());
//! assert!(parser.parse(&["--help"]).unwrap().help);
//! ```
//!
//! The core operates on a [`ParserSpec`] built from [`FieldDecl`]s, so records
//! whose shape is only known at runtime can implement [`Bind`] by hand and use
//! [`ParserSpec::parse_into`] directly.

use std::marker::PhantomData;

mod descriptor;
mod error;
mod parse;
mod spec;
mod usage;
pub mod value;

pub use argbind_macros::{ArgEnum, Args};
pub use descriptor::{
    ArgumentDecl, Bind, BoundValue, FieldDecl, FieldKind, OptionDecl, Record, ValueKind,
};
pub use error::{BindError, ParseError, SpecError};
pub use spec::{ArgumentEntry, FieldSlot, OptionEntry, ParserSpec};
pub use usage::{DEFAULT_LINE_WIDTH, UsageFormatter};
pub use value::ArgValue;

/// A parser for one record type. Build it once, parse any number of times.
#[derive(Debug, Clone)]
pub struct Parser<T> {
    spec: ParserSpec,
    formatter: UsageFormatter,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Parser<T> {
    /// Build the [`ParserSpec`] from `T`'s descriptor table.
    pub fn new() -> Result<Self, SpecError> {
        Ok(Self {
            spec: ParserSpec::build(T::descriptors())?,
            formatter: UsageFormatter::default(),
            _record: PhantomData,
        })
    }

    /// Replace the formatter used by [`Parser::usage`].
    pub fn with_formatter(mut self, formatter: UsageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Bind `tokens` (program name excluded) into a new `T`.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<T, ParseError> {
        let mut record = T::default();
        self.spec.parse_into(&mut record, tokens)?;
        Ok(record)
    }

    /// Parse the current process arguments, skipping the program name.
    pub fn parse_env(&self) -> Result<T, ParseError> {
        let tokens: Vec<String> = std::env::args().skip(1).collect();
        self.parse(&tokens)
    }

    pub fn usage(&self, app_name: &str) -> String {
        self.formatter.format(&self.spec, app_name)
    }

    pub fn spec(&self) -> &ParserSpec {
        &self.spec
    }
}
