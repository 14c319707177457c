//! Field declarations: the input [`ParserSpec::build`](crate::ParserSpec::build) consumes.
//!
//! A declaration is produced either by `#[derive(Args)]` or by hand with the
//! chaining constructors below:
//!
//! ```
//! use argbind::{ArgumentDecl, FieldDecl, FieldKind, OptionDecl, ValueKind};
//!
//! let fields = vec![
//!     FieldDecl::new("input", FieldKind::Scalar(ValueKind::Text))
//!         .argument(ArgumentDecl::new(0)),
//!     FieldDecl::new("verbose", FieldKind::Flag)
//!         .option(OptionDecl::new("Print more output")),
//! ];
//! let spec = argbind::ParserSpec::build(fields).unwrap();
//! assert!(spec.option("-v").is_some());
//! ```

use crate::error::BindError;
use crate::spec::FieldSlot;

/// What a single value of a field looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text, converted by the field's own type.
    Text,
    /// One of a closed set of constants, stored in canonical upper case and
    /// in declaration order.
    Enum(Vec<String>),
}

impl ValueKind {
    pub fn enumeration<I, S>(constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Enum(
            constants
                .into_iter()
                .map(|c| c.as_ref().to_uppercase())
                .collect(),
        )
    }

    pub fn constants(&self) -> Option<&[String]> {
        match self {
            Self::Text => None,
            Self::Enum(constants) => Some(constants.as_slice()),
        }
    }
}

/// How a field consumes tokens. Derived once from the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Boolean presence; never takes a value.
    Flag,
    Scalar(ValueKind),
    /// Zero or more values, appended one at a time.
    Collection(ValueKind),
}

impl FieldKind {
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Flag)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Kind of each value, `None` for flags.
    pub fn value_kind(&self) -> Option<&ValueKind> {
        match self {
            Self::Flag => None,
            Self::Scalar(kind) | Self::Collection(kind) => Some(kind),
        }
    }

    pub fn enum_constants(&self) -> Option<&[String]> {
        self.value_kind().and_then(ValueKind::constants)
    }
}

/// Exposes a field as `-x` / `--alias`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionDecl {
    pub alias: Option<String>,
    pub short: Option<char>,
    pub description: String,
    pub autonomous: bool,
}

impl OptionDecl {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Long name to use instead of the field name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Fixed short name. Skips the lower/upper case derivation.
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Presence of this option alone makes the parse succeed (`--help`, `--version`).
    pub fn autonomous(mut self) -> Self {
        self.autonomous = true;
        self
    }
}

/// Exposes a field as a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentDecl {
    /// Sort key among positionals. Need not be contiguous.
    pub index: i64,
    pub optional: bool,
}

impl ArgumentDecl {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// One bindable field of a record, as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    pub option: Option<OptionDecl>,
    pub argument: Option<ArgumentDecl>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            option: None,
            argument: None,
        }
    }

    pub fn option(mut self, option: OptionDecl) -> Self {
        self.option = Some(option);
        self
    }

    pub fn argument(mut self, argument: ArgumentDecl) -> Self {
        self.argument = Some(argument);
        self
    }
}

/// A value handed to [`Bind::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundValue<'a> {
    /// A flag option was present.
    Flag,
    /// A raw token.
    Text(&'a str),
    /// A token resolved against an enum's constants.
    Constant { index: usize, name: &'a str },
}

impl<'a> BoundValue<'a> {
    /// The textual form of the value, or a [`BindError`] for bare flags.
    pub fn text(&self, slot: &FieldSlot, expected: &str) -> Result<&'a str, BindError> {
        match *self {
            Self::Text(text) => Ok(text),
            Self::Constant { name, .. } => Ok(name),
            Self::Flag => Err(BindError::new(slot, "true", expected)),
        }
    }
}

/// Storage for bound values. Implemented by `#[derive(Args)]`, or by hand for
/// records whose shape is only known at runtime.
pub trait Bind {
    /// Store `value` into the field identified by `slot`.
    ///
    /// Called once per value; collection fields append.
    fn bind(&mut self, slot: &FieldSlot, value: BoundValue<'_>) -> Result<(), BindError>;
}

/// A record type that knows its own descriptor table.
pub trait Record: Bind + Default {
    /// Declarations in field order. Slot ids follow this order.
    fn descriptors() -> Vec<FieldDecl>;
}
