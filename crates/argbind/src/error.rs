//! Error types for spec construction and parsing.

use thiserror::Error;

use crate::spec::FieldSlot;

/// A descriptor table that cannot be turned into a [`ParserSpec`](crate::ParserSpec).
///
/// These are programmer errors in the declaration, not user input errors, so
/// they surface before any token is looked at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Both case variants of the derived short name are already registered.
    #[error(
        "options {lower} and {upper} are both taken, choose a different alias for option '{alias}'"
    )]
    ShortNameExhausted {
        alias: String,
        lower: String,
        upper: String,
    },

    /// An explicit short-name override collides with an earlier option.
    #[error("short name {short} of option '{alias}' is already used by option '{taken_by}'")]
    ShortNameTaken {
        alias: String,
        short: String,
        taken_by: String,
    },

    /// Two options declare the same long form.
    #[error("option --{alias} is declared by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    /// Two positional arguments declare the same index.
    #[error("positional index {index} is declared by both '{first}' and '{second}'")]
    DuplicateIndex {
        index: i64,
        first: String,
        second: String,
    },

    /// A field or option alias is empty, so no name can be derived from it.
    #[error("field #{position} has an empty name or alias")]
    EmptyName { position: usize },
}

/// A matched value that does not fit the field it is bound to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot bind {value:?} to field '{field}': expected {expected}")]
pub struct BindError {
    pub field: String,
    pub value: String,
    pub expected: String,
}

impl BindError {
    pub fn new(slot: &FieldSlot, value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: slot.name().to_string(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// The record has no field for this slot (its `Bind` impl is out of sync
    /// with its descriptor table).
    pub fn unknown_field(slot: &FieldSlot) -> Self {
        Self::new(slot, "", format!("a field with slot id {}", slot.id()))
    }
}

/// Outcome of a failed [`ParserSpec::parse_into`](crate::ParserSpec::parse_into).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The tokens do not fit the declared options and positionals.
    ///
    /// Deliberately carries no detail: a missing option value, an unknown
    /// enum constant, a surplus token and a missing required argument all
    /// collapse into this one outcome. The concrete reason is logged at
    /// `debug` level.
    #[error("parsing failed")]
    Rejected,

    /// A value could not be stored into its field. Scanning stops at the
    /// offending token.
    #[error(transparent)]
    Binding(#[from] BindError),
}

impl ParseError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}
