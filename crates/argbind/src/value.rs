//! Conversion of bound values into field types.
//!
//! `#[derive(Args)]` routes every field through these helpers, so a field
//! type is usable as soon as it implements [`ArgValue`].

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::ffi::OsString;
use std::hash::Hash;
use std::path::PathBuf;

use crate::descriptor::{BoundValue, ValueKind};
use crate::error::BindError;
use crate::spec::FieldSlot;

/// A type a single token can be converted into.
pub trait ArgValue: Sized {
    /// Consulted once, when the [`ParserSpec`](crate::ParserSpec) is built.
    fn value_kind() -> ValueKind {
        ValueKind::Text
    }

    fn from_bound(slot: &FieldSlot, value: BoundValue<'_>) -> Result<Self, BindError>;
}

impl ArgValue for String {
    fn from_bound(slot: &FieldSlot, value: BoundValue<'_>) -> Result<Self, BindError> {
        value.text(slot, "text").map(str::to_string)
    }
}

impl ArgValue for PathBuf {
    fn from_bound(slot: &FieldSlot, value: BoundValue<'_>) -> Result<Self, BindError> {
        value.text(slot, "a path").map(PathBuf::from)
    }
}

impl ArgValue for OsString {
    fn from_bound(slot: &FieldSlot, value: BoundValue<'_>) -> Result<Self, BindError> {
        value.text(slot, "text").map(OsString::from)
    }
}

macro_rules! parsed_value {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl ArgValue for $ty {
                fn from_bound(slot: &FieldSlot, value: BoundValue<'_>) -> Result<Self, BindError> {
                    let text = value.text(slot, $expected)?;
                    text.parse().map_err(|_| BindError::new(slot, text, $expected))
                }
            }
        )*
    };
}

parsed_value! {
    bool => "true or false",
    char => "a single character",
    u8 => "an integer (u8)",
    u16 => "an integer (u16)",
    u32 => "an integer (u32)",
    u64 => "an integer (u64)",
    u128 => "an integer (u128)",
    usize => "an integer (usize)",
    i8 => "an integer (i8)",
    i16 => "an integer (i16)",
    i32 => "an integer (i32)",
    i64 => "an integer (i64)",
    i128 => "an integer (i128)",
    isize => "an integer (isize)",
    f32 => "a number",
    f64 => "a number",
}

/// Store a flag's presence.
pub fn flag(slot: &FieldSlot, value: BoundValue<'_>) -> Result<bool, BindError> {
    match value {
        BoundValue::Flag => Ok(true),
        BoundValue::Text(text) => Err(BindError::new(slot, text, "a flag")),
        BoundValue::Constant { name, .. } => Err(BindError::new(slot, name, "a flag")),
    }
}

/// Position of the constant a value names, matched case-insensitively.
///
/// Used by `#[derive(ArgEnum)]`; `constants` must be the same list the type
/// reports from [`ArgValue::value_kind`].
pub fn constant(
    slot: &FieldSlot,
    value: BoundValue<'_>,
    constants: &[&str],
) -> Result<usize, BindError> {
    let expected = || {
        let names: Vec<String> = constants.iter().map(|c| c.to_lowercase()).collect();
        format!("one of {}", names.join(", "))
    };

    let text = match value {
        BoundValue::Constant { index, name } => {
            if constants.get(index).is_some_and(|c| *c == name) {
                return Ok(index);
            }
            name
        }
        other => other.text(slot, &expected())?,
    };

    let wanted = text.to_uppercase();
    constants
        .iter()
        .position(|c| *c == wanted)
        .ok_or_else(|| BindError::new(slot, text, expected()))
}

/// A container that collection fields append to.
pub trait Collection<T> {
    fn add(&mut self, item: T);
}

impl<T> Collection<T> for Vec<T> {
    fn add(&mut self, item: T) {
        self.push(item);
    }
}

impl<T> Collection<T> for VecDeque<T> {
    fn add(&mut self, item: T) {
        self.push_back(item);
    }
}

impl<T: Ord> Collection<T> for BTreeSet<T> {
    fn add(&mut self, item: T) {
        self.insert(item);
    }
}

impl<T: Eq + Hash> Collection<T> for HashSet<T> {
    fn add(&mut self, item: T) {
        self.insert(item);
    }
}
