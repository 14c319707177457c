//! The immutable parser spec built from a descriptor table.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::descriptor::{FieldDecl, FieldKind, OptionDecl};
use crate::error::SpecError;

/// One bindable field of the target record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    id: usize,
    name: String,
    kind: FieldKind,
}

impl FieldSlot {
    /// Position of the field in the descriptor table.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// A field exposed as an option. Registered under both its short and long form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    slot: usize,
    alias: String,
    short_name: String,
    description: String,
    autonomous: bool,
}

impl OptionEntry {
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Long name without the leading `--`.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Short name including the leading `-`.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_autonomous(&self) -> bool {
        self.autonomous
    }
}

/// A field exposed as a positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentEntry {
    slot: usize,
    index: i64,
    optional: bool,
}

impl ArgumentEntry {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Everything the parser and the usage formatter need, built once.
///
/// Read-only after [`ParserSpec::build`], so one spec can serve any number of
/// concurrent parses.
#[derive(Debug, Clone, Default)]
pub struct ParserSpec {
    slots: Vec<FieldSlot>,
    options: Vec<OptionEntry>,
    names: IndexMap<String, usize>,
    positionals: Vec<ArgumentEntry>,
    non_optional_count: usize,
}

impl ParserSpec {
    /// Build a spec from field declarations, in declaration order.
    ///
    /// Short names are `-` + the lower-case first letter of the alias; if
    /// taken, the upper-case letter is tried, and if that is taken too the
    /// build fails.
    pub fn build<I>(fields: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = FieldDecl>,
    {
        let mut spec = Self::default();
        let mut indices: HashMap<i64, usize> = HashMap::new();

        for (id, field) in fields.into_iter().enumerate() {
            if field.name.is_empty() {
                return Err(SpecError::EmptyName { position: id });
            }

            if let Some(option) = &field.option {
                spec.register_option(id, &field.name, option)?;
            }

            if let Some(argument) = field.argument {
                if let Some(&first) = indices.get(&argument.index) {
                    return Err(SpecError::DuplicateIndex {
                        index: argument.index,
                        first: spec.slots[first].name.clone(),
                        second: field.name,
                    });
                }
                indices.insert(argument.index, id);
                spec.positionals.push(ArgumentEntry {
                    slot: id,
                    index: argument.index,
                    optional: argument.optional,
                });
                if !argument.optional {
                    spec.non_optional_count += 1;
                }
            }

            spec.slots.push(FieldSlot {
                id,
                name: field.name,
                kind: field.kind,
            });
        }

        // Stable, so equal keys cannot reorder (they are rejected above anyway).
        spec.positionals.sort_by_key(|a| a.index);

        tracing::debug!(
            options = spec.options.len(),
            positionals = spec.positionals.len(),
            required = spec.non_optional_count,
            "built parser spec"
        );
        Ok(spec)
    }

    fn register_option(
        &mut self,
        id: usize,
        field_name: &str,
        option: &OptionDecl,
    ) -> Result<(), SpecError> {
        let alias = option
            .alias
            .clone()
            .unwrap_or_else(|| field_name.to_string());
        let Some(first) = alias.chars().next() else {
            return Err(SpecError::EmptyName { position: id });
        };

        let long_name = format!("--{alias}");
        if let Some(&taken) = self.names.get(&long_name) {
            return Err(SpecError::DuplicateAlias {
                alias,
                first: self.slots[self.options[taken].slot].name.clone(),
                second: field_name.to_string(),
            });
        }

        let short_name = match option.short {
            Some(short) => {
                let short_name = format!("-{short}");
                if let Some(&taken) = self.names.get(&short_name) {
                    return Err(SpecError::ShortNameTaken {
                        alias,
                        short: short_name,
                        taken_by: self.options[taken].alias.clone(),
                    });
                }
                short_name
            }
            None => self.derive_short_name(&alias, first)?,
        };

        let entry = self.options.len();
        self.names.insert(short_name.clone(), entry);
        self.names.insert(long_name, entry);
        tracing::trace!(%short_name, %alias, "registered option");

        self.options.push(OptionEntry {
            slot: id,
            alias,
            short_name,
            description: option.description.clone(),
            autonomous: option.autonomous,
        });
        Ok(())
    }

    /// Short names are always one character; case mappings that expand
    /// (`İ` to `i\u{307}`, `ß` to `SS`) keep only their first char.
    fn derive_short_name(&self, alias: &str, first: char) -> Result<String, SpecError> {
        let lower = format!("-{}", first.to_lowercase().next().unwrap_or(first));
        if !self.names.contains_key(&lower) {
            return Ok(lower);
        }

        let upper = format!("-{}", first.to_uppercase().next().unwrap_or(first));
        if !self.names.contains_key(&upper) {
            tracing::debug!(%alias, taken = %lower, using = %upper, "short name collision");
            return Ok(upper);
        }

        Err(SpecError::ShortNameExhausted {
            alias: alias.to_string(),
            lower,
            upper,
        })
    }

    /// Look up an option by its exact short (`-v`) or long (`--verbose`) form.
    pub fn option(&self, name: &str) -> Option<&OptionEntry> {
        self.names.get(name).map(|&entry| &self.options[entry])
    }

    pub fn is_option_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Distinct options, in declaration order.
    pub fn options(&self) -> &[OptionEntry] {
        &self.options
    }

    /// Every registered name, short form first for each option.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Positional arguments sorted by index.
    pub fn positionals(&self) -> &[ArgumentEntry] {
        &self.positionals
    }

    pub fn non_optional_count(&self) -> usize {
        self.non_optional_count
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    pub fn slot(&self, id: usize) -> &FieldSlot {
        &self.slots[id]
    }
}
