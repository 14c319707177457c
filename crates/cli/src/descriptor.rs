use anyhow::{Context, Result, bail};
use argbind::{ArgumentDecl, FieldDecl, FieldKind, OptionDecl, ValueKind};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A JSON document describing the fields of a command line.
///
/// ```json
/// {
///   "fields": [
///     { "name": "input", "kind": "scalar", "argument": { "index": 0 } },
///     { "name": "verbose", "kind": "flag", "option": { "description": "Print more" } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Descriptor {
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindDoc {
    Flag,
    Scalar,
    Collection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDoc {
    pub name: String,
    pub kind: KindDoc,

    /// Closed set of accepted values, matched case-insensitively.
    #[serde(default, rename = "enum")]
    pub constants: Option<Vec<String>>,

    #[serde(default)]
    pub option: Option<OptionDoc>,

    #[serde(default)]
    pub argument: Option<ArgumentDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionDoc {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub short: Option<char>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub autonomous: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArgumentDoc {
    pub index: i64,
    #[serde(default)]
    pub optional: bool,
}

impl Descriptor {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read descriptor: {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("invalid descriptor: {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let descriptor: Self =
            serde_json::from_str(contents).context("failed to parse descriptor JSON")?;
        for field in &descriptor.fields {
            field.validate()?;
        }
        Ok(descriptor)
    }

    /// Field declarations in document order.
    pub fn decls(&self) -> Vec<FieldDecl> {
        self.fields.iter().map(FieldDoc::decl).collect()
    }
}

impl FieldDoc {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("field name must not be empty");
        }
        if self.kind == KindDoc::Flag && self.constants.is_some() {
            bail!("flag '{}' cannot declare enum constants", self.name);
        }
        if self.constants.as_ref().is_some_and(Vec::is_empty) {
            bail!("field '{}' declares an empty enum", self.name);
        }
        Ok(())
    }

    fn decl(&self) -> FieldDecl {
        let value_kind = match &self.constants {
            Some(constants) => ValueKind::enumeration(constants),
            None => ValueKind::Text,
        };
        let kind = match self.kind {
            KindDoc::Flag => FieldKind::Flag,
            KindDoc::Scalar => FieldKind::Scalar(value_kind),
            KindDoc::Collection => FieldKind::Collection(value_kind),
        };

        let mut decl = FieldDecl::new(self.name.clone(), kind);
        if let Some(option) = &self.option {
            let mut option_decl = OptionDecl::new(option.description.clone());
            if let Some(alias) = &option.alias {
                option_decl = option_decl.alias(alias.clone());
            }
            if let Some(short) = option.short {
                option_decl = option_decl.short(short);
            }
            if option.autonomous {
                option_decl = option_decl.autonomous();
            }
            decl = decl.option(option_decl);
        }
        if let Some(argument) = &self.argument {
            let mut argument_decl = ArgumentDecl::new(argument.index);
            if argument.optional {
                argument_decl = argument_decl.optional();
            }
            decl = decl.argument(argument_decl);
        }
        decl
    }
}
