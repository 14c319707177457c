//! Usage text rendering.

use crate::spec::ParserSpec;

/// Default total line width for wrapped option descriptions.
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// Width of `"  -x, --"` plus the single space after the longest alias.
const PREFIX_WIDTH: usize = 9;

/// Renders the usage text for a [`ParserSpec`].
///
/// ```text
/// Usage: greet [options] <name> [tags] [...]
/// Options
///   -v, --verbose Print more output
/// ```
#[derive(Debug, Clone)]
pub struct UsageFormatter {
    line_width: usize,
    invocation: Option<String>,
}

impl Default for UsageFormatter {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
            invocation: None,
        }
    }
}

impl UsageFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total width option descriptions are wrapped to.
    pub fn line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    /// Text printed before the application name, e.g. `java -jar` or `cargo run --`.
    pub fn invocation(mut self, prefix: impl Into<String>) -> Self {
        self.invocation = Some(prefix.into());
        self
    }

    pub fn format(&self, spec: &ParserSpec, app_name: &str) -> String {
        let mut out = String::from("Usage: ");
        if let Some(prefix) = self.invocation.as_deref().map(str::trim) {
            if !prefix.is_empty() {
                out.push_str(prefix);
                out.push(' ');
            }
        }
        out.push_str(app_name);

        if !spec.options().is_empty() {
            out.push_str(" [options]");
        }

        for argument in spec.positionals() {
            let slot = spec.slot(argument.slot());
            if argument.is_optional() {
                out.push_str(&format!(" [{}]", slot.name()));
            } else {
                out.push_str(&format!(" <{}>", slot.name()));
            }
            if slot.kind().is_collection() {
                out.push_str(" [...]");
            }
        }
        out.push('\n');

        for argument in spec.positionals() {
            let slot = spec.slot(argument.slot());
            let Some(constants) = slot.kind().enum_constants() else {
                continue;
            };
            out.push_str(&capitalize(&pluralize(slot.name())));
            out.push('\n');
            for constant in constants {
                out.push_str("  ");
                out.push_str(&constant.to_lowercase());
                out.push('\n');
            }
        }

        if spec.options().is_empty() {
            return out;
        }

        out.push_str("Options\n");
        let width = spec
            .options()
            .iter()
            .map(|o| o.alias().chars().count())
            .max()
            .unwrap_or(0);
        let indent = " ".repeat(PREFIX_WIDTH + width);
        let budget = self.line_width.saturating_sub(PREFIX_WIDTH + width);

        for option in spec.options() {
            let alias = option.alias();
            let pad = width - alias.chars().count() + 1;
            out.push_str(&format!(
                "  {}, --{}{}",
                option.short_name(),
                alias,
                " ".repeat(pad)
            ));
            for (n, line) in wrap(option.description(), budget).into_iter().enumerate() {
                if n > 0 {
                    out.push_str(&indent);
                }
                out.push_str(line);
                out.push('\n');
            }
        }

        out
    }
}

/// Cut `text` into lines of at most `budget` characters, breaking at the last
/// space that fits and dropping it. A word longer than the budget is cut
/// hard at the budget.
fn wrap(text: &str, budget: usize) -> Vec<&str> {
    let budget = budget.max(1);
    let mut lines = Vec::new();
    let mut rest = text;

    while let Some((limit, at_limit)) = rest.char_indices().nth(budget) {
        // The character at `budget` may itself be the breaking space.
        match rest[..limit + at_limit.len_utf8()].rfind(' ') {
            Some(cut) => {
                lines.push(&rest[..cut]);
                rest = &rest[cut + 1..];
            }
            None => {
                lines.push(&rest[..limit]);
                rest = &rest[limit..];
            }
        }
    }
    lines.push(rest);
    lines
}

/// `y` becomes `ies`, anything else gets an `s`. Known to be wrong for
/// words like "box" or "day"; kept simple so existing output stays stable.
fn pluralize(name: &str) -> String {
    match name.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{name}s"),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
