use crate::element::NodeAttributes;
use serde::{Deserialize, Serialize};

/// Represents ways to match a node of the accessibility tree
///
/// Text matching is a case-insensitive substring test. Absent fields are
/// treated as empty strings, so a selector never fails, it only misses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Text or description contains any of the keywords
    TextContains(Vec<String>),
    /// Class name equals one of the given names
    ClassIn(Vec<String>),
    /// Class name contains any of the fragments
    ClassContains(Vec<String>),
    /// View id equals one of the given ids
    ViewIdIn(Vec<String>),
    /// View id contains any of the fragments
    ViewIdContains(Vec<String>),
    Clickable(bool),
    Checkable(bool),
    Editable(bool),
    Focused(bool),
    /// All selectors must match
    And(Vec<Selector>),
    /// Any selector may match
    Or(Vec<Selector>),
    Not(Box<Selector>),
    /// Represents an invalid selector string, with a reason. Never matches.
    Invalid(String),
}

impl Selector {
    pub fn text_contains<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::TextContains(keywords.into_iter().map(Into::into).collect())
    }

    pub fn class_in<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::ClassIn(names.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, attrs: &NodeAttributes) -> bool {
        match self {
            Selector::TextContains(keywords) => {
                let text = lowercase(&attrs.text);
                let description = lowercase(&attrs.description);
                keywords.iter().any(|keyword| {
                    let keyword = keyword.to_lowercase();
                    text.contains(&keyword) || description.contains(&keyword)
                })
            }
            Selector::ClassIn(names) => {
                let class_name = attrs.class_name.as_deref().unwrap_or("");
                names.iter().any(|name| name == class_name)
            }
            Selector::ClassContains(fragments) => contains_any(&attrs.class_name, fragments),
            Selector::ViewIdIn(ids) => {
                let view_id = attrs.view_id.as_deref().unwrap_or("");
                ids.iter().any(|id| id == view_id)
            }
            Selector::ViewIdContains(fragments) => contains_any(&attrs.view_id, fragments),
            Selector::Clickable(expected) => attrs.clickable == *expected,
            Selector::Checkable(expected) => attrs.checkable == *expected,
            Selector::Editable(expected) => attrs.editable == *expected,
            Selector::Focused(expected) => attrs.focused == *expected,
            Selector::And(selectors) => selectors.iter().all(|s| s.matches(attrs)),
            Selector::Or(selectors) => selectors.iter().any(|s| s.matches(attrs)),
            Selector::Not(inner) => !inner.matches(attrs),
            Selector::Invalid(_) => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Selector::Invalid(_) => false,
            Selector::And(selectors) | Selector::Or(selectors) => {
                selectors.iter().all(Selector::is_valid)
            }
            Selector::Not(inner) => inner.is_valid(),
            _ => true,
        }
    }
}

fn lowercase(field: &Option<String>) -> String {
    field.as_deref().unwrap_or("").to_lowercase()
}

fn contains_any(field: &Option<String>, fragments: &[String]) -> bool {
    let value = lowercase(field);
    fragments
        .iter()
        .any(|fragment| value.contains(&fragment.to_lowercase()))
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        let s = s.trim();

        // Or binds looser than and
        let parts: Vec<&str> = s.split("||").map(str::trim).collect();
        if parts.len() > 1 {
            return Selector::Or(parts.into_iter().map(Selector::from).collect());
        }
        let parts: Vec<&str> = s.split("&&").map(str::trim).collect();
        if parts.len() > 1 {
            return Selector::And(parts.into_iter().map(Selector::from).collect());
        }

        if let Some(inner) = s.strip_prefix('!') {
            return Selector::Not(Box::new(Selector::from(inner)));
        }

        let (prefix, value) = match s.split_once(':') {
            Some((prefix, value)) => (prefix.trim().to_lowercase(), value.trim()),
            None => (s.to_lowercase(), ""),
        };
        // Comma separates alternatives inside one clause: `text:time zone,region`
        let values = || {
            value
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
        };

        match prefix.as_str() {
            "text" if !value.is_empty() => Selector::TextContains(values()),
            "class" | "classname" if !value.is_empty() => Selector::ClassIn(values()),
            "classcontains" if !value.is_empty() => Selector::ClassContains(values()),
            "id" if !value.is_empty() => Selector::ViewIdIn(values()),
            "idcontains" if !value.is_empty() => Selector::ViewIdContains(values()),
            "clickable" => Selector::Clickable(parse_flag(value)),
            "checkable" => Selector::Checkable(parse_flag(value)),
            "editable" => Selector::Editable(parse_flag(value)),
            "focused" => Selector::Focused(parse_flag(value)),
            _ => Selector::Invalid(format!(
                "Unknown selector format: \"{s}\". Use prefixes like 'text:', 'class:', 'classcontains:', 'id:', 'idcontains:' or flags like 'editable', 'focused:false'."
            )),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !value.eq_ignore_ascii_case("false")
}
