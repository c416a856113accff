//! ARIA snapshot matching
//!
//! Snapshots and templates share Playwright's YAML shape:
//!
//! ```yaml
//! - img
//! - link "Home"
//! - paragraph: Paga in tutta sicurezza
//! - list:
//!   - listitem: First
//! ```
//!
//! A template matches when its nodes appear, in order, among the snapshot's
//! nodes at the same level (other nodes may sit in between), recursively.

use regex::Regex;
use serde_yaml::Value;

use crate::error::{E2eError, E2eResult};
use crate::locator::normalize_whitespace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AriaNode {
    pub role: String,
    pub name: Option<String>,
    pub text: Option<String>,
    pub children: Vec<AriaNode>,
}

impl AriaNode {
    fn leaf(header: &str) -> Self {
        let (role, name) = parse_header(header);
        Self {
            role,
            name,
            text: None,
            children: Vec::new(),
        }
    }
}

/// Parse a snapshot or template into its top-level nodes
pub fn parse(yaml: &str) -> E2eResult<Vec<AriaNode>> {
    let value: Value = serde_yaml::from_str(yaml)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.iter().map(parse_item).collect(),
        other => Err(E2eError::AriaTemplate(format!(
            "expected a YAML list, got {:?}",
            other
        ))),
    }
}

fn parse_item(item: &Value) -> E2eResult<AriaNode> {
    match item {
        Value::String(header) => Ok(AriaNode::leaf(header)),
        Value::Mapping(map) => {
            let (key, value) = map
                .iter()
                .next()
                .ok_or_else(|| E2eError::AriaTemplate("empty mapping".to_string()))?;
            let header = scalar(key)
                .ok_or_else(|| E2eError::AriaTemplate(format!("invalid node key {:?}", key)))?;
            let mut node = AriaNode::leaf(&header);
            match value {
                Value::Sequence(children) => {
                    node.children = children.iter().map(parse_item).collect::<E2eResult<_>>()?;
                }
                Value::Null => {}
                other => node.text = scalar(other),
            }
            Ok(node)
        }
        other => Err(E2eError::AriaTemplate(format!("invalid node {:?}", other))),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split `link "Home" [level=1]` into role and name; attributes are ignored
fn parse_header(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    let (role, rest) = match header.find(char::is_whitespace) {
        Some(idx) => (&header[..idx], header[idx..].trim()),
        None => (header, ""),
    };

    let name = if let Some(stripped) = rest.strip_prefix('"') {
        stripped.find('"').map(|end| stripped[..end].to_string())
    } else if rest.starts_with('/') {
        rest[1..].find('/').map(|end| rest[..end + 2].to_string())
    } else {
        None
    };

    (role.to_string(), name)
}

/// Compare expected text (literal or `/regex/`) with actual text
fn text_matches(expected: &str, actual: &str) -> bool {
    let expected = expected.trim();
    if expected.len() >= 2 && expected.starts_with('/') && expected.ends_with('/') {
        return Regex::new(&expected[1..expected.len() - 1])
            .map(|re| re.is_match(actual))
            .unwrap_or(false);
    }
    normalize_whitespace(expected) == normalize_whitespace(actual)
}

fn node_matches(template: &AriaNode, actual: &AriaNode) -> bool {
    if template.role != actual.role {
        return false;
    }
    if let Some(name) = &template.name {
        match &actual.name {
            Some(actual_name) if text_matches(name, actual_name) => {}
            _ => return false,
        }
    }
    if let Some(text) = &template.text {
        match &actual.text {
            Some(actual_text) if text_matches(text, actual_text) => {}
            _ => return false,
        }
    }
    sequence_matches(&template.children, &actual.children)
}

/// Template nodes must appear in order among the actual nodes
pub fn sequence_matches(template: &[AriaNode], actual: &[AriaNode]) -> bool {
    let mut remaining = actual.iter();
    template
        .iter()
        .all(|t| remaining.by_ref().any(|a| node_matches(t, a)))
}

/// Check a snapshot against a template
pub fn matches_template(snapshot: &str, template: &str) -> E2eResult<bool> {
    let template = parse(template)?;
    let actual = parse(snapshot)?;
    Ok(sequence_matches(&template, &actual))
}
