//! Structured-output boundary: declared section schemas and the parser
//! that turns a raw markdown reply into a named-field payload.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

// ── Payload values ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text — the section body verbatim.
    Text,
    /// Bulleted or numbered list — one string per item.
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Items(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Items(_) => None,
        }
    }

    pub fn as_items(&self) -> Option<&[String]> {
        match self {
            FieldValue::Items(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }
}

/// Named sections of one action's output, in schema declaration order.
pub type StructuredPayload = Vec<(String, FieldValue)>;

/// Look up one section of a payload by name.
pub fn payload_get<'a>(payload: &'a StructuredPayload, name: &str) -> Option<&'a FieldValue> {
    payload
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

// ── Schema ──

/// The sections an action promises to emit, with their expected shapes.
/// Validation guarantees every declared field is present or fails with the
/// full list of missing names.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    fields: Vec<(&'static str, FieldKind)>,
}

impl OutputSchema {
    pub fn new(fields: &[(&'static str, FieldKind)]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Parse a raw markdown reply into a payload. Sections are `## Name`
    /// blocks; list fields take `-`, `*` or `1.` items. Any declared
    /// section that is absent or empty fails validation.
    pub fn parse(&self, raw: &str) -> Result<StructuredPayload, SchemaError> {
        let mut payload = Vec::with_capacity(self.fields.len());
        let mut missing = Vec::new();

        for (name, kind) in &self.fields {
            match extract_section(raw, name) {
                Some(body) if !body.trim().is_empty() => {
                    let value = match kind {
                        FieldKind::Text => FieldValue::Text(body.trim().to_string()),
                        FieldKind::List => {
                            let items = parse_items(&body);
                            if items.is_empty() {
                                missing.push(name.to_string());
                                continue;
                            }
                            FieldValue::Items(items)
                        }
                    };
                    payload.push((name.to_string(), value));
                }
                _ => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(payload)
        } else {
            Err(SchemaError::MissingFields { missing })
        }
    }
}

/// Body of the `## name` section: everything up to the next `##` heading.
fn extract_section(raw: &str, name: &str) -> Option<String> {
    let mut body: Option<Vec<&str>> = None;
    for line in raw.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("##") {
            let heading = heading.trim_start_matches('#').trim();
            if body.is_some() {
                break;
            }
            if heading.eq_ignore_ascii_case(name) {
                body = Some(Vec::new());
            }
            continue;
        }
        if let Some(ref mut lines) = body {
            lines.push(line);
        }
    }
    body.map(|lines| lines.join("\n"))
}

fn parse_items(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let item = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .or_else(|| {
                    trimmed
                        .split_once(". ")
                        .filter(|(n, _)| n.chars().all(|c| c.is_ascii_digit()) && !n.is_empty())
                        .map(|(_, rest)| rest)
                });
            item.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        })
        .collect()
}

/// Render a payload back to markdown — used when checkpointing documents.
pub fn payload_to_markdown(payload: &StructuredPayload) -> String {
    let mut out = String::new();
    for (name, value) in payload {
        out.push_str("## ");
        out.push_str(name);
        out.push_str("\n\n");
        match value {
            FieldValue::Text(text) => {
                out.push_str(text);
                out.push('\n');
            }
            FieldValue::Items(items) => {
                for item in items {
                    out.push_str("- ");
                    out.push_str(item);
                    out.push('\n');
                }
            }
        }
        out.push('\n');
    }
    out
}
