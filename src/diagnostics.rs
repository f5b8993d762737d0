use serde_json::Value;

use crate::document::DocumentSnapshot;
use crate::protocol::{Diagnostic, DiagnosticSeverity, Range};
use crate::schema::SchemaProvider;
use crate::validator;

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "on",
    "engine",
    "tools",
    "safe-outputs",
    "safe-inputs",
    "permissions",
    "imports",
    "network",
    "sandbox",
    "name",
    "description",
];

const MAX_MESSAGE_LEN: usize = 500;

/// Four-step pipeline: frontmatter presence, extra fences, YAML syntax, schema
/// validation. Each step short-circuits the ones after it.
pub fn validate_document(snapshot: &DocumentSnapshot, schema: &SchemaProvider) -> Vec<Diagnostic> {
    if !starts_with_fence(snapshot) {
        return vec![Diagnostic::new(
            Range::full_line(0),
            DiagnosticSeverity::Warning,
            "Workflow file is missing frontmatter (--- delimiters). Add frontmatter with at least an 'on' trigger.",
        )];
    }

    let mut diagnostics = extra_fence_diagnostics(snapshot);

    match serde_yaml::from_str::<serde_yaml::Value>(&snapshot.frontmatter_yaml) {
        Err(err) => {
            diagnostics.push(yaml_syntax_diagnostic(snapshot, &err));
        }
        Ok(parsed) => {
            if let Some(diagnostic) = schema_diagnostic(snapshot, schema, &parsed) {
                diagnostics.push(diagnostic);
            }
        }
    }

    diagnostics
}

fn starts_with_fence(snapshot: &DocumentSnapshot) -> bool {
    snapshot
        .lines
        .first()
        .map(|line| line.trim() == "---")
        .unwrap_or(false)
}

fn extra_fence_diagnostics(snapshot: &DocumentSnapshot) -> Vec<Diagnostic> {
    snapshot
        .lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim() == "---")
        .skip(2)
        .map(|(i, _)| {
            Diagnostic::new(
                Range::full_line(i as u32),
                DiagnosticSeverity::Warning,
                "Multiple frontmatter delimiters detected. Only the first frontmatter block is used.",
            )
        })
        .collect()
}

fn yaml_syntax_diagnostic(snapshot: &DocumentSnapshot, err: &serde_yaml::Error) -> Diagnostic {
    let message = err.to_string();
    let line = extract_parser_line(&message)
        .map(|parsed_line| snapshot.frontmatter_start_line as u32 + parsed_line as u32)
        .unwrap_or(snapshot.frontmatter_start_line as u32 + 1);

    Diagnostic::new(
        Range::full_line(line),
        DiagnosticSeverity::Error,
        format!("YAML syntax error: {message}"),
    )
}

/// Pulls the first `line N` style number out of a parser message, without
/// pulling in a regex dependency for one pattern.
fn extract_parser_line(message: &str) -> Option<usize> {
    let idx = message.find("line ")?;
    let rest = &message[idx + "line ".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

fn schema_diagnostic(
    snapshot: &DocumentSnapshot,
    schema: &SchemaProvider,
    parsed: &serde_yaml::Value,
) -> Option<Diagnostic> {
    let instance: Value = serde_json::to_value(parsed).ok()?;

    match validator::validate(schema.raw(), &instance) {
        Ok(None) => None,
        Ok(Some(message)) => Some(Diagnostic::new(
            locate_schema_error(snapshot, &message),
            DiagnosticSeverity::Error,
            clean_schema_message(&message),
        )),
        Err(_) => None,
    }
}

fn locate_schema_error(snapshot: &DocumentSnapshot, message: &str) -> Range {
    for key in KNOWN_TOP_LEVEL_KEYS {
        if message.contains(key) {
            if let Some(line) = first_frontmatter_line_starting_with(snapshot, key) {
                return Range::full_line(line as u32);
            }
        }
    }
    Range::full_line(snapshot.frontmatter_start_line as u32 + 1)
}

fn first_frontmatter_line_starting_with(snapshot: &DocumentSnapshot, key: &str) -> Option<usize> {
    let prefix = format!("{key}:");
    let start = snapshot.frontmatter_start_line + 1;
    let end = snapshot.frontmatter_end_line;
    (start..end).find(|&i| {
        snapshot
            .lines
            .get(i)
            .map(|l| l.trim_start().starts_with(&prefix))
            .unwrap_or(false)
    })
}

/// Strip schema-URL noise, prefer the substring that names the actual
/// violation, and cap the length so one bad document can't flood the client.
fn clean_schema_message(message: &str) -> String {
    let joined = message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("http"))
        .collect::<Vec<_>>()
        .join("; ");

    let preferred = joined.split("; ").find(|part| {
        let lower = part.to_lowercase();
        lower.contains("missing property") || lower.contains("additional properties")
    });

    let mut cleaned = preferred.map(str::to_owned).unwrap_or(joined);
    if cleaned.len() > MAX_MESSAGE_LEN {
        cleaned.truncate(MAX_MESSAGE_LEN);
    }
    cleaned
}
