use marked_yaml::Node;

/// `path` is the sequence of parent keys leading to the node on the target
/// line; `current_key` is the key defined on that line, or empty if the line
/// does not begin a mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct YamlPathResult {
    pub path: Vec<String>,
    pub current_key: String,
}

/// Resolve `(path, current_key)` at `line`, a 0-based index into `yaml`.
/// Never panics: malformed or incomplete YAML falls back to an indentation
/// heuristic over the raw text.
pub fn resolve(yaml: &str, line: usize) -> YamlPathResult {
    resolve_primary(yaml, line).unwrap_or_else(|| resolve_fallback(yaml, line))
}

// ────────────────────────────────────────────────────────────
// Primary path: walk a source-span-preserving YAML AST.
// ────────────────────────────────────────────────────────────

fn resolve_primary(yaml: &str, line: usize) -> Option<YamlPathResult> {
    let node = marked_yaml::parse_yaml(0, yaml).ok()?;
    let map = node.as_mapping()?;

    let (path, current_key) = walk_mapping(map, line, &[]).unwrap_or_default();
    Some(YamlPathResult { path, current_key })
}

fn walk_mapping(
    map: &marked_yaml::types::MarkedMappingNode,
    line: usize,
    parent_path: &[String],
) -> Option<(Vec<String>, String)> {
    for (key, value) in map.iter() {
        let key_line = node_line(key.span())?;

        if key_line == line {
            return Some((parent_path.to_vec(), key.as_str().to_owned()));
        }

        let Some(value_end) = max_line(value) else {
            continue;
        };

        if key_line < line && line <= value_end {
            let mut child_path = parent_path.to_vec();
            child_path.push(key.as_str().to_owned());

            return Some(match value {
                Node::Mapping(child_map) => walk_mapping(child_map, line, &child_path)
                    .unwrap_or((child_path, String::new())),
                Node::Sequence(seq) => seq
                    .iter()
                    .filter_map(|item| item.as_mapping())
                    .find_map(|item_map| walk_mapping(item_map, line, &child_path))
                    .unwrap_or((child_path, String::new())),
                _ => (child_path, String::new()),
            });
        }
    }

    None
}

/// Highest source line touched by `node` or any of its descendants.
fn max_line(node: &Node) -> Option<usize> {
    match node {
        Node::Scalar(s) => node_line(s.span()),
        Node::Mapping(m) => m
            .iter()
            .flat_map(|(k, v)| [node_line(k.span()), max_line(v)])
            .flatten()
            .max(),
        Node::Sequence(seq) => seq.iter().filter_map(max_line).max(),
    }
}

/// Marker lines from `marked_yaml` are 1-based; everything in this server
/// speaks 0-based LSP lines.
fn node_line(span: &marked_yaml::Span) -> Option<usize> {
    span.start()
        .or_else(|| span.end())
        .map(|marker| marker.line().saturating_sub(1))
}

// ────────────────────────────────────────────────────────────
// Fallback path: indentation heuristic over raw text.
// ────────────────────────────────────────────────────────────

fn resolve_fallback(yaml: &str, line: usize) -> YamlPathResult {
    let lines: Vec<&str> = yaml.split('\n').collect();
    if line >= lines.len() {
        return YamlPathResult::default();
    }

    let target = lines[line];
    let current_key = extract_key(target).unwrap_or_default();

    let mut tracked_indent = indentation(target);
    let mut path = Vec::new();

    let mut j = line;
    while j > 0 {
        j -= 1;
        let candidate = lines[j];
        if candidate.trim().is_empty() {
            continue;
        }
        let indent = indentation(candidate);
        if indent < tracked_indent {
            if let Some(key) = extract_key(candidate) {
                path.insert(0, key);
            }
            tracked_indent = indent;
        }
    }

    YamlPathResult { path, current_key }
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

fn extract_key(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let colon = trimmed.find(':')?;
    let key = trimmed[..colon].trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "on:\n  issues:\n    types: [opened]\nengine: copilot";

    #[test]
    fn canonical_document_resolves_every_line() {
        let cases = [
            (0, Vec::<&str>::new(), "on"),
            (1, vec!["on"], "issues"),
            (2, vec!["on", "issues"], "types"),
            (3, Vec::<&str>::new(), "engine"),
        ];
        for (line, path, key) in cases {
            let result = resolve(CANONICAL, line);
            assert_eq!(
                result.path,
                path.into_iter().map(str::to_owned).collect::<Vec<_>>(),
                "line {line} path"
            );
            assert_eq!(result.current_key, key, "line {line} key");
        }
    }

    #[test]
    fn totality_over_malformed_yaml_never_panics() {
        let broken = "on:\n  issues:\n  - not: [valid\nengine: : :";
        for line in 0..broken.split('\n').count() {
            let _ = resolve(broken, line);
        }
    }

    #[test]
    fn totality_for_every_line_of_the_canonical_document() {
        for line in 0..CANONICAL.split('\n').count() {
            let _ = resolve(CANONICAL, line);
        }
    }

    #[test]
    fn fallback_handles_mid_edit_incomplete_yaml() {
        // Missing the value after `engine:` and an unterminated flow sequence.
        let incomplete = "on:\n  issues:\n    types: [open";
        let result = resolve(incomplete, 2);
        assert_eq!(result.current_key, "types");
        assert_eq!(result.path, vec!["on".to_owned(), "issues".to_owned()]);
    }

    #[test]
    fn fallback_tracks_indentation_across_blank_lines() {
        let text = "on:\n\n  issues:\n\n    types: foo";
        let result = resolve_fallback(text, 4);
        assert_eq!(result.current_key, "types");
        assert_eq!(result.path, vec!["on".to_owned(), "issues".to_owned()]);
    }

    #[test]
    fn out_of_range_line_does_not_panic() {
        let result = resolve(CANONICAL, 999);
        assert_eq!(result, YamlPathResult::default());
    }
}
