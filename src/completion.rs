use crate::document::DocumentSnapshot;
use crate::protocol::{CompletionItem, CompletionItemKind, InsertTextFormat, MarkupContent, Position};
use crate::schema::{PropertyInfo, SchemaProvider};
use crate::yaml_path;

/// Produces property, enum, and snippet completions for the cursor position.
pub fn handle_completion(
    snapshot: Option<&DocumentSnapshot>,
    position: Position,
    schema: &SchemaProvider,
) -> Vec<CompletionItem> {
    let Some(snapshot) = snapshot else {
        return Vec::new();
    };

    if !snapshot.has_frontmatter {
        return skeleton_snippets();
    }

    if !snapshot.position_in_frontmatter(position) {
        return Vec::new();
    }

    let Some(yaml_line) = snapshot.yaml_relative_line(position.line) else {
        return Vec::new();
    };
    let resolved = yaml_path::resolve(&snapshot.frontmatter_yaml, yaml_line);

    if resolved.path.is_empty() {
        let mut items = if resolved.current_key.is_empty() {
            property_completions(schema.top_level_properties())
        } else {
            let prefix = resolved.current_key.to_lowercase();
            property_completions(
                schema
                    .top_level_properties()
                    .into_iter()
                    .filter(|p| p.name.to_lowercase().starts_with(&prefix))
                    .collect(),
            )
        };
        items.extend(skeleton_snippets());
        return items;
    }

    if !resolved.current_key.is_empty() {
        let mut enum_path = resolved.path.clone();
        enum_path.push(resolved.current_key.clone());
        let values = schema.enum_values(&enum_path);
        if !values.is_empty() {
            return enum_completions(values);
        }
    }

    property_completions(schema.nested_properties(&resolved.path))
}

fn property_completions(properties: Vec<PropertyInfo>) -> Vec<CompletionItem> {
    properties
        .into_iter()
        .enumerate()
        .map(|(index, info)| {
            let detail = if info.required {
                format!("{} (required)", info.type_name)
            } else {
                info.type_name.clone()
            };

            let documentation = (!info.description.is_empty())
                .then(|| MarkupContent::markdown(info.description.clone()));

            let sort_text = if info.required {
                format!("0_{}", info.name)
            } else {
                format!("1_{index:04}")
            };

            CompletionItem {
                label: info.name.clone(),
                kind: CompletionItemKind::Property,
                detail: Some(detail),
                documentation,
                insert_text: format!("{}: ", info.name),
                insert_text_format: InsertTextFormat::PlainText,
                sort_text,
                deprecated: info.deprecated,
            }
        })
        .collect()
}

fn enum_completions(values: Vec<String>) -> Vec<CompletionItem> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| CompletionItem {
            label: value.clone(),
            kind: CompletionItemKind::EnumMember,
            detail: None,
            documentation: None,
            insert_text: value,
            insert_text_format: InsertTextFormat::PlainText,
            sort_text: format!("1_{index:04}"),
            deprecated: false,
        })
        .collect()
}

fn skeleton_snippets() -> Vec<CompletionItem> {
    vec![
        snippet(
            "minimal",
            "Minimal workflow",
            "---\non:\n  issues:\n    types: [opened]\nengine: ${1:copilot}\n---\n# ${2:Workflow title}\n\n$0",
        ),
        snippet(
            "slash-command",
            "Slash-command workflow",
            "---\non:\n  command:\n    name: ${1:my-command}\nengine: ${2:copilot}\n---\n# ${3:Workflow title}\n\n$0",
        ),
        snippet(
            "with-imports",
            "Workflow with imports",
            "---\non:\n  issues:\n    types: [opened]\nengine: ${1:copilot}\nimports:\n  - ${2:shared/setup.md}\n---\n# ${3:Workflow title}\n\n$0",
        ),
    ]
}

fn snippet(id: &str, label: &str, body: &str) -> CompletionItem {
    CompletionItem {
        label: label.to_owned(),
        kind: CompletionItemKind::Snippet,
        detail: None,
        documentation: None,
        insert_text: body.to_owned(),
        insert_text_format: InsertTextFormat::Snippet,
        sort_text: format!("2_snippet_{id}"),
        deprecated: false,
    }
}
