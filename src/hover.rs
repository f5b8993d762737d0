use crate::document::DocumentSnapshot;
use crate::protocol::{Hover, MarkupContent, Position};
use crate::schema::{PropertyInfo, SchemaProvider};
use crate::yaml_path;

/// Renders a Markdown hover for the frontmatter property under the cursor.
pub fn handle_hover(
    snapshot: Option<&DocumentSnapshot>,
    position: Position,
    schema: &SchemaProvider,
) -> Option<Hover> {
    let snapshot = snapshot?;
    if !snapshot.position_in_frontmatter(position) {
        return None;
    }

    let yaml_line = snapshot.yaml_relative_line(position.line)?;
    let resolved = yaml_path::resolve(&snapshot.frontmatter_yaml, yaml_line);
    if resolved.current_key.is_empty() {
        return None;
    }

    let mut full_path = resolved.path;
    full_path.push(resolved.current_key);

    let info = schema.property_description(&full_path)?;

    Some(Hover {
        contents: MarkupContent::markdown(render_markdown(&info)),
        range: None,
    })
}

fn render_markdown(info: &PropertyInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("### `{}`\n\n", info.name));

    if info.deprecated {
        out.push_str("⚠️ Deprecated\n\n");
    }

    if !info.description.is_empty() {
        out.push_str(&info.description);
        out.push_str("\n\n");
    }

    if !info.type_name.is_empty() {
        out.push_str(&format!("**Type:** `{}`\n\n", info.type_name));
    }

    if let Some(default) = &info.default {
        out.push_str(&format!("**Default:** `{default}`\n\n"));
    }

    if info.required {
        out.push_str("**Required**\n\n");
    }

    if !info.enum_values.is_empty() {
        out.push_str("**Allowed values:** ");
        let rendered: Vec<String> = info.enum_values.iter().map(|v| format!("`{v}`")).collect();
        out.push_str(&rendered.join(", "));
        out.push('\n');
    }

    out.trim_end().to_owned()
}
