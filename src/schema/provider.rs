use serde_json::Value;
use thiserror::Error;

const EMBEDDED_SCHEMA: &str = include_str!("../../assets/frontmatter.schema.json");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("embedded schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything this server can say about a single frontmatter property.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyInfo {
    pub name: String,
    pub description: String,
    pub type_name: String,
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub deprecated: bool,
    pub required: bool,
}

/// Read-only view over the embedded JSON Schema, loaded once at startup.
/// Answers two questions: "what properties exist at this path" and "what do
/// we know about this one property" (its description, type, enum, default,
/// and deprecation).
///
/// Ref resolution is shallow and re-done at each step of descent rather than
/// pre-resolved once, since the schema is small and re-resolving keeps the
/// rest of this module simple. `oneOf`/`anyOf` are resolved to their first
/// matching branch rather than unioned across branches: a property like
/// `engine` is either the string form or the object form, never both at once,
/// so listing every key from every branch would offer completions that don't
/// belong together.
pub struct SchemaProvider {
    root: Value,
}

impl SchemaProvider {
    pub fn new() -> Result<Self, SchemaError> {
        let root: Value = serde_json::from_str(EMBEDDED_SCHEMA)?;
        Ok(Self { root })
    }

    /// Properties available at the document root.
    pub fn top_level_properties(&self) -> Vec<PropertyInfo> {
        self.properties_at(&[])
    }

    /// Properties available at `path` (e.g. `["on", "issues"]`).
    pub fn nested_properties(&self, path: &[String]) -> Vec<PropertyInfo> {
        self.properties_at(path)
    }

    /// Detail for the single property named by the last element of `path`,
    /// resolved against the properties of its parent.
    pub fn property_description(&self, path: &[String]) -> Option<PropertyInfo> {
        let (last, parent_path) = path.split_last()?;
        let parent = self.navigate(parent_path)?;
        let owner = properties_owner(parent, &self.root)?;
        let props = owner.get("properties")?.as_object()?;
        let schema_node = props.get(last)?;
        let required = required_of(owner);
        Some(build_property_info(last, schema_node, &self.root, &required))
    }

    /// Allowed values for the property at `path`, including enums that live
    /// inside a string-typed `oneOf` branch rather than directly on the node.
    pub fn enum_values(&self, path: &[String]) -> Vec<String> {
        match self.navigate(path) {
            Some(node) => enum_values_of(node, &self.root),
            None => Vec::new(),
        }
    }

    /// The raw schema document, for callers (the schema validator) that need
    /// the whole tree rather than a single property's view of it.
    pub fn raw(&self) -> &Value {
        &self.root
    }

    fn properties_at(&self, path: &[String]) -> Vec<PropertyInfo> {
        let Some(node) = self.navigate(path) else {
            return Vec::new();
        };
        let Some(owner) = properties_owner(node, &self.root) else {
            return Vec::new();
        };
        let Some(props) = owner.get("properties").and_then(Value::as_object) else {
            return Vec::new();
        };
        let required = required_of(owner);
        props
            .iter()
            .map(|(name, schema_node)| build_property_info(name, schema_node, &self.root, &required))
            .collect()
    }

    /// Descend `path` from the schema root, following `properties` one
    /// segment at a time. Returns the (unresolved) schema node at that path.
    fn navigate(&self, path: &[String]) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path {
            let owner = properties_owner(current, &self.root)?;
            let props = owner.get("properties")?.as_object()?;
            current = props.get(segment.as_str())?;
        }
        Some(current)
    }
}

/// Resolve a single `$ref` hop (`"#/a/b/c"` style JSON Pointer fragments
/// only). Returns `node` unchanged if it isn't a ref.
fn resolve_shallow<'a>(node: &'a Value, root: &'a Value) -> &'a Value {
    if let Some(Value::String(reference)) = node.get("$ref") {
        if let Some(pointer) = reference.strip_prefix('#') {
            if let Some(target) = root.pointer(pointer) {
                return target;
            }
        }
    }
    node
}

/// Find the schema node that actually carries a `properties` map for `node`:
/// itself, the first `oneOf`/`anyOf` branch that has one, or — for arrays —
/// its `items` schema. Needed so sequence-of-mapping schemas (like
/// `on.schedule`) expose the properties of one schedule entry.
fn properties_owner<'a>(node: &'a Value, root: &'a Value) -> Option<&'a Value> {
    let resolved = resolve_shallow(node, root);

    if resolved.get("properties").and_then(Value::as_object).is_some() {
        return Some(resolved);
    }

    for key in ["oneOf", "anyOf"] {
        if let Some(variants) = resolved.get(key).and_then(Value::as_array) {
            for variant in variants {
                let resolved_variant = resolve_shallow(variant, root);
                if resolved_variant
                    .get("properties")
                    .and_then(Value::as_object)
                    .is_some()
                {
                    return Some(resolved_variant);
                }
            }
        }
    }

    if let Some(items) = resolved.get("items") {
        let resolved_items = resolve_shallow(items, root);
        if resolved_items
            .get("properties")
            .and_then(Value::as_object)
            .is_some()
        {
            return Some(resolved_items);
        }
    }

    None
}

fn required_of(owner: &Value) -> Vec<String> {
    owner
        .get("required")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// A node's own `enum`, or — failing that — the `enum` of the first
/// string-typed `oneOf` branch. Covers properties like `engine`, which is
/// either a bare enum string or an object with no top-level enum of its own.
fn enum_values_of(node: &Value, root: &Value) -> Vec<String> {
    let resolved = resolve_shallow(node, root);

    if let Some(values) = resolved.get("enum").and_then(Value::as_array) {
        return stringify_enum(values);
    }

    if let Some(variants) = resolved.get("oneOf").and_then(Value::as_array) {
        for variant in variants {
            let resolved_variant = resolve_shallow(variant, root);
            if resolved_variant.get("type").and_then(Value::as_str) == Some("string") {
                if let Some(values) = resolved_variant.get("enum").and_then(Value::as_array) {
                    return stringify_enum(values);
                }
            }
        }
    }

    // Arrays of enum-valued strings (e.g. `on.issues.types`) carry their
    // enum on the `items` schema rather than the array node itself.
    if let Some(items) = resolved.get("items") {
        let resolved_items = resolve_shallow(items, root);
        if let Some(values) = resolved_items.get("enum").and_then(Value::as_array) {
            return stringify_enum(values);
        }
    }

    Vec::new()
}

fn stringify_enum(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .map(|value| match value {
            Value::String(s) => format!("\"{s}\""),
            other => other.to_string(),
        })
        .collect()
}

fn build_property_info(
    name: &str,
    schema_node: &Value,
    root: &Value,
    required: &[String],
) -> PropertyInfo {
    let resolved = resolve_shallow(schema_node, root);

    let description = resolved
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let type_name = resolved
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let default = resolved.get("default").map(|v| v.to_string());
    let deprecated = resolved.get("deprecated").and_then(Value::as_bool).unwrap_or(false)
        || description.to_lowercase().contains("deprecated");

    PropertyInfo {
        name: name.to_owned(),
        description,
        type_name,
        enum_values: enum_values_of(schema_node, root),
        default,
        deprecated,
        required: required.iter().any(|r| r == name),
    }
}
