use serde_json::Value;

/// Validate `instance` against `schema`. Returns `None` when it validates,
/// or a single semicolon-joined string of every violation message otherwise
/// — diagnostics in this server are one-message-per-document, not
/// one-per-violation, so multiple errors collapse into one.
pub fn validate(schema: &Value, instance: &Value) -> anyhow::Result<Option<String>> {
    let validator = jsonschema::validator_for(schema)?;
    let messages: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| error.to_string())
        .collect();

    if messages.is_empty() {
        Ok(None)
    } else {
        Ok(Some(messages.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_instance_yields_no_errors() {
        let schema = json!({"type": "object", "required": ["on"]});
        let instance = json!({"on": "push"});
        assert!(validate(&schema, &instance).unwrap().is_none());
    }

    #[test]
    fn missing_required_property_is_reported() {
        let schema = json!({"type": "object", "required": ["on"]});
        let instance = json!({});
        let message = validate(&schema, &instance).unwrap().unwrap();
        assert!(message.contains("on"));
    }

    #[test]
    fn multiple_violations_are_joined_with_a_semicolon() {
        let schema = json!({
            "type": "object",
            "required": ["on", "name"],
            "properties": { "name": { "type": "string" } }
        });
        let instance = json!({"name": 5});
        let message = validate(&schema, &instance).unwrap().unwrap();
        assert!(message.contains(';'));
    }
}
