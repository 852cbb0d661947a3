//! Tool-invocation actions.
//!
//! An [`Action`] is a named operation with typed JSON input and output,
//! discoverable via `GET /api/readme/actions` and callable via
//! `POST /api/readme/actions/{name}`. Built-in actions live in an
//! [`ActionRegistry`]; callers embedding the library can register more.
//!
//! # Example
//!
//! ```rust
//! use readme_harness::actions::ActionRegistry;
//!
//! let actions = ActionRegistry::with_builtins();
//! assert!(actions.find("get-readme-content").is_some());
//! ```

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::service::ReadmeService;

/// Input that failed validation against an action's schema.
#[derive(Debug, thiserror::Error)]
#[error("invalid input: {0}")]
pub struct InvalidInput(pub String);

/// A named operation callers can discover and invoke.
#[async_trait]
pub trait Action: Send + Sync {
    /// Identifier used in the route path, e.g. `"get-readme-content"`.
    fn name(&self) -> &str;

    fn title(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the input object.
    fn input_schema(&self) -> Value;

    /// JSON Schema for the output object.
    fn output_schema(&self) -> Value;

    /// Run the action. `input` has already passed [`validate_input`].
    async fn invoke(&self, input: Value, ctx: &ActionContext) -> Result<Value>;
}

/// What an action can reach while it runs.
#[derive(Clone)]
pub struct ActionContext {
    service: Arc<ReadmeService>,
}

impl ActionContext {
    pub fn new(service: Arc<ReadmeService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ReadmeService {
        &self.service
    }
}

/// Discovery entry served by the action list endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

impl ActionInfo {
    pub fn of(action: &dyn Action) -> Self {
        Self {
            name: action.name().to_string(),
            title: action.title().to_string(),
            description: action.description().to_string(),
            input_schema: action.input_schema(),
            output_schema: action.output_schema(),
        }
    }
}

/// Check `input` against the `required` and per-property `type` entries of
/// a JSON Schema object. Unknown properties pass through.
pub fn validate_input(schema: &Value, input: &Value) -> Result<(), InvalidInput> {
    let Some(obj) = input.as_object() else {
        return Err(InvalidInput("input must be a JSON object".to_string()));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !obj.contains_key(field) {
                return Err(InvalidInput(format!("missing required field: {}", field)));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in properties {
            let (Some(value), Some(expected)) =
                (obj.get(name), prop.get("type").and_then(Value::as_str))
            else {
                continue;
            };
            let type_ok = match expected {
                "string" => value.is_string(),
                "boolean" => value.is_boolean(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !type_ok {
                return Err(InvalidInput(format!(
                    "field '{}' must be of type '{}'",
                    name, expected
                )));
            }
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetReadmeInput {
    entity_ref: String,
    #[serde(default)]
    strip_markdown: bool,
}

/// Fetch an entity's README, optionally reduced to plain text.
pub struct GetReadmeAction;

#[async_trait]
impl Action for GetReadmeAction {
    fn name(&self) -> &str {
        "get-readme-content"
    }

    fn title(&self) -> &str {
        "Get README content"
    }

    fn description(&self) -> &str {
        "Retrieve the README of a catalog entity"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "entityRef": {
                    "type": "string",
                    "description": "Entity reference, e.g. component:default/my-service"
                },
                "stripMarkdown": {
                    "type": "boolean",
                    "description": "Return plain text instead of markdown",
                    "default": false
                }
            },
            "required": ["entityRef"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "entityRef": { "type": "string" },
                "content": { "type": "string" },
                "contentType": { "type": "string" },
                "fileName": { "type": "string" }
            },
            "required": ["entityRef", "content", "contentType", "fileName"]
        })
    }

    async fn invoke(&self, input: Value, ctx: &ActionContext) -> Result<Value> {
        let input: GetReadmeInput =
            serde_json::from_value(input).map_err(|e| InvalidInput(e.to_string()))?;
        if input.entity_ref.trim().is_empty() {
            return Err(InvalidInput("entityRef must not be empty".to_string()).into());
        }

        let output = ctx
            .service()
            .get_readme_output(&input.entity_ref, input.strip_markdown)
            .await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Registered actions, looked up by name.
pub struct ActionRegistry {
    actions: Vec<Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// A registry holding `get-readme-content`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GetReadmeAction));
        registry
    }

    pub fn register(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Box<dyn Action>] {
        &self.actions
    }

    pub fn find(&self, name: &str) -> Option<&dyn Action> {
        self.actions
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn infos(&self) -> Vec<ActionInfo> {
        self.actions.iter().map(|a| ActionInfo::of(a.as_ref())).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = ActionRegistry::with_builtins();
        assert_eq!(registry.len(), 1);
        assert!(registry.find("get-readme-content").is_some());
        assert!(registry.find("nope").is_none());

        let infos = registry.infos();
        assert_eq!(infos[0].input_schema["required"], json!(["entityRef"]));
        assert_eq!(
            serde_json::to_value(&infos[0]).unwrap()["outputSchema"]["properties"]["fileName"]
                ["type"],
            "string"
        );
    }

    #[test]
    fn test_validate_input() {
        let schema = GetReadmeAction.input_schema();
        assert!(validate_input(&schema, &json!({ "entityRef": "component:default/a" })).is_ok());
        assert!(validate_input(
            &schema,
            &json!({ "entityRef": "a", "stripMarkdown": true, "extra": 1 })
        )
        .is_ok());

        let err = validate_input(&schema, &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: missing required field: entityRef");

        let err = validate_input(&schema, &json!({ "entityRef": 7 })).unwrap_err();
        assert!(err.to_string().contains("'entityRef' must be of type 'string'"));

        assert!(validate_input(&schema, &json!({ "entityRef": "a", "stripMarkdown": "yes" })).is_err());
        assert!(validate_input(&schema, &json!("component:default/a")).is_err());
    }
}
