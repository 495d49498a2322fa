//! Local tools the model may call during a completion.

use chrono::{Datelike, Local};
use serde::Serialize;
use serde_json::{json, Value};

/// Tool definition in the shape the Messages API expects.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

type ToolFn = fn(&Value) -> Value;

struct RegisteredTool {
    definition: ToolDefinition,
    run: ToolFn,
}

/// Name → handler table.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        ToolRegistry { tools: Vec::new() }
    }

    /// Registry with every built-in tool.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            ToolDefinition {
                name: "get_today_date".to_string(),
                description: "Get today's current date and time".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
            get_today_date,
        );
        registry
    }

    /// Add a tool. A later registration with the same name replaces the earlier one.
    pub fn register(&mut self, definition: ToolDefinition, run: ToolFn) {
        self.tools.retain(|t| t.definition.name != definition.name);
        self.tools.push(RegisteredTool { definition, run });
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run the named tool. Unknown names produce an error object, not a failure,
    /// so the model can see what went wrong.
    pub fn call(&self, name: &str, input: &Value) -> Value {
        match self.tools.iter().find(|t| t.definition.name == name) {
            Some(tool) => (tool.run)(input),
            None => json!({ "error": format!("Unknown tool: {}", name) }),
        }
    }
}

fn get_today_date(_input: &Value) -> Value {
    let now = Local::now();
    json!({
        "date": now.format("%Y-%m-%d").to_string(),
        "time": now.format("%H:%M:%S").to_string(),
        "datetime": now.format("%Y-%m-%d %H:%M:%S").to_string(),
        "iso_format": now.to_rfc3339(),
        "day_of_week": now.format("%A").to_string(),
        "month": now.format("%B").to_string(),
        "year": now.year(),
        "timestamp": now.timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_today_date() {
        let names: Vec<String> = ToolRegistry::builtin()
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["get_today_date"]);
    }

    #[test]
    fn test_today_date_fields() {
        let out = ToolRegistry::builtin().call("get_today_date", &json!({}));
        let keys = [
            "date",
            "time",
            "datetime",
            "iso_format",
            "day_of_week",
            "month",
            "year",
            "timestamp",
        ];
        for key in keys {
            assert!(out.get(key).is_some(), "missing {key}");
        }
        assert_eq!(out["date"].as_str().map(str::len), Some(10));
        assert!(out["year"].as_i64().unwrap_or(0) >= 2024);
    }

    #[test]
    fn test_unknown_tool_returns_error_object() {
        let out = ToolRegistry::builtin().call("get_calendar_events", &json!({}));
        assert_eq!(out["error"], "Unknown tool: get_calendar_events");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ToolRegistry::builtin();
        registry.register(
            ToolDefinition {
                name: "get_today_date".into(),
                description: "stub".into(),
                input_schema: json!({"type": "object"}),
            },
            |_| json!({"stub": true}),
        );
        assert_eq!(registry.definitions().len(), 1);
        assert_eq!(registry.call("get_today_date", &json!({}))["stub"], true);
    }

    #[test]
    fn test_definition_serializes_input_schema() {
        let defs = ToolRegistry::builtin().definitions();
        let v = serde_json::to_value(&defs[0]).expect("serialize");
        assert_eq!(v["input_schema"]["type"], "object");
    }

    #[test]
    fn test_empty_registry() {
        assert!(ToolRegistry::empty().is_empty());
        assert!(!ToolRegistry::builtin().is_empty());
    }
}
