use crate::clients::GoogleClient;
use crate::clients::llm_client::{FunctionSpec, ToolSpec};
use crate::tools::{ToolError, ToolOutput, calendar_tools, task_tools};
use serde_json::{Value, json};
use std::sync::Arc;

/// Per-turn execution context handed to every tool: the gateway, the
/// caller's resolved access token and the calendar/tasklist the turn is
/// scoped to.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub google: Arc<GoogleClient>,
    pub access_token: String,
    pub calendar_id: String,
    pub tasklist_id: String,
}

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Tools that are declared to the model but deliberately answer with a fixed
/// "not implemented" result so the model can relay that gracefully.
const NOT_IMPLEMENTED_TOOLS: &[&str] = &[
    "updateCalendarEvent",
    "deleteCalendarEvent",
    "updateTask",
    "deleteTask",
];

#[derive(Debug, Default)]
pub struct ToolRegistry;

impl ToolRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "getCalendarEvents",
                description: "Get the user's calendar events within a time range. \
                              Use RFC 3339 timestamps for timeMin and timeMax.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "timeMin": {"type": "string", "description": "Inclusive lower bound, RFC 3339"},
                        "timeMax": {"type": "string", "description": "Exclusive upper bound, RFC 3339"},
                        "calendarId": {"type": "string", "description": "Calendar to read; defaults to the user's primary calendar"}
                    },
                    "required": ["timeMin", "timeMax"]
                }),
            },
            ToolDefinition {
                name: "addCalendarEvent",
                description: "Add an event to the user's calendar.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "summary": {"type": "string"},
                        "start": {"type": "string", "description": "Event start, RFC 3339"},
                        "end": {"type": "string", "description": "Event end, RFC 3339"},
                        "description": {"type": "string"},
                        "location": {"type": "string"}
                    },
                    "required": ["summary", "start", "end"]
                }),
            },
            ToolDefinition {
                name: "updateCalendarEvent",
                description: "Update an existing calendar event.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "eventId": {"type": "string"}
                    },
                    "required": ["eventId"]
                }),
            },
            ToolDefinition {
                name: "deleteCalendarEvent",
                description: "Delete a calendar event.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "eventId": {"type": "string"}
                    },
                    "required": ["eventId"]
                }),
            },
            ToolDefinition {
                name: "getTasks",
                description: "List the user's open tasks.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "tasklist": {"type": "string", "description": "Tasklist id; defaults to the user's default list"}
                    }
                }),
            },
            ToolDefinition {
                name: "addTask",
                description: "Add a task to the user's task list.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "notes": {"type": "string"},
                        "due": {"type": "string", "description": "Due date, RFC 3339"}
                    },
                    "required": ["title"]
                }),
            },
            ToolDefinition {
                name: "updateTask",
                description: "Update an existing task.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "taskId": {"type": "string"}
                    },
                    "required": ["taskId"]
                }),
            },
            ToolDefinition {
                name: "deleteTask",
                description: "Delete a task.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "taskId": {"type": "string"}
                    },
                    "required": ["taskId"]
                }),
            },
        ]
    }

    /// Tool definitions in the provider's function-calling shape.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.definitions()
            .into_iter()
            .map(|def| ToolSpec {
                kind: "function".to_string(),
                function: FunctionSpec {
                    name: def.name.to_string(),
                    description: def.description.to_string(),
                    parameters: def.parameters,
                },
            })
            .collect()
    }

    /// Human-readable progress line shown while a tool call is in flight.
    pub fn progress_message(&self, name: &str) -> String {
        match name {
            "getCalendarEvents" => "Looking up your calendar events".to_string(),
            "addCalendarEvent" => "Adding the event to your calendar".to_string(),
            "getTasks" => "Looking up your tasks".to_string(),
            "addTask" => "Adding the task to your list".to_string(),
            "updateCalendarEvent" | "deleteCalendarEvent" | "updateTask" | "deleteTask" => {
                "Checking what I can do with that".to_string()
            }
            other => format!("Running {}", other),
        }
    }

    /// Execute one model-issued tool call. At most once per call; there is no
    /// internal retry.
    pub async fn execute(
        &self,
        name: &str,
        args: &Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        if NOT_IMPLEMENTED_TOOLS.contains(&name) {
            return Ok(ToolOutput::NotImplemented {
                tool: name.to_string(),
                message: format!(
                    "The {} operation is not available yet. Let the user know and \
                     suggest doing it directly in their calendar or task app.",
                    name
                ),
            });
        }

        match name {
            "getCalendarEvents" => calendar_tools::get_calendar_events(args, ctx).await,
            "addCalendarEvent" => calendar_tools::add_calendar_event(args, ctx).await,
            "getTasks" => task_tools::get_tasks(args, ctx).await,
            "addTask" => task_tools::add_task(args, ctx).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context_with(base: String) -> ToolContext {
        ToolContext {
            google: Arc::new(GoogleClient::with_base_urls(
                reqwest::Client::new(),
                base.clone(),
                base,
            )),
            access_token: "token".to_string(),
            calendar_id: "primary".to_string(),
            tasklist_id: "@default".to_string(),
        }
    }

    #[test]
    fn every_definition_declares_an_object_schema() {
        let registry = ToolRegistry::new();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 8);
        for def in defs {
            assert_eq!(def.parameters["type"], "object");
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn specs_use_the_function_calling_shape() {
        let registry = ToolRegistry::new();
        let specs = registry.specs();
        assert!(specs.iter().all(|s| s.kind == "function"));
        assert!(specs.iter().any(|s| s.function.name == "getCalendarEvents"));
    }

    #[tokio::test]
    async fn declared_but_unimplemented_tools_return_fixed_results() {
        let registry = ToolRegistry::new();
        let ctx = context_with("http://localhost:1".to_string());

        for name in super::NOT_IMPLEMENTED_TOOLS {
            // No gateway call happens, so the dead endpoint above is never hit.
            let output = registry
                .execute(name, &json!({"eventId": "x", "taskId": "x"}), &ctx)
                .await
                .expect("unimplemented tools must not error");
            match output {
                ToolOutput::NotImplemented { tool, message } => {
                    assert_eq!(&tool, name);
                    assert!(message.contains("not available"));
                }
                other => panic!("expected NotImplemented, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_not_a_panic() {
        let registry = ToolRegistry::new();
        let ctx = context_with("http://localhost:1".to_string());
        let err = registry
            .execute("launchRocket", &json!({}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn missing_required_arguments_are_rejected_before_any_call() {
        let registry = ToolRegistry::new();
        let ctx = context_with("http://localhost:1".to_string());
        let err = registry
            .execute("getCalendarEvents", &json!({}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
