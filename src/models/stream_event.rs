use serde::{Deserialize, Serialize};

/// Strongly-typed streaming events for SSE communication with the chat
/// client. Each tool call sees exactly one `ToolCall` and exactly one
/// `ToolResult` with the same `tool_call_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Incremental text produced by the model.
    TextDelta { delta: String },
    /// The model requested a tool; `message` is the human-readable progress
    /// line the client can show while the tool runs.
    ToolCall {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        args: serde_json::Value,
        message: String,
    },
    /// Terminal state of a tool call. Execution errors arrive here as a
    /// textual result rather than aborting the turn.
    ToolResult {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        result: serde_json::Value,
    },
    /// The turn completed; all text and tool results have been sent.
    Finish {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    /// The turn failed after streaming had begun.
    Error { message: String },
}

impl StreamEvent {
    /// SSE event name for this variant.
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamEvent::TextDelta { .. } => "text-delta",
            StreamEvent::ToolCall { .. } => "tool-call",
            StreamEvent::ToolResult { .. } => "tool-result",
            StreamEvent::Finish { .. } => "finish",
            StreamEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn events_serialize_with_kebab_case_tags() {
        let event = StreamEvent::TextDelta {
            delta: "안녕".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "text-delta");
        assert_eq!(value["delta"], "안녕");
    }

    #[test]
    fn tool_lifecycle_events_carry_matching_ids() {
        let call = StreamEvent::ToolCall {
            tool_call_id: "call_9".into(),
            tool_name: "getTasks".into(),
            args: serde_json::json!({}),
            message: "Looking up your tasks".into(),
        };
        let result = StreamEvent::ToolResult {
            tool_call_id: "call_9".into(),
            tool_name: "getTasks".into(),
            result: serde_json::json!({"type": "tasks", "tasks": []}),
        };

        let call_value = serde_json::to_value(&call).unwrap();
        let result_value = serde_json::to_value(&result).unwrap();
        assert_eq!(call_value["toolCallId"], result_value["toolCallId"]);
        assert_eq!(call.event_name(), "tool-call");
        assert_eq!(result.event_name(), "tool-result");
    }
}
