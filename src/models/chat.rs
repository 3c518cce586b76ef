use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of model identifiers a turn may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelId {
    Gpt4o,
    Gpt4oMini,
    Gpt41,
    Gpt41Mini,
}

impl ModelId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gpt41 => "gpt-4.1",
            ModelId::Gpt41Mini => "gpt-4.1-mini",
        }
    }
}

impl FromStr for ModelId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt-4o" => Ok(ModelId::Gpt4o),
            "gpt-4o-mini" => Ok(ModelId::Gpt4oMini),
            "gpt-4.1" => Ok(ModelId::Gpt41),
            "gpt-4.1-mini" => Ok(ModelId::Gpt41Mini),
            other => Err(AppError::UnsupportedModel(format!(
                "model '{}' is not supported",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prior turn supplied by the client when starting a new turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

/// Request body of the chat streaming endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub messages: Vec<IncomingMessage>,
    pub model: String,
    pub chat_id: Uuid,
}

/// One tool call requested by the model during a turn, with its terminal
/// result. Serialized verbatim into the persisted `parts` payload and into
/// the stream, so reads reproduce exactly what the turn produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    #[serde(rename = "type")]
    pub kind: String,
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: serde_json::Value,
    pub result: serde_json::Value,
}

impl ToolInvocation {
    pub fn new(
        tool_call_id: String,
        tool_name: String,
        args: serde_json::Value,
        result: serde_json::Value,
    ) -> Self {
        Self {
            kind: "tool-invocation".to_string(),
            tool_call_id,
            tool_name,
            args,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_models_parse_and_round_trip() {
        for id in ["gpt-4o", "gpt-4o-mini", "gpt-4.1", "gpt-4.1-mini"] {
            let parsed = ModelId::from_str(id).expect("known model must parse");
            assert_eq!(parsed.as_str(), id);
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = ModelId::from_str("gpt-2").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedModel(_)));
    }

    #[test]
    fn tool_invocation_serializes_with_stable_field_names() {
        let invocation = ToolInvocation::new(
            "call_1".to_string(),
            "getCalendarEvents".to_string(),
            serde_json::json!({"timeMin": "2026-08-31T00:00:00Z"}),
            serde_json::json!({"type": "text", "text": "no events"}),
        );
        let value = serde_json::to_value(&invocation).unwrap();
        assert_eq!(value["type"], "tool-invocation");
        assert_eq!(value["toolCallId"], "call_1");
        assert_eq!(value["toolName"], "getCalendarEvents");

        let back: ToolInvocation = serde_json::from_value(value).unwrap();
        assert_eq!(back, invocation);
    }
}
