// OpenAI-compatible chat-completions client used for the streaming turn.
// Tool-call deltas arrive fragmented across chunks; ToolCallAccumulator
// reassembles them per choice index.
use crate::error::{AppError, AppResult};
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::pin::Pin;
use tracing::debug;

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub tools: Option<Vec<ToolSpec>>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: Option<String>,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    pub role: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    #[serde(default)]
    pub function: FunctionCallDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionCallDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One parsed event from the provider stream.
#[derive(Debug)]
pub enum LlmStreamEvent {
    Chunk(ChatCompletionChunk),
    Done,
}

/// A fully reassembled tool call, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl AssembledToolCall {
    /// Arguments as JSON. Malformed argument fragments degrade to an empty
    /// object so a single bad call cannot take down the turn.
    pub fn parsed_args(&self) -> serde_json::Value {
        serde_json::from_str(&self.arguments).unwrap_or_else(|_| serde_json::json!({}))
    }

    pub fn as_tool_call(&self) -> ToolCall {
        ToolCall {
            id: self.id.clone(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: self.name.clone(),
                arguments: self.arguments.clone(),
            },
        }
    }
}

/// Reassembles fragmented tool-call deltas. The provider streams the id and
/// name once per call and the argument string in arbitrary fragments, all
/// keyed by choice index.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    pending: Vec<AssembledToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, deltas: &[ToolCallDelta]) {
        for delta in deltas {
            while self.pending.len() <= delta.index {
                self.pending.push(AssembledToolCall {
                    id: String::new(),
                    name: String::new(),
                    arguments: String::new(),
                });
            }
            let slot = &mut self.pending[delta.index];
            if let Some(id) = &delta.id {
                slot.id.push_str(id);
            }
            if let Some(name) = &delta.function.name {
                slot.name.push_str(name);
            }
            if let Some(fragment) = &delta.function.arguments {
                slot.arguments.push_str(fragment);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn finish(self) -> Vec<AssembledToolCall> {
        self.pending
            .into_iter()
            .filter(|call| !call.name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(http: Client, api_key: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Open a streaming chat completion. The returned stream yields parsed
    /// chunks; transport and malformed-chunk failures surface as
    /// `AppError::External` and abort the turn.
    pub async fn stream_chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> AppResult<Pin<Box<dyn Stream<Item = AppResult<LlmStreamEvent>> + Send>>> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Opening model stream against {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Model provider request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::External(format!(
                "Model provider returned {}: {}",
                status, body
            )));
        }

        let byte_stream = response
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other));

        let events = byte_stream.eventsource().map(|item| match item {
            Ok(event) => {
                if event.data.trim() == "[DONE]" {
                    Ok(LlmStreamEvent::Done)
                } else {
                    serde_json::from_str::<ChatCompletionChunk>(&event.data)
                        .map(LlmStreamEvent::Chunk)
                        .map_err(|e| {
                            AppError::External(format!("Malformed stream chunk: {}", e))
                        })
                }
            }
            Err(e) => Err(AppError::External(format!("Model stream error: {}", e))),
        });

        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accumulator_reassembles_fragmented_arguments() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&[ToolCallDelta {
            index: 0,
            id: Some("call_abc".to_string()),
            function: FunctionCallDelta {
                name: Some("getCalendarEvents".to_string()),
                arguments: Some("{\"timeMin\":".to_string()),
            },
        }]);
        acc.absorb(&[ToolCallDelta {
            index: 0,
            id: None,
            function: FunctionCallDelta {
                name: None,
                arguments: Some("\"2026-08-31T00:00:00Z\"}".to_string()),
            },
        }]);

        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].name, "getCalendarEvents");
        assert_eq!(
            calls[0].parsed_args(),
            serde_json::json!({"timeMin": "2026-08-31T00:00:00Z"})
        );
    }

    #[test]
    fn accumulator_keeps_parallel_calls_separate() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&[
            ToolCallDelta {
                index: 0,
                id: Some("call_a".to_string()),
                function: FunctionCallDelta {
                    name: Some("getTasks".to_string()),
                    arguments: Some("{}".to_string()),
                },
            },
            ToolCallDelta {
                index: 1,
                id: Some("call_b".to_string()),
                function: FunctionCallDelta {
                    name: Some("getCalendarEvents".to_string()),
                    arguments: Some("{}".to_string()),
                },
            },
        ]);

        let calls = acc.finish();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].id, calls[1].id);
    }

    #[test]
    fn malformed_arguments_degrade_to_empty_object() {
        let call = AssembledToolCall {
            id: "call_x".to_string(),
            name: "addTask".to_string(),
            arguments: "{not json".to_string(),
        };
        assert_eq!(call.parsed_args(), serde_json::json!({}));
    }

    #[test]
    fn chunk_with_tool_call_delta_deserializes() {
        let data = r#"{
            "id": "chatcmpl-1",
            "choices": [{
                "delta": {
                    "tool_calls": [{
                        "index": 0,
                        "id": "call_1",
                        "function": {"name": "getTasks", "arguments": ""}
                    }]
                },
                "finish_reason": null
            }]
        }"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(data).unwrap();
        let deltas = chunk.choices[0].delta.tool_calls.as_ref().unwrap();
        assert_eq!(deltas[0].id.as_deref(), Some("call_1"));
    }

    #[test]
    fn tool_messages_serialize_in_provider_shape() {
        let msg = ChatMessage::tool_result("call_1", "{\"type\":\"tasks\"}");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_1");
        assert!(value.get("tool_calls").is_none());
    }
}
