pub mod calendar_tools;
pub mod registry;
pub mod task_tools;

pub use registry::{ToolContext, ToolDefinition, ToolRegistry};

use crate::clients::google_client::{CalendarEvent, GoogleTask};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Everything a tool can hand back to the model and the client. A closed set
/// of variants dispatched by tag; the client renders each variant with its
/// own widget and falls back to plain text for anything it does not know.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolOutput {
    Text {
        text: String,
    },
    Events {
        #[serde(rename = "calendarId")]
        calendar_id: String,
        days: Vec<EventDay>,
    },
    Event {
        event: CalendarEvent,
    },
    Tasks {
        tasks: Vec<GoogleTask>,
    },
    Task {
        task: GoogleTask,
    },
    NotImplemented {
        tool: String,
        message: String,
    },
}

/// Calendar events grouped by civil date, in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDay {
    pub date: String,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("{tool} failed: {source}")]
    Gateway {
        tool: String,
        #[source]
        source: AppError,
    },
}

impl ToolError {
    /// The textual form fed back to the model and streamed to the client in
    /// place of a result. Tool failures never abort the turn.
    pub fn as_result_text(&self) -> String {
        format!("Tool execution failed: {}", self)
    }
}
