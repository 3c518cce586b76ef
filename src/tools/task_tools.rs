use crate::clients::google_client::NewTask;
use crate::tools::registry::ToolContext;
use crate::tools::{ToolError, ToolOutput};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTasksArgs {
    tasklist: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTaskArgs {
    title: String,
    notes: Option<String>,
    due: Option<String>,
}

pub async fn get_tasks(args: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
    let args: GetTasksArgs =
        serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments {
            tool: "getTasks".to_string(),
            reason: e.to_string(),
        })?;

    let tasklist = args.tasklist.unwrap_or_else(|| ctx.tasklist_id.clone());
    let tasks = ctx
        .google
        .list_tasks(&ctx.access_token, &tasklist)
        .await
        .map_err(|e| ToolError::Gateway {
            tool: "getTasks".to_string(),
            source: e,
        })?;

    Ok(ToolOutput::Tasks { tasks })
}

pub async fn add_task(args: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
    let args: AddTaskArgs =
        serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments {
            tool: "addTask".to_string(),
            reason: e.to_string(),
        })?;

    let task = NewTask {
        title: args.title,
        notes: args.notes,
        due: args.due,
    };

    let created = ctx
        .google
        .insert_task(&ctx.access_token, &ctx.tasklist_id, &task)
        .await
        .map_err(|e| ToolError::Gateway {
            tool: "addTask".to_string(),
            source: e,
        })?;

    Ok(ToolOutput::Task { task: created })
}
