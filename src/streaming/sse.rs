use crate::error::{AppError, AppResult};
use crate::models::StreamEvent;
use actix_web::web;

/// Format a stream event as an SSE message (`event: ...` / `data: ...`).
pub fn create_sse_event(event: &StreamEvent) -> AppResult<web::Bytes> {
    let data = serde_json::to_string(event)
        .map_err(|e| AppError::Internal(format!("Failed to serialize stream event: {}", e)))?;
    Ok(web::Bytes::from(format!(
        "event: {}\ndata: {}\n\n",
        event.event_name(),
        data
    )))
}

/// SSE comment line; ignored by EventSource clients, keeps proxies awake.
pub fn create_sse_comment(message: &str) -> web::Bytes {
    web::Bytes::from(format!(": {}\n\n", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sse_event_has_name_line_and_json_data() {
        let bytes = create_sse_event(&StreamEvent::TextDelta {
            delta: "hello".to_string(),
        })
        .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("event: text-delta\ndata: "));
        assert!(text.ends_with("\n\n"));

        let json_line = text
            .lines()
            .find(|l| l.starts_with("data: "))
            .unwrap()
            .trim_start_matches("data: ");
        let value: serde_json::Value = serde_json::from_str(json_line).unwrap();
        assert_eq!(value["delta"], "hello");
    }

    #[test]
    fn comments_are_prefixed_with_a_colon() {
        let bytes = create_sse_comment("ping");
        assert_eq!(&bytes[..], b": ping\n\n");
    }
}
