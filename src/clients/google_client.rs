use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

const CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const TASKS_BASE_URL: &str = "https://tasks.googleapis.com/tasks/v1";

/// The tasklist Google resolves to the user's default list.
pub const DEFAULT_TASKLIST: &str = "@default";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    pub summary: Option<String>,
    pub primary: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

/// Either a timed (`date_time`) or an all-day (`date`) boundary, in the
/// provider's own RFC 3339 / civil-date string forms.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
    pub time_zone: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleTask {
    pub id: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TasksResponse {
    #[serde(default)]
    items: Vec<GoogleTask>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<String>,
}

/// Thin typed wrapper over Google Calendar v3 and Google Tasks v1. Access
/// tokens are supplied per call by the credential store; this client holds no
/// credential state of its own.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: Client,
    calendar_base: String,
    tasks_base: String,
}

impl GoogleClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            calendar_base: CALENDAR_BASE_URL.to_string(),
            tasks_base: TASKS_BASE_URL.to_string(),
        }
    }

    /// Override the provider endpoints, used by tests against a local mock.
    pub fn with_base_urls(http: Client, calendar_base: String, tasks_base: String) -> Self {
        Self {
            http,
            calendar_base: calendar_base.trim_end_matches('/').to_string(),
            tasks_base: tasks_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_calendars(&self, access_token: &str) -> AppResult<Vec<CalendarListEntry>> {
        let url = format!("{}/users/me/calendarList", self.calendar_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Calendar list request failed: {}", e)))?;

        let body: CalendarListResponse = Self::check(response).await?.json().await?;
        Ok(body.items)
    }

    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
    ) -> AppResult<Vec<CalendarEvent>> {
        let url = format!("{}/calendars/{}/events", self.calendar_base, calendar_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min),
                ("timeMax", time_max),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "50"),
            ])
            .send()
            .await
            .map_err(|e| AppError::External(format!("Event list request failed: {}", e)))?;

        let body: EventsResponse = Self::check(response).await?.json().await?;
        Ok(body.items)
    }

    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &NewCalendarEvent,
    ) -> AppResult<CalendarEvent> {
        let url = format!("{}/calendars/{}/events", self.calendar_base, calendar_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Event insert request failed: {}", e)))?;

        let created: CalendarEvent = Self::check(response).await?.json().await?;
        Ok(created)
    }

    pub async fn list_tasks(
        &self,
        access_token: &str,
        tasklist: &str,
    ) -> AppResult<Vec<GoogleTask>> {
        let url = format!("{}/lists/{}/tasks", self.tasks_base, tasklist);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("showCompleted", "false"), ("maxResults", "50")])
            .send()
            .await
            .map_err(|e| AppError::External(format!("Task list request failed: {}", e)))?;

        let body: TasksResponse = Self::check(response).await?.json().await?;
        Ok(body.items)
    }

    pub async fn insert_task(
        &self,
        access_token: &str,
        tasklist: &str,
        task: &NewTask,
    ) -> AppResult<GoogleTask> {
        let url = format!("{}/lists/{}/tasks", self.tasks_base, tasklist);
        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(task)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Task insert request failed: {}", e)))?;

        let created: GoogleTask = Self::check(response).await?.json().await?;
        Ok(created)
    }

    async fn check(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::External(format!(
            "Google API returned {}: {}",
            status, body
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn list_events_parses_provider_items() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "items": [{
                        "id": "evt1",
                        "summary": "Standup",
                        "start": {"dateTime": "2026-08-31T09:00:00+09:00"},
                        "end": {"dateTime": "2026-08-31T09:15:00+09:00"}
                    }]
                }"#,
            )
            .create_async()
            .await;

        let client = GoogleClient::with_base_urls(
            reqwest::Client::new(),
            server.url(),
            server.url(),
        );
        let events = client
            .list_events(
                "token",
                "primary",
                "2026-08-31T00:00:00Z",
                "2026-09-01T00:00:00Z",
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary.as_deref(), Some("Standup"));
        assert_eq!(
            events[0].start.as_ref().unwrap().date_time.as_deref(),
            Some("2026-08-31T09:00:00+09:00")
        );
    }

    #[tokio::test]
    async fn non_success_status_maps_to_external_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me/calendarList")
            .with_status(401)
            .with_body(r#"{"error": {"code": 401}}"#)
            .create_async()
            .await;

        let client = GoogleClient::with_base_urls(
            reqwest::Client::new(),
            server.url(),
            server.url(),
        );
        let err = client.list_calendars("expired-token").await.unwrap_err();
        assert!(matches!(err, AppError::External(_)));
    }

    #[test]
    fn all_day_events_deserialize_without_date_time() {
        let raw = r#"{"id": "e2", "summary": "Holiday", "start": {"date": "2026-09-01"}, "end": {"date": "2026-09-02"}}"#;
        let event: CalendarEvent = serde_json::from_str(raw).unwrap();
        let start = event.start.unwrap();
        assert_eq!(start.date.as_deref(), Some("2026-09-01"));
        assert!(start.date_time.is_none());
    }
}
