use crate::clients::google_client::{CalendarEvent, EventDateTime, NewCalendarEvent};
use crate::tools::registry::ToolContext;
use crate::tools::{EventDay, ToolError, ToolOutput};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetEventsArgs {
    time_min: String,
    time_max: String,
    calendar_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddEventArgs {
    summary: String,
    start: String,
    end: String,
    description: Option<String>,
    location: Option<String>,
}

pub async fn get_calendar_events(args: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
    let args: GetEventsArgs =
        serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments {
            tool: "getCalendarEvents".to_string(),
            reason: e.to_string(),
        })?;

    let calendar_id = args.calendar_id.unwrap_or_else(|| ctx.calendar_id.clone());
    let events = ctx
        .google
        .list_events(&ctx.access_token, &calendar_id, &args.time_min, &args.time_max)
        .await
        .map_err(|e| ToolError::Gateway {
            tool: "getCalendarEvents".to_string(),
            source: e,
        })?;

    Ok(ToolOutput::Events {
        calendar_id,
        days: group_by_day(events),
    })
}

pub async fn add_calendar_event(args: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
    let args: AddEventArgs =
        serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments {
            tool: "addCalendarEvent".to_string(),
            reason: e.to_string(),
        })?;

    let event = NewCalendarEvent {
        summary: args.summary,
        description: args.description,
        location: args.location,
        start: timed(args.start),
        end: timed(args.end),
    };

    let created = ctx
        .google
        .insert_event(&ctx.access_token, &ctx.calendar_id, &event)
        .await
        .map_err(|e| ToolError::Gateway {
            tool: "addCalendarEvent".to_string(),
            source: e,
        })?;

    Ok(ToolOutput::Event { event: created })
}

fn timed(date_time: String) -> EventDateTime {
    EventDateTime {
        date_time: Some(date_time),
        date: None,
        time_zone: None,
    }
}

/// Group events by civil date in first-seen order. Timed events contribute
/// the date part of their start timestamp; all-day events their start date.
fn group_by_day(events: Vec<CalendarEvent>) -> Vec<EventDay> {
    let mut days: Vec<EventDay> = Vec::new();

    for event in events {
        let date = event
            .start
            .as_ref()
            .and_then(|s| {
                s.date
                    .clone()
                    .or_else(|| s.date_time.as_ref().map(|dt| dt.chars().take(10).collect()))
            })
            .unwrap_or_else(|| "unknown".to_string());

        match days.iter_mut().find(|d| d.date == date) {
            Some(day) => day.events.push(event),
            None => days.push(EventDay {
                date,
                events: vec![event],
            }),
        }
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(start: EventDateTime) -> CalendarEvent {
        CalendarEvent {
            id: None,
            summary: None,
            description: None,
            location: None,
            start: Some(start),
            end: None,
            status: None,
        }
    }

    #[test]
    fn grouping_splits_timed_events_by_start_date() {
        let events = vec![
            event(EventDateTime {
                date_time: Some("2026-08-31T09:00:00+09:00".into()),
                date: None,
                time_zone: None,
            }),
            event(EventDateTime {
                date_time: Some("2026-08-31T14:00:00+09:00".into()),
                date: None,
                time_zone: None,
            }),
            event(EventDateTime {
                date_time: Some("2026-09-01T10:00:00+09:00".into()),
                date: None,
                time_zone: None,
            }),
        ];

        let days = group_by_day(events);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2026-08-31");
        assert_eq!(days[0].events.len(), 2);
        assert_eq!(days[1].date, "2026-09-01");
    }

    #[test]
    fn grouping_uses_civil_date_for_all_day_events() {
        let events = vec![event(EventDateTime {
            date_time: None,
            date: Some("2026-09-05".into()),
            time_zone: None,
        })];
        let days = group_by_day(events);
        assert_eq!(days[0].date, "2026-09-05");
    }
}
