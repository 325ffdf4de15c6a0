//! @ai:module:intent Recorded session format and its normalized timeline
//! @ai:module:layer domain
//! @ai:module:public_api RecordedSession, RecordedAction, SessionTimeline, SessionEvent, EventType
//! @ai:module:stateless true

use crate::error::{EvalError, Result};
use crate::scorer::action::is_readable_name;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// @ai:intent A raw session as captured by the desktop recorder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedSession {
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub actions: Vec<RecordedAction>,
}

/// @ai:intent One recorded user action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedAction {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub element: Option<ElementInfo>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub screenshot: Option<String>,
}

/// @ai:intent UI element metadata attached to a recorded action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub control_type: Option<String>,
    #[serde(default)]
    pub automation_id: Option<String>,
}

/// @ai:intent Normalized event type sent to the models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MouseClick,
    TextInput,
    KeyPress,
    Scroll,
    MouseDrag,
    KeyCombination,
}

impl EventType {
    /// @ai:intent Map a recorder command to an event type; None for STOP and unknown commands
    /// @ai:effects pure
    pub fn from_command(command: &str) -> Option<Self> {
        match command {
            "CLICK" => Some(EventType::MouseClick),
            "TYPE" => Some(EventType::TextInput),
            "PRESS" => Some(EventType::KeyPress),
            "SCROLL" => Some(EventType::Scroll),
            "DRAG" => Some(EventType::MouseDrag),
            "HOTKEY" | "COPY" | "PASTE" => Some(EventType::KeyCombination),
            _ => None,
        }
    }
}

/// @ai:intent One normalized session event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_ref: Option<String>,
}

/// @ai:intent Normalized session timeline used to build generation prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimeline {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub application: String,
    pub events: Vec<SessionEvent>,
    pub metadata: Map<String, Value>,
}

impl RecordedSession {
    /// @ai:intent Load and parse a session file
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EvalError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| EvalError::InvalidSession {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// @ai:intent Element names of pointer actions (CLICK, DRAG), in recording order
    ///            None where the recorder captured no usable name
    /// @ai:effects pure
    pub fn pointer_element_names(&self) -> Vec<Option<String>> {
        self.actions
            .iter()
            .filter(|a| matches!(a.command.as_str(), "CLICK" | "DRAG"))
            .map(|a| {
                a.element
                    .as_ref()
                    .and_then(|e| e.name.as_deref())
                    .filter(|name| is_readable_name(name))
                    .map(str::to_string)
            })
            .collect()
    }

    /// @ai:intent Convert the raw recording into a normalized timeline
    /// @ai:effects pure
    pub fn to_timeline(&self) -> SessionTimeline {
        let events = self.actions.iter().filter_map(normalize_action).collect();

        let session_id = match self.metadata.get("startTimeSeconds") {
            Some(Value::Number(n)) => format!("session-{}", n),
            Some(Value::String(s)) => format!("session-{}", s),
            _ => "session-unknown".to_string(),
        };

        let start_time = self
            .metadata
            .get("startTimeFormatted")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        let application = self
            .metadata
            .get("application")
            .and_then(Value::as_str)
            .unwrap_or("Desktop application")
            .to_string();

        SessionTimeline {
            session_id,
            start_time,
            application,
            events,
            metadata: self.metadata.clone(),
        }
    }
}

/// @ai:intent Normalize one recorded action; None when it should be dropped
/// @ai:effects pure
fn normalize_action(action: &RecordedAction) -> Option<SessionEvent> {
    let event_type = EventType::from_command(&action.command)?;

    let Some(raw_timestamp) = action.timestamp.as_deref() else {
        tracing::warn!("Dropping {} action without timestamp", action.command);
        return None;
    };

    let Some(timestamp) = parse_timestamp(raw_timestamp) else {
        tracing::warn!("Failed to parse timestamp '{}', dropping event", raw_timestamp);
        return None;
    };

    let mut data = action.parameters.clone();

    if let Some(Value::String(button)) = data.get("button") {
        let cleaned = button.replace("Button.", "").to_lowercase();
        data.insert("button".to_string(), Value::String(cleaned));
    }

    if let Some(Value::String(key)) = data.get("key") {
        if let Some(stripped) = key.strip_prefix("Key.") {
            let cleaned = stripped.to_lowercase();
            data.insert("key".to_string(), Value::String(cleaned));
        }
    }

    let intent = match action.command.as_str() {
        "COPY" => Some("copy_to_clipboard"),
        "PASTE" => Some("paste_from_clipboard"),
        _ => None,
    };

    if let Some(intent) = intent {
        let content = data.get("content").cloned().unwrap_or(Value::String(String::new()));
        data.insert("user_intent".to_string(), Value::String(intent.to_string()));
        data.insert("clipboard_content".to_string(), content);
    }

    if let Some(element) = &action.element {
        let fields = [
            ("element_name", element.name.as_deref()),
            ("element_type", element.control_type.as_deref()),
            ("automation_id", element.automation_id.as_deref()),
        ];

        for (field, value) in fields {
            if let Some(value) = value.filter(|v| is_readable_name(v)) {
                data.insert(field.to_string(), Value::String(value.to_string()));
            }
        }
    }

    Some(SessionEvent {
        timestamp,
        event_type,
        data,
        screenshot_ref: action.screenshot.clone(),
    })
}

/// @ai:intent Parse a recorder timestamp, repairing the "17:56M:47" minute glitch
/// @ai:effects pure
/// @ai:example ("2024-11-02T17:56M:47Z") -> Some(2024-11-02T17:56:47Z)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let repaired = raw.trim().replace("M:", ":");

    if let Ok(dt) = DateTime::parse_from_rfc3339(&repaired) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&repaired, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&repaired, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_session() -> RecordedSession {
        serde_json::from_value(json!({
            "metadata": { "startTimeSeconds": 1730570000, "startTimeFormatted": "2024-11-02T17:53:20Z" },
            "actions": [
                {
                    "command": "CLICK",
                    "timestamp": "2024-11-02T17:56M:47Z",
                    "element": { "name": "Search", "control_type": "Edit", "automation_id": "N/A" },
                    "parameters": { "x": 100, "y": 200, "button": "Button.left" }
                },
                {
                    "command": "PRESS",
                    "timestamp": "2024-11-02T17:56:49Z",
                    "parameters": { "key": "Key.Enter" }
                },
                {
                    "command": "DRAG",
                    "timestamp": "2024-11-02T17:57:01Z",
                    "element": { "name": "Unknown" },
                    "parameters": { "start_x": 1, "start_y": 2, "end_x": 30, "end_y": 40 }
                },
                { "command": "COPY", "timestamp": "2024-11-02T17:57:03Z", "parameters": { "content": "hello" } },
                { "command": "STOP", "timestamp": "2024-11-02T17:58:00Z" },
                { "command": "TYPE", "timestamp": "not a time", "parameters": { "text": "x" } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_timeline_drops_stop_and_bad_timestamps() {
        let timeline = sample_session().to_timeline();
        assert_eq!(timeline.session_id, "session-1730570000");
        assert_eq!(timeline.events.len(), 4);
    }

    #[test]
    fn test_timeline_cleans_buttons_and_keys() {
        let timeline = sample_session().to_timeline();

        let click = &timeline.events[0];
        assert_eq!(click.data["button"], json!("left"));
        assert_eq!(click.data["element_name"], json!("Search"));
        assert!(!click.data.contains_key("automation_id"));

        let press = &timeline.events[1];
        assert_eq!(press.data["key"], json!("enter"));
    }

    #[test]
    fn test_copy_carries_clipboard_intent() {
        let timeline = sample_session().to_timeline();
        let copy = &timeline.events[3];
        assert_eq!(copy.event_type, EventType::KeyCombination);
        assert_eq!(copy.data["user_intent"], json!("copy_to_clipboard"));
        assert_eq!(copy.data["clipboard_content"], json!("hello"));
    }

    #[test]
    fn test_pointer_element_names_skip_placeholders() {
        let names = sample_session().pointer_element_names();
        assert_eq!(names, vec![Some("Search".to_string()), None]);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-11-02T17:56M:47Z").is_some());
        assert!(parse_timestamp("2024-11-02T17:56:47.250").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
