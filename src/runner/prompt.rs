//! @ai:module:intent Build the workflow generation prompt from a session timeline
//! @ai:module:layer application
//! @ai:module:public_api build_generation_prompt
//! @ai:module:stateless true

use crate::dataset::SessionTimeline;

/// Target workflow schema shown to the model
const WORKFLOW_SCHEMA: &str = r#"{
    "workflow_id": "string",
    "name": "string - descriptive name for the workflow",
    "description": "string - what this workflow accomplishes",
    "version": "1.0.0",
    "application": "string - target application name",
    "steps": [
        {
            "step_id": "string",
            "action": "CLICK|TYPE_TEXT|PRESS_KEY|KEY_COMBINATION|DOUBLE_CLICK|RIGHT_CLICK|SCROLL|DRAG|WAIT|NAVIGATE",
            "description": "string - human readable description",
            "selector": {
                "type": "text",
                "value": "visible text or label of UI element",
                "fallback": {
                    "type": "coordinates",
                    "value": {"x": number, "y": number}
                }
            },
            "parameters": {},
            "wait_after": 0.5,
            "retry_count": 3,
            "on_failure": "stop"
        }
    ],
    "variables": {},
    "preconditions": [],
    "metadata": {}
}"#;

const RULES: &str = "\
RULES:
1. Pointer actions (CLICK, DOUBLE_CLICK, RIGHT_CLICK, DRAG, SCROLL) need a selector: \
a \"text\" selector with the element's visible label plus a \"coordinates\" fallback with the recorded x,y.
2. Keyboard actions (TYPE_TEXT, PRESS_KEY, KEY_COMBINATION) use \"selector\": null.
3. DRAG steps put the drop position in parameters as \"end_x\" and \"end_y\".
4. Key names are plain: \"enter\", \"tab\", \"ctrl\". Never write \"Key.enter\".
5. Merge consecutive typing into one TYPE_TEXT step with the full text.
6. Use the element_name from the event data whenever it is present.";

/// @ai:intent Render the generation prompt for one recorded session
/// @ai:effects pure
pub fn build_generation_prompt(timeline: &SessionTimeline) -> serde_json::Result<String> {
    let session_json = serde_json::to_string_pretty(timeline)?;

    Ok(format!(
        "Analyze this user session recording and generate a structured workflow definition.\n\n\
         SESSION DATA:\n{}\n\n\
         Based on the event log, create a JSON workflow definition that can replay these actions.\n\n\
         Output ONLY valid JSON matching this schema:\n{}\n\n\
         {}\n\n\
         Generate the workflow JSON:",
        session_json, WORKFLOW_SCHEMA, RULES
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RecordedSession;
    use serde_json::json;

    #[test]
    fn test_prompt_embeds_session_and_schema() {
        let session: RecordedSession = serde_json::from_value(json!({
            "metadata": { "startTimeSeconds": 42 },
            "actions": [
                { "command": "CLICK", "timestamp": "2024-11-02T17:56:47Z",
                  "element": { "name": "Search" }, "parameters": { "x": 1, "y": 2 } }
            ]
        }))
        .unwrap();

        let prompt = build_generation_prompt(&session.to_timeline()).unwrap();

        assert!(prompt.contains("SESSION DATA:"));
        assert!(prompt.contains("session-42"));
        assert!(prompt.contains("\"element_name\": \"Search\""));
        assert!(prompt.contains("\"steps\""));
        assert!(prompt.ends_with("Generate the workflow JSON:"));
    }
}
