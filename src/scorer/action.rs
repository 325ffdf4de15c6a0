//! @ai:module:intent Workflow action model parsed leniently from untrusted model output
//! @ai:module:layer domain
//! @ai:module:public_api Action, ActionKind, Selector, ParsedWorkflow, MalformedStep, parse_workflow
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Element names the recorder emits when it could not resolve the element
const PLACEHOLDER_NAMES: [&str; 4] = ["Error", "N/A", "Unknown", ""];

/// @ai:intent Whether an element name is human-readable (not a recorder placeholder)
/// @ai:effects pure
/// @ai:example ("Search") -> true
/// @ai:example ("N/A") -> false
pub fn is_readable_name(name: &str) -> bool {
    let trimmed = name.trim();
    !PLACEHOLDER_NAMES.contains(&trimmed)
}

/// @ai:intent Type of a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Click,
    RightClick,
    DoubleClick,
    Drag,
    Scroll,
    TypeText,
    PressKey,
    KeyCombination,
    Wait,
    Navigate,
}

impl ActionKind {
    /// @ai:intent Parse an action type; accepts schema names and short aliases, any case
    /// @ai:effects pure
    /// @ai:example ("press_key") -> Some(PressKey)
    /// @ai:example ("type") -> Some(TypeText)
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");

        match normalized.as_str() {
            "CLICK" => Some(ActionKind::Click),
            "RIGHT_CLICK" => Some(ActionKind::RightClick),
            "DOUBLE_CLICK" => Some(ActionKind::DoubleClick),
            "DRAG" => Some(ActionKind::Drag),
            "SCROLL" => Some(ActionKind::Scroll),
            "TYPE_TEXT" | "TYPE" => Some(ActionKind::TypeText),
            "PRESS_KEY" | "KEY" => Some(ActionKind::PressKey),
            "KEY_COMBINATION" | "HOTKEY" => Some(ActionKind::KeyCombination),
            "WAIT" => Some(ActionKind::Wait),
            "NAVIGATE" => Some(ActionKind::Navigate),
            _ => None,
        }
    }

    /// @ai:intent Convert kind to its schema name
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "CLICK",
            ActionKind::RightClick => "RIGHT_CLICK",
            ActionKind::DoubleClick => "DOUBLE_CLICK",
            ActionKind::Drag => "DRAG",
            ActionKind::Scroll => "SCROLL",
            ActionKind::TypeText => "TYPE_TEXT",
            ActionKind::PressKey => "PRESS_KEY",
            ActionKind::KeyCombination => "KEY_COMBINATION",
            ActionKind::Wait => "WAIT",
            ActionKind::Navigate => "NAVIGATE",
        }
    }

    /// @ai:intent Keyboard actions must not carry a selector
    /// @ai:effects pure
    pub fn is_keyboard(&self) -> bool {
        matches!(
            self,
            ActionKind::TypeText | ActionKind::PressKey | ActionKind::KeyCombination
        )
    }

    /// @ai:intent Pointer actions must carry a selector
    /// @ai:effects pure
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            ActionKind::Click
                | ActionKind::RightClick
                | ActionKind::DoubleClick
                | ActionKind::Drag
                | ActionKind::Scroll
        )
    }

    /// @ai:intent Pointer actions that target a nameable UI element
    /// @ai:effects pure
    pub fn targets_element(&self) -> bool {
        matches!(
            self,
            ActionKind::Click | ActionKind::RightClick | ActionKind::DoubleClick | ActionKind::Drag
        )
    }

    /// @ai:intent Actions whose key value is subject to the key format check
    /// @ai:effects pure
    pub fn carries_keys(&self) -> bool {
        matches!(self, ActionKind::PressKey | ActionKind::KeyCombination)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Target locator of a step (text label, coordinates, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub kind: Option<String>,
    pub value: Value,
}

impl Selector {
    /// @ai:intent Parse a selector field; None when absent or null
    /// @ai:effects pure
    fn from_value(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::Null => None,
            Value::Object(obj) => Some(Selector {
                kind: obj.get("type").and_then(Value::as_str).map(str::to_string),
                value: obj.get("value").cloned().unwrap_or(Value::Null),
            }),
            Value::String(s) => Some(Selector {
                kind: Some("text".to_string()),
                value: Value::String(s.clone()),
            }),
            other => Some(Selector {
                kind: None,
                value: other.clone(),
            }),
        }
    }

    /// @ai:intent Text label of the selector, if it is a text selector
    /// @ai:effects pure
    pub fn text_value(&self) -> Option<&str> {
        let is_text = self
            .kind
            .as_deref()
            .map(|k| k.eq_ignore_ascii_case("text"))
            .unwrap_or(true);

        if is_text {
            self.value.as_str()
        } else {
            None
        }
    }
}

/// @ai:intent One well-formed workflow step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Position of the step in the generated workflow
    pub index: usize,
    pub kind: ActionKind,
    pub selector: Option<Selector>,
    pub element_name: Option<String>,
    pub keys: Vec<String>,
    pub end_x: Option<f64>,
    pub end_y: Option<f64>,
    pub text: Option<String>,
    /// Field the step acts on, used to decide whether typing steps belong together
    pub target: Option<String>,
}

/// @ai:intent Why a step could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum MalformedReason {
    NotAnObject,
    MissingActionType,
    UnknownActionType(String),
}

/// @ai:intent A step skipped by the scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedStep {
    pub index: usize,
    pub reason: MalformedReason,
}

/// @ai:intent Result of interpreting a generated workflow document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedWorkflow {
    pub actions: Vec<Action>,
    pub malformed: Vec<MalformedStep>,
    /// False when the document carries no steps array at all
    pub has_steps: bool,
}

impl ParsedWorkflow {
    /// @ai:intent Total number of steps found, well-formed or not
    /// @ai:effects pure
    pub fn step_count(&self) -> usize {
        self.actions.len() + self.malformed.len()
    }
}

/// @ai:intent Interpret a workflow document: an object with "steps" or a bare array of steps
/// @ai:effects pure
pub fn parse_workflow(document: &Value) -> ParsedWorkflow {
    let steps = match document {
        Value::Array(steps) => Some(steps.as_slice()),
        Value::Object(obj) => match obj.get("steps") {
            Some(Value::Array(steps)) => Some(steps.as_slice()),
            _ => None,
        },
        _ => None,
    };

    let mut parsed = ParsedWorkflow {
        has_steps: steps.is_some(),
        ..Default::default()
    };
    let steps = steps.unwrap_or_default();

    for (index, step) in steps.iter().enumerate() {
        match parse_step(index, step) {
            Ok(action) => parsed.actions.push(action),
            Err(reason) => parsed.malformed.push(MalformedStep { index, reason }),
        }
    }

    parsed
}

/// @ai:intent Parse one step into an action
/// @ai:effects pure
fn parse_step(index: usize, step: &Value) -> Result<Action, MalformedReason> {
    let obj = step.as_object().ok_or(MalformedReason::NotAnObject)?;

    let raw_kind = obj
        .get("action")
        .or_else(|| obj.get("action_type"))
        .and_then(Value::as_str)
        .ok_or(MalformedReason::MissingActionType)?;

    let kind = ActionKind::parse(raw_kind)
        .ok_or_else(|| MalformedReason::UnknownActionType(raw_kind.to_string()))?;

    let empty = Map::new();
    let params = obj
        .get("parameters")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let selector = Selector::from_value(obj.get("selector"));

    let element_name = [
        selector.as_ref().and_then(Selector::text_value),
        string_field(params, "element_name"),
        string_field(obj, "element_name"),
    ]
    .into_iter()
    .flatten()
    .find(|name| is_readable_name(name))
    .map(str::to_string);

    let coordinate_source = selector.as_ref().and_then(|s| s.value.as_object());
    let end_x = number_field(params, "end_x")
        .or_else(|| coordinate_source.and_then(|c| number_field(c, "end_x")));
    let end_y = number_field(params, "end_y")
        .or_else(|| coordinate_source.and_then(|c| number_field(c, "end_y")));

    let target = string_field(params, "field")
        .or_else(|| string_field(params, "target"))
        .or_else(|| string_field(params, "element_name"))
        .or_else(|| selector.as_ref().and_then(Selector::text_value))
        .map(str::to_string);

    Ok(Action {
        index,
        kind,
        element_name,
        keys: collect_keys(params),
        end_x,
        end_y,
        text: string_field(params, "text").map(str::to_string),
        target,
        selector,
    })
}

/// @ai:intent Non-empty string field of an object
/// @ai:effects pure
fn string_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// @ai:intent Numeric field of an object
/// @ai:effects pure
fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

/// @ai:intent Key values from "key" or "keys"; blank entries are dropped
/// @ai:effects pure
fn collect_keys(params: &Map<String, Value>) -> Vec<String> {
    if let Some(key) = string_field(params, "key") {
        return split_combo(key);
    }

    match params.get("keys") {
        Some(Value::Array(keys)) => keys
            .iter()
            .filter_map(|k| match k {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|k| !k.trim().is_empty())
            .collect(),
        Some(Value::String(combo)) => split_combo(combo),
        _ => Vec::new(),
    }
}

/// @ai:intent Split a "ctrl+shift+t" combination; a lone "+" is the plus key
/// @ai:effects pure
fn split_combo(combo: &str) -> Vec<String> {
    let keys: Vec<String> = combo
        .split('+')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    if keys.is_empty() && !combo.trim().is_empty() {
        vec![combo.trim().to_string()]
    } else {
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kind_aliases() {
        assert_eq!(ActionKind::parse("CLICK"), Some(ActionKind::Click));
        assert_eq!(ActionKind::parse("double-click"), Some(ActionKind::DoubleClick));
        assert_eq!(ActionKind::parse("key"), Some(ActionKind::PressKey));
        assert_eq!(ActionKind::parse("hover"), None);
    }

    #[test]
    fn test_parse_workflow_object_and_array() {
        let object = json!({ "steps": [{ "action": "CLICK", "selector": "OK" }] });
        let array = json!([{ "action": "WAIT" }, { "action": "NAVIGATE" }]);

        assert_eq!(parse_workflow(&object).actions.len(), 1);
        assert_eq!(parse_workflow(&array).actions.len(), 2);
        assert!(parse_workflow(&array).has_steps);

        let stepless = parse_workflow(&json!({ "name": "no steps" }));
        assert_eq!(stepless.step_count(), 0);
        assert!(!stepless.has_steps);
        assert!(parse_workflow(&json!({ "steps": [] })).has_steps);
    }

    #[test]
    fn test_malformed_steps_are_reported() {
        let doc = json!({ "steps": [
            "CLICK",
            { "description": "missing action" },
            { "action": "HOVER" },
            { "action": "PRESS_KEY", "selector": null, "parameters": { "key": "enter" } }
        ]});

        let parsed = parse_workflow(&doc);
        assert_eq!(parsed.actions.len(), 1);
        assert_eq!(parsed.actions[0].index, 3);
        assert_eq!(
            parsed.malformed.iter().map(|m| m.reason.clone()).collect::<Vec<_>>(),
            vec![
                MalformedReason::NotAnObject,
                MalformedReason::MissingActionType,
                MalformedReason::UnknownActionType("HOVER".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_step_fields() {
        let doc = json!([{
            "action": "DRAG",
            "selector": { "type": "text", "value": "File.txt", "fallback": { "type": "coordinates" } },
            "parameters": { "end_x": 300, "end_y": 410.5 }
        }]);

        let action = &parse_workflow(&doc).actions[0];
        assert_eq!(action.element_name.as_deref(), Some("File.txt"));
        assert_eq!(action.end_x, Some(300.0));
        assert_eq!(action.end_y, Some(410.5));
    }

    #[test]
    fn test_coordinate_selector_has_no_element_name() {
        let doc = json!([{
            "action": "CLICK",
            "selector": { "type": "coordinates", "value": { "x": 1, "y": 2 } }
        }]);

        let action = &parse_workflow(&doc).actions[0];
        assert!(action.selector.is_some());
        assert_eq!(action.element_name, None);
    }

    #[test]
    fn test_collect_keys_variants() {
        let single = json!({ "key": "Enter" });
        let list = json!({ "keys": ["ctrl", "c"] });
        let combo = json!({ "keys": "ctrl+shift+t" });

        assert_eq!(collect_keys(single.as_object().unwrap()), vec!["Enter"]);
        assert_eq!(collect_keys(list.as_object().unwrap()), vec!["ctrl", "c"]);
        assert_eq!(collect_keys(combo.as_object().unwrap()).len(), 3);
    }

    #[test]
    fn test_key_combination_splits_the_same_in_either_field() {
        let single = json!({ "key": "ctrl+Key.shift" });
        let list = json!({ "keys": "ctrl+Key.shift" });
        let plus = json!({ "key": "+" });

        assert_eq!(collect_keys(single.as_object().unwrap()), vec!["ctrl", "Key.shift"]);
        assert_eq!(
            collect_keys(single.as_object().unwrap()),
            collect_keys(list.as_object().unwrap())
        );
        assert_eq!(collect_keys(plus.as_object().unwrap()), vec!["+"]);
    }

    #[test]
    fn test_placeholder_names_are_not_readable() {
        assert!(is_readable_name("Submit"));
        assert!(!is_readable_name("Unknown"));
        assert!(!is_readable_name("  "));
    }
}
