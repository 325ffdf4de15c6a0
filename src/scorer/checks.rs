//! @ai:module:intent The five rule-based workflow quality checks
//! @ai:module:layer domain
//! @ai:module:public_api CheckOutcome, SessionElements, selector_accuracy, drag_parameters, element_extraction, key_format, action_grouping
//! @ai:module:stateless true

use crate::dataset::RecordedSession;
use crate::scorer::action::{Action, ActionKind};
use crate::scorer::breakdown::clamp_unit;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// @ai:intent Tally of one check over a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub satisfied: u32,
    pub applicable: u32,
    /// Actions of a relevant kind that lacked a field this check needs
    pub skipped: u32,
}

impl CheckOutcome {
    /// @ai:intent Fraction satisfied; 1.0 when nothing was applicable
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        if self.applicable == 0 {
            1.0
        } else {
            clamp_unit(f64::from(self.satisfied) / f64::from(self.applicable))
        }
    }

    fn record(&mut self, ok: bool) {
        self.applicable += 1;
        if ok {
            self.satisfied += 1;
        }
    }
}

/// @ai:intent Element names of the recorded pointer actions, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionElements {
    names: Vec<Option<String>>,
}

impl SessionElements {
    /// @ai:effects pure
    pub fn new(names: Vec<Option<String>>) -> Self {
        Self { names }
    }

    /// @ai:effects pure
    pub fn from_session(session: &RecordedSession) -> Self {
        Self::new(session.pointer_element_names())
    }

    /// @ai:intent Whether the n-th recorded pointer action had a usable name
    /// @ai:effects pure
    fn has_name(&self, position: usize) -> bool {
        matches!(self.names.get(position), Some(Some(_)))
    }
}

/// @ai:intent Keyboard steps need no selector, pointer steps need one
/// @ai:effects pure
pub fn selector_accuracy(actions: &[Action]) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();

    for action in actions {
        if action.kind.is_keyboard() {
            outcome.record(action.selector.is_none());
        } else if action.kind.is_pointer() {
            outcome.record(action.selector.is_some());
        }
    }

    outcome
}

/// @ai:intent Drag steps need numeric end coordinates
/// @ai:effects pure
pub fn drag_parameters(actions: &[Action]) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();

    for action in actions.iter().filter(|a| a.kind == ActionKind::Drag) {
        outcome.record(action.end_x.is_some() && action.end_y.is_some());
    }

    outcome
}

/// @ai:intent Pointer steps should name their element when the recording had one
/// @ai:effects pure
pub fn element_extraction(actions: &[Action], session: Option<&SessionElements>) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();

    let pointer_steps = actions.iter().filter(|a| a.kind.targets_element());

    for (position, action) in pointer_steps.enumerate() {
        let opportunity = session.map(|s| s.has_name(position)).unwrap_or(true);

        if opportunity {
            outcome.record(action.element_name.is_some());
        }
    }

    outcome
}

/// @ai:intent Key values must not carry a namespace prefix such as "Key."
/// @ai:effects pure
pub fn key_format(actions: &[Action], prefix: &Regex) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();

    for action in actions.iter().filter(|a| a.kind.carries_keys()) {
        if action.keys.is_empty() {
            outcome.skipped += 1;
            continue;
        }

        outcome.record(action.keys.iter().all(|k| !prefix.is_match(k.trim())));
    }

    outcome
}

/// @ai:intent Consecutive typing steps on one target should be a single step
/// @ai:effects pure
pub fn action_grouping(actions: &[Action]) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();
    let mut run: Vec<&Action> = Vec::new();

    for action in actions {
        let continues = is_typing_input(action)
            && run
                .last()
                .map(|prev| prev.target == action.target)
                .unwrap_or(true);

        if !continues {
            close_run(&mut run, &mut outcome);
        }

        if is_typing_input(action) {
            run.push(action);
        }
    }
    close_run(&mut run, &mut outcome);

    outcome
}

/// @ai:intent Score a finished typing run and reset it
fn close_run(run: &mut Vec<&Action>, outcome: &mut CheckOutcome) {
    let has_text = run.iter().any(|a| a.kind == ActionKind::TypeText);

    if has_text || run.len() >= 2 {
        outcome.record(run.len() == 1);
    }

    run.clear();
}

/// @ai:intent Type-text steps and single-character key presses
/// @ai:effects pure
fn is_typing_input(action: &Action) -> bool {
    match action.kind {
        ActionKind::TypeText => true,
        ActionKind::PressKey => match action.keys.as_slice() {
            [key] => {
                let mut chars = key.chars();
                let single_printable = matches!(
                    (chars.next(), chars.next()),
                    (Some(c), None) if !c.is_control()
                );
                single_printable || key.eq_ignore_ascii_case("space")
            }
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::action::parse_workflow;
    use serde_json::{json, Value};

    fn actions(steps: Value) -> Vec<Action> {
        parse_workflow(&steps).actions
    }

    fn prefix() -> Regex {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*\.").unwrap()
    }

    #[test]
    fn test_selector_accuracy_half() {
        let steps = actions(json!([
            { "action": "CLICK", "selector": null },
            { "action": "PRESS_KEY", "parameters": { "key": "Enter" } }
        ]));

        let outcome = selector_accuracy(&steps);
        assert_eq!(outcome.applicable, 2);
        assert_eq!(outcome.score(), 0.5);
    }

    #[test]
    fn test_wait_and_navigate_are_not_applicable() {
        let steps = actions(json!([{ "action": "WAIT" }, { "action": "NAVIGATE" }]));
        assert_eq!(selector_accuracy(&steps).applicable, 0);
        assert_eq!(selector_accuracy(&steps).score(), 1.0);
    }

    #[test]
    fn test_drag_parameters_in_selector_value() {
        let steps = actions(json!([
            { "action": "DRAG", "selector": { "type": "coordinates", "value": { "x": 1, "y": 1, "end_x": 9, "end_y": 9 } } },
            { "action": "DRAG", "selector": "Slider", "parameters": { "end_x": "far" } }
        ]));

        let outcome = drag_parameters(&steps);
        assert_eq!((outcome.satisfied, outcome.applicable), (1, 2));
    }

    #[test]
    fn test_element_extraction_follows_session() {
        let steps = actions(json!([
            { "action": "CLICK", "selector": "Search" },
            { "action": "CLICK", "selector": { "type": "coordinates", "value": { "x": 5, "y": 5 } } },
            { "action": "DRAG", "selector": { "type": "coordinates", "value": { "x": 5, "y": 5 } } }
        ]));
        let session = SessionElements::new(vec![
            Some("Search".to_string()),
            None,
            Some("Volume".to_string()),
        ]);

        let with_session = element_extraction(&steps, Some(&session));
        assert_eq!((with_session.satisfied, with_session.applicable), (1, 2));

        let without_session = element_extraction(&steps, None);
        assert_eq!(without_session.applicable, 3);
    }

    #[test]
    fn test_element_name_from_parameters() {
        let steps = actions(json!([
            { "action": "CLICK", "selector": { "type": "coordinates", "value": { "x": 5, "y": 5 } },
              "parameters": { "element_name": "Play" } },
            { "action": "CLICK", "selector": "N/A" }
        ]));

        let outcome = element_extraction(&steps, None);
        assert_eq!((outcome.satisfied, outcome.applicable), (1, 2));
    }

    #[test]
    fn test_key_format() {
        let steps = actions(json!([
            { "action": "PRESS_KEY", "parameters": { "key": "Enter" } },
            { "action": "PRESS_KEY", "parameters": { "key": "Key.Enter" } },
            { "action": "KEY_COMBINATION", "parameters": { "keys": ["ctrl", "Key.shift", "t"] } },
            { "action": "PRESS_KEY", "parameters": {} }
        ]));

        let outcome = key_format(&steps, &prefix());
        assert_eq!(outcome.satisfied, 1);
        assert_eq!(outcome.applicable, 3);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_any_identifier_prefix_counts() {
        let steps = actions(json!([
            { "action": "PRESS_KEY", "parameters": { "key": "Keys.Tab" } },
            { "action": "PRESS_KEY", "parameters": { "key": "." } }
        ]));

        let outcome = key_format(&steps, &prefix());
        assert_eq!((outcome.satisfied, outcome.applicable), (1, 2));
    }

    #[test]
    fn test_single_type_text_is_merged() {
        let steps = actions(json!([
            { "action": "CLICK", "selector": "Search" },
            { "action": "TYPE_TEXT", "parameters": { "text": "rick astley" } },
            { "action": "PRESS_KEY", "parameters": { "key": "Enter" } }
        ]));

        let outcome = action_grouping(&steps);
        assert_eq!((outcome.satisfied, outcome.applicable), (1, 1));
    }

    #[test]
    fn test_split_typing_is_not_merged() {
        let steps = actions(json!([
            { "action": "TYPE_TEXT", "parameters": { "text": "hello" } },
            { "action": "PRESS_KEY", "parameters": { "key": "space" } },
            { "action": "TYPE_TEXT", "parameters": { "text": "world" } },
            { "action": "PRESS_KEY", "parameters": { "key": "Enter" } },
            { "action": "PRESS_KEY", "parameters": { "key": "a" } },
            { "action": "PRESS_KEY", "parameters": { "key": "b" } }
        ]));

        let outcome = action_grouping(&steps);
        assert_eq!((outcome.satisfied, outcome.applicable), (0, 2));
    }

    #[test]
    fn test_different_targets_break_runs() {
        let steps = actions(json!([
            { "action": "TYPE_TEXT", "parameters": { "text": "alice", "field": "user" } },
            { "action": "TYPE_TEXT", "parameters": { "text": "secret", "field": "password" } }
        ]));

        let outcome = action_grouping(&steps);
        assert_eq!((outcome.satisfied, outcome.applicable), (2, 2));
    }

    #[test]
    fn test_lone_key_press_is_not_an_opportunity() {
        let steps = actions(json!([{ "action": "PRESS_KEY", "parameters": { "key": "x" } }]));
        assert_eq!(action_grouping(&steps).applicable, 0);
    }
}
