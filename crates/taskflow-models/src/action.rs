//! Per-clip action records returned by the captioning stage.
//!
//! Captioning services answer with free text that is *usually* JSON, sometimes
//! wrapped in Markdown code fences and occasionally not JSON at all. Parsing
//! never fails: unparseable answers are kept verbatim as [`ActionPayload::Raw`]
//! so the task-graph stage still sees them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One atomic step observed in a clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    /// 1-based position within the clip
    pub step: u32,
    /// Short imperative description ("pick up reagent bottle")
    pub action: String,
    /// Consecutive repetitions of this step
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Step only happens under `condition`
    #[serde(default)]
    pub additional_step: bool,
    /// Condition for an additional step
    #[serde(default)]
    pub condition: Option<String>,
}

fn default_repeat() -> u32 {
    1
}

/// Either a parsed action list or the raw answer that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ActionPayload {
    Parsed(Vec<Action>),
    Raw(String),
}

/// Actions extracted from one clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipActions {
    /// Index of the clip these actions belong to
    pub clip_index: usize,
    /// Ordered actions, or the raw caption text
    pub actions: ActionPayload,
}

impl ClipActions {
    /// Whether the caption text was parsed into actions.
    pub fn is_parsed(&self) -> bool {
        matches!(self.actions, ActionPayload::Parsed(_))
    }

    /// Parsed actions, empty when the payload is raw text.
    pub fn actions(&self) -> &[Action] {
        match &self.actions {
            ActionPayload::Parsed(actions) => actions,
            ActionPayload::Raw(_) => &[],
        }
    }
}

#[derive(Deserialize)]
struct CaptionEnvelope {
    actions: Vec<Action>,
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse a caption answer for `clip_index`.
///
/// Accepts `{"actions": [...]}` (any `clip_index` in the answer is ignored in
/// favour of ours) or a bare `[...]` list.
pub fn parse_caption_response(clip_index: usize, text: &str) -> ClipActions {
    let body = strip_code_fences(text);

    let parsed = serde_json::from_str::<CaptionEnvelope>(body)
        .map(|envelope| envelope.actions)
        .or_else(|_| serde_json::from_str::<Vec<Action>>(body));

    let actions = match parsed {
        Ok(actions) => ActionPayload::Parsed(actions),
        Err(_) => ActionPayload::Raw(text.to_string()),
    };

    ClipActions {
        clip_index,
        actions,
    }
}

/// Order per-clip records by clip index for the task-graph stage.
pub fn merge_clip_actions(mut clips: Vec<ClipActions>) -> Vec<ClipActions> {
    clips.sort_by_key(|c| c.clip_index);
    clips
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = r#"{
        "clip_index": 7,
        "actions": [
            {"step": 1, "action": "pick up reagent bottle", "repeat": 1, "additional_step": false, "condition": null},
            {"step": 2, "action": "shake excess powder off scoop", "repeat": 2, "additional_step": true, "condition": "excess powder visible"}
        ]
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let clip = parse_caption_response(3, ANSWER);
        assert_eq!(clip.clip_index, 3);
        assert!(clip.is_parsed());
        assert_eq!(clip.actions().len(), 2);
        assert_eq!(clip.actions()[1].repeat, 2);
        assert_eq!(
            clip.actions()[1].condition.as_deref(),
            Some("excess powder visible")
        );
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", ANSWER);
        let clip = parse_caption_response(0, &fenced);
        assert!(clip.is_parsed());
        assert_eq!(clip.actions()[0].action, "pick up reagent bottle");
    }

    #[test]
    fn test_parse_bare_list_with_defaults() {
        let clip = parse_caption_response(1, r#"[{"step": 1, "action": "open cabinet"}]"#);
        let action = &clip.actions()[0];
        assert_eq!(action.repeat, 1);
        assert!(!action.additional_step);
        assert!(action.condition.is_none());
    }

    #[test]
    fn test_unparseable_kept_raw() {
        let clip = parse_caption_response(4, "The operator pours liquid.");
        assert!(!clip.is_parsed());
        assert!(clip.actions().is_empty());
        assert_eq!(
            clip.actions,
            ActionPayload::Raw("The operator pours liquid.".to_string())
        );
    }

    #[test]
    fn test_empty_action_list() {
        let clip = parse_caption_response(0, r#"{"clip_index": 0, "actions": []}"#);
        assert!(clip.is_parsed());
        assert!(clip.actions().is_empty());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
    }

    #[test]
    fn test_merge_orders_by_index() {
        let merged = merge_clip_actions(vec![
            parse_caption_response(2, "[]"),
            parse_caption_response(0, "[]"),
            parse_caption_response(1, "oops"),
        ]);
        let order: Vec<_> = merged.iter().map(|c| c.clip_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_raw_payload_serializes_as_string() {
        let clip = parse_caption_response(5, "not json");
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(json["actions"], "not json");
    }
}
