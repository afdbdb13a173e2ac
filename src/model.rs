use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::normalize::normalize;

/// Server-side identifier of an activity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ActivityId(pub i64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ActivityId {
    fn from(value: i64) -> Self {
        ActivityId(value)
    }
}

/// Displayed value of a server-sourced boolean (liked / attended).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FlagState {
    /// No detail fetch has succeeded yet.
    #[default]
    Unknown,
    Off,
    On,
}

impl FlagState {
    /// `Unknown` counts as off.
    pub fn is_on(&self) -> bool {
        matches!(self, FlagState::On)
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            FlagState::On
        } else {
            FlagState::Off
        }
    }

    /// Only the number 1 means set. Booleans, strings and anything else
    /// read as off instead of failing the whole detail.
    pub fn from_wire(value: Option<&Value>) -> Self {
        let set = match value {
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            _ => false,
        };
        FlagState::from_bool(set)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagState::Unknown => "unknown",
            FlagState::Off => "off",
            FlagState::On => "on",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    pub title: Option<String>,
    /// Raw body; may contain literal `\n` sequences.
    pub content: Option<String>,
    pub link: Option<String>,
    pub liked: FlagState,
    pub attended: FlagState,
}

impl Activity {
    pub fn from_detail(id: ActivityId, detail: ActivityDetailResp) -> Self {
        Self {
            id,
            title: detail.title,
            content: detail.content,
            link: detail.link,
            liked: FlagState::from_wire(detail.is_liked.as_ref()),
            attended: FlagState::from_wire(detail.participated.as_ref()),
        }
    }

    /// Body ready for display.
    pub fn formatted_content(&self) -> String {
        normalize(self.content.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationEntry {
    #[serde(rename = "external_act_id", alias = "id", alias = "school_act_id")]
    pub id: ActivityId,
    #[serde(default)]
    pub title: String,
}

/// Wire shape of `GET …/id?id=`. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetailResp {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub is_liked: Option<Value>,
    #[serde(default)]
    pub participated: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_flags_follow_wire_integers() {
        let detail: ActivityDetailResp = serde_json::from_str(
            r#"{"title":"Hackathon","content":"day 1\\nday 2","link":"https://x","isLiked":1,"participated":0}"#,
        )
        .unwrap();
        let activity = Activity::from_detail(ActivityId(7), detail);
        assert_eq!(activity.liked, FlagState::On);
        assert_eq!(activity.attended, FlagState::Off);
        assert_eq!(activity.formatted_content(), "day 1\nday 2");
    }

    #[test]
    fn missing_or_odd_flags_are_off() {
        let detail: ActivityDetailResp =
            serde_json::from_str(r#"{"title":"t","isLiked":2,"extra":true}"#).unwrap();
        let activity = Activity::from_detail(ActivityId(1), detail);
        assert_eq!(activity.liked, FlagState::Off);
        assert_eq!(activity.attended, FlagState::Off);
        assert_eq!(activity.formatted_content(), "");
    }

    #[test]
    fn non_integer_flags_still_load_the_activity() {
        let detail: ActivityDetailResp = serde_json::from_str(
            r#"{"title":"t","content":"x","isLiked":true,"participated":"1"}"#,
        )
        .unwrap();
        let activity = Activity::from_detail(ActivityId(3), detail);
        assert_eq!(activity.title.as_deref(), Some("t"));
        assert_eq!(activity.liked, FlagState::Off);
        assert_eq!(activity.attended, FlagState::Off);

        let detail: ActivityDetailResp =
            serde_json::from_str(r#"{"isLiked":1.0,"participated":null}"#).unwrap();
        let activity = Activity::from_detail(ActivityId(3), detail);
        assert_eq!(activity.liked, FlagState::On);
        assert_eq!(activity.attended, FlagState::Off);
    }

    #[test]
    fn recommendation_accepts_id_aliases() {
        let list: Vec<RecommendationEntry> = serde_json::from_str(
            r#"[{"external_act_id":42,"title":"A"},{"id":5,"title":"B"},{"school_act_id":9}]"#,
        )
        .unwrap();
        assert_eq!(list[0].id, ActivityId(42));
        assert_eq!(list[1].id, ActivityId(5));
        assert_eq!(list[2].id, ActivityId(9));
        assert_eq!(list[2].title, "");
    }

    #[test]
    fn unknown_flag_is_not_on() {
        assert!(!FlagState::Unknown.is_on());
        assert!(FlagState::On.is_on());
    }
}
