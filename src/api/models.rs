//! Typed views of the vendor's JSON documents.
//!
//! Every model keeps the fields it does not name in a flattened `extra` map,
//! so the JSON passthrough and the templates still see the complete object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::de;

/// Standard response wrapper: `{"code": 0, "message": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "de::i64_or_zero")]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyIdentity {
    #[serde(default)]
    pub is_exist: Option<bool>,
    #[serde(default)]
    pub has_pwd: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub app_user_id: String,
}

/// One muscle-group bucket of the library overview.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPartGroup {
    #[serde(default)]
    pub action_library_group_list: Vec<ExerciseSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseSummary {
    #[serde(deserialize_with = "de::i64_or_zero")]
    pub id: i64,
}

/// An exercise group: the library entry users pick from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGroup {
    #[serde(deserialize_with = "de::i64_or_zero")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    /// Comma-separated accessory ids.
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub accessories: String,
    #[serde(
        default,
        deserialize_with = "de::opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_left_right: Option<i64>,
    #[serde(default)]
    pub action_library_list: Vec<ExerciseVariant>,
    /// JSON-encoded list of [`ExerciseStep`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExerciseGroup {
    pub fn is_unilateral(&self) -> bool {
        self.is_left_right == Some(1)
    }

    /// Id of the first variant, used when the caller did not pick one.
    pub fn default_variant_id(&self) -> Option<i64> {
        self.action_library_list.first().and_then(|v| v.id)
    }

    pub fn accessory_ids(&self) -> Vec<&str> {
        self.accessories
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Decode `showDetails`; malformed content yields no steps.
    pub fn steps(&self) -> Vec<ExerciseStep> {
        let Some(raw) = self.show_details.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Vec::new();
        };
        serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!("showDetails parse error for exercise {}: {}", self.id, e);
            Vec::new()
        })
    }
}

/// A concrete variant of an exercise group (coach, camera angle, handle...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseVariant {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach: Option<Coach>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExerciseVariant {
    /// Non-empty string field by vendor key (e.g. `videoPath`).
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coach {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStep {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub img: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Accessory {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of the user's template list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutSummary {
    #[serde(deserialize_with = "de::i64_or_zero")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A saved template as returned by `detailByCode`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub action_library_list: Vec<TemplateAction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One exercise inside a saved template, in the vendor's CSV encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAction {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub group_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub action_library_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub template_preset_id: Option<i64>,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub sets_and_reps: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub weights: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub counterweight2: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub break_time: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub break_time2: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub sport_mode: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub left_right: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub completion_method: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
