// Editor-side workout structure, as posted by the create/edit page.

use serde::{Deserialize, Serialize};

use crate::api::de;

/// Preset id meaning "custom absolute weight" rather than an RM level.
pub const CUSTOM_PRESET_ID: i64 = -1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDraft {
    /// Template id when editing an existing workout.
    #[serde(default, deserialize_with = "de::opt_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDraft {
    #[serde(rename = "groupId", deserialize_with = "de::i64_or_zero")]
    pub group_id: i64,
    /// Chosen variant; free text from the form, only honoured when numeric.
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub variant_id: String,
    #[serde(default = "custom_preset", deserialize_with = "preset_or_custom")]
    pub preset_id: i64,
    #[serde(default)]
    pub sets: Vec<SetDraft>,
}

impl ExerciseDraft {
    pub fn is_custom(&self) -> bool {
        self.preset_id == CUSTOM_PRESET_ID
    }

    /// The explicit variant id, if the form sent a plain number.
    pub fn explicit_variant_id(&self) -> Option<i64> {
        let raw = self.variant_id.trim();
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().filter(|id| *id != 0)
    }
}

/// One encoded set entry. Unilateral exercises carry one entry per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDraft {
    #[serde(default, deserialize_with = "de::i64_or_zero")]
    pub reps: i64,
    /// Kilograms for custom exercises, the RM level for presets.
    #[serde(default, deserialize_with = "weight")]
    pub weight: f64,
    #[serde(default = "default_mode", deserialize_with = "mode")]
    pub mode: i64,
    #[serde(default = "default_rest", deserialize_with = "rest")]
    pub rest: i64,
    #[serde(default)]
    pub unit: SetUnit,
}

impl Default for SetDraft {
    fn default() -> Self {
        Self {
            reps: 0,
            weight: 0.0,
            mode: default_mode(),
            rest: default_rest(),
            unit: SetUnit::Reps,
        }
    }
}

/// What `reps` counts: repetitions or seconds under tension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetUnit {
    #[default]
    Reps,
    Sec,
}

impl SetUnit {
    pub fn is_timed(self) -> bool {
        self == SetUnit::Sec
    }
}

impl<'de> Deserialize<'de> for SetUnit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Only "sec" switches to timed sets; anything else counts reps.
        let raw = de::string_or_number(deserializer)?;
        if raw.trim().eq_ignore_ascii_case("sec") {
            Ok(SetUnit::Sec)
        } else {
            Ok(SetUnit::Reps)
        }
    }
}

fn custom_preset() -> i64 {
    CUSTOM_PRESET_ID
}

fn default_mode() -> i64 {
    1
}

fn default_rest() -> i64 {
    60
}

fn preset_or_custom<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    de::opt_i64(deserializer).map(|v| v.unwrap_or(CUSTOM_PRESET_ID))
}

fn weight<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    de::opt_f64(deserializer).map(|v| v.unwrap_or(0.0))
}

fn mode<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    de::opt_i64(deserializer).map(|v| v.unwrap_or_else(default_mode))
}

fn rest<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    de::opt_i64(deserializer).map(|v| v.unwrap_or_else(default_rest))
}
