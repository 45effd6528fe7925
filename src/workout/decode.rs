// Saved template → editor drafts, the inverse of `encode` for prefilling the edit page.

use crate::api::de::parse_i64;
use crate::api::models::{TemplateAction, WorkoutTemplate};

use super::model::{ExerciseDraft, SetDraft, SetUnit, WorkoutDraft, CUSTOM_PRESET_ID};

/// Split a CSV field into integers; blank entries are dropped, `"8.0"` reads as 8.
pub fn parse_csv_ints(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(parse_i64)
        .collect()
}

pub fn parse_csv_floats(raw: &str) -> Vec<f64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

pub fn decode_template(template: &WorkoutTemplate) -> WorkoutDraft {
    WorkoutDraft {
        id: template.id,
        name: template.name.clone(),
        exercises: template
            .action_library_list
            .iter()
            .filter_map(decode_action)
            .collect(),
    }
}

/// Rebuild the per-set list of one saved exercise.
///
/// Custom weights come back from the backend as stored; preset exercises
/// report their RM level through `counterweight2`.
pub fn decode_action(action: &TemplateAction) -> Option<ExerciseDraft> {
    let group_id = action.group_id.or(action.action_library_id)?;
    let preset_id = action.template_preset_id.unwrap_or(CUSTOM_PRESET_ID);

    let reps = parse_csv_ints(&action.sets_and_reps);
    let rest_field = if action.break_time2.trim().is_empty() {
        &action.break_time
    } else {
        &action.break_time2
    };
    let rests = parse_csv_ints(rest_field);
    let modes = parse_csv_ints(&action.sport_mode);
    let methods = parse_csv_ints(&action.completion_method);
    let weights = if preset_id == CUSTOM_PRESET_ID {
        parse_csv_floats(&action.weights)
    } else {
        parse_csv_floats(&action.counterweight2)
    };

    let sets = reps
        .iter()
        .enumerate()
        .map(|(i, reps)| SetDraft {
            reps: *reps,
            weight: weights.get(i).copied().unwrap_or(0.0),
            mode: modes.get(i).copied().unwrap_or(1),
            rest: rests.get(i).copied().unwrap_or(60),
            unit: if methods.get(i) == Some(&2) {
                SetUnit::Sec
            } else {
                SetUnit::Reps
            },
        })
        .collect();

    Some(ExerciseDraft {
        group_id,
        variant_id: action
            .action_library_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        preset_id,
        sets,
    })
}
