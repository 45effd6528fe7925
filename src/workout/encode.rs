// Workout → vendor template payload: one parallel CSV list per set attribute.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use super::model::{ExerciseDraft, WorkoutDraft};
use crate::config::{DEVICE_TYPE, POUNDS_PER_KILOGRAM, PRESET_PLACEHOLDER_WEIGHT};

/// Server-side facts the encoder needs about the exercise groups in a draft.
#[derive(Debug, Clone, Default)]
pub struct ExerciseFacts {
    default_variants: HashMap<i64, i64>,
    unilateral: HashSet<i64>,
}

impl ExerciseFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_variant(mut self, group_id: i64, variant_id: i64) -> Self {
        self.set_default_variant(group_id, variant_id);
        self
    }

    pub fn with_unilateral(mut self, group_id: i64) -> Self {
        self.set_unilateral(group_id, true);
        self
    }

    pub fn set_default_variant(&mut self, group_id: i64, variant_id: i64) {
        self.default_variants.insert(group_id, variant_id);
    }

    pub fn set_unilateral(&mut self, group_id: i64, unilateral: bool) {
        if unilateral {
            self.unilateral.insert(group_id);
        } else {
            self.unilateral.remove(&group_id);
        }
    }

    pub fn is_unilateral(&self, group_id: i64) -> bool {
        self.unilateral.contains(&group_id)
    }

    /// Explicit numeric variant from the draft, else the group's first variant.
    pub fn resolve_variant(&self, exercise: &ExerciseDraft) -> Option<i64> {
        exercise
            .explicit_variant_id()
            .or_else(|| self.default_variants.get(&exercise.group_id).copied())
    }
}

/// Body of `POST /api/app/v2/customTrainingTemplate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub action_library_list: Vec<EncodedAction>,
    pub total_capacity: f64,
    pub device_type: u8,
    pub bg_color: u8,
}

/// One exercise in the vendor encoding. Every CSV field has one entry per set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedAction {
    pub group_id: i64,
    pub action_library_id: i64,
    pub template_preset_id: i64,
    pub sets_and_reps: String,
    pub break_time: String,
    pub break_time2: String,
    pub sport_mode: String,
    pub left_right: String,
    pub select_completion_method: String,
    pub completion_method: String,
    pub count_type: String,
    pub weights: String,
    pub counterweight2: String,
    pub counterweight: String,
    pub level: String,
    pub capacity: f64,
}

/// Encode a whole draft. Exercises without a resolvable variant are dropped.
pub fn encode_workout(draft: &WorkoutDraft, facts: &ExerciseFacts) -> TemplatePayload {
    let mut actions = Vec::with_capacity(draft.exercises.len());
    let mut total_capacity = 0.0;

    for exercise in &draft.exercises {
        let Some(variant_id) = facts.resolve_variant(exercise) else {
            warn!(
                "skipping exercise group={} without a resolvable variant",
                exercise.group_id
            );
            continue;
        };

        let action = encode_exercise(
            exercise,
            variant_id,
            facts.is_unilateral(exercise.group_id),
        );
        total_capacity += action.capacity;
        actions.push(action);
    }

    debug!(
        "encoded workout name={:?} exercises={} total_capacity={:.1}",
        draft.name,
        actions.len(),
        total_capacity
    );

    TemplatePayload {
        id: draft.id,
        name: draft.name.clone(),
        action_library_list: actions,
        total_capacity,
        device_type: DEVICE_TYPE,
        bg_color: 0,
    }
}

/// Encode a single exercise.
///
/// Unilateral sets arrive already expanded (one entry per side) and are
/// labelled left (`1`) on even and right (`2`) on odd positions. Custom
/// exercises send converted weights; presets send a placeholder weight per
/// set and carry the RM level in both counterweight fields.
pub fn encode_exercise(exercise: &ExerciseDraft, variant_id: i64, unilateral: bool) -> EncodedAction {
    let set_count = exercise.sets.len();
    let mut reps = Vec::with_capacity(set_count);
    let mut rests = Vec::with_capacity(set_count);
    let mut modes = Vec::with_capacity(set_count);
    let mut sides = Vec::with_capacity(set_count);
    let mut levels = Vec::with_capacity(set_count);
    let mut selections = Vec::with_capacity(set_count);
    let mut methods = Vec::with_capacity(set_count);
    let mut count_types = Vec::with_capacity(set_count);
    let mut weights = Vec::with_capacity(set_count);
    let mut counters = Vec::with_capacity(set_count);
    let mut capacity = 0.0;

    for (i, set) in exercise.sets.iter().enumerate() {
        sides.push(match (unilateral, i % 2) {
            (false, _) => "0",
            (true, 0) => "1",
            (true, _) => "2",
        });

        reps.push(set.reps.to_string());
        rests.push(set.rest.to_string());
        modes.push(set.mode.to_string());
        levels.push("0");

        let method = if set.unit.is_timed() { "2" } else { "1" };
        methods.push(method);
        count_types.push(method);
        selections.push("1");

        if exercise.is_custom() {
            let api_weight = set.weight * POUNDS_PER_KILOGRAM;
            weights.push(format!("{api_weight:.1}"));
            capacity += set.reps as f64 * api_weight;
        } else {
            weights.push(PRESET_PLACEHOLDER_WEIGHT.to_string());
            counters.push((set.weight as i64).to_string());
            capacity += set.reps as f64 * set.weight * POUNDS_PER_KILOGRAM;
        }
    }

    let counter = if exercise.is_custom() {
        String::new()
    } else {
        counters.join(",")
    };
    let rest = rests.join(",");

    EncodedAction {
        group_id: exercise.group_id,
        action_library_id: variant_id,
        template_preset_id: exercise.preset_id,
        sets_and_reps: reps.join(","),
        break_time: rest.clone(),
        break_time2: rest,
        sport_mode: modes.join(","),
        left_right: sides.join(","),
        select_completion_method: selections.join(","),
        completion_method: methods.join(","),
        count_type: count_types.join(","),
        weights: weights.join(","),
        counterweight2: counter.clone(),
        counterweight: counter,
        level: levels.join(","),
        capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::model::{SetDraft, SetUnit, CUSTOM_PRESET_ID};

    fn set(reps: i64, weight: f64, mode: i64, rest: i64) -> SetDraft {
        SetDraft { reps, weight, mode, rest, unit: SetUnit::Reps }
    }

    fn exercise(group_id: i64, preset_id: i64, sets: Vec<SetDraft>) -> ExerciseDraft {
        ExerciseDraft {
            group_id,
            variant_id: String::new(),
            preset_id,
            sets,
        }
    }

    #[test]
    fn test_custom_exercise_fields() {
        let ex = exercise(
            12,
            CUSTOM_PRESET_ID,
            vec![set(10, 12.0, 1, 60), set(8, 14.0, 2, 90), set(12, 10.0, 3, 45)],
        );
        let action = encode_exercise(&ex, 1201, false);

        assert_eq!(action.group_id, 12);
        assert_eq!(action.action_library_id, 1201);
        assert_eq!(action.template_preset_id, -1);
        assert_eq!(action.sets_and_reps, "10,8,12");
        assert_eq!(action.break_time, "60,90,45");
        assert_eq!(action.break_time2, "60,90,45");
        assert_eq!(action.sport_mode, "1,2,3");
        assert_eq!(action.left_right, "0,0,0");
        assert_eq!(action.level, "0,0,0");
        assert_eq!(action.select_completion_method, "1,1,1");
        assert_eq!(action.completion_method, "1,1,1");
        assert_eq!(action.count_type, "1,1,1");
        assert_eq!(action.weights, "26.4,30.8,22.0");
        assert_eq!(action.counterweight, "");
        assert_eq!(action.counterweight2, "");

        let expected = 10.0 * 12.0 * 2.2 + 8.0 * 14.0 * 2.2 + 12.0 * 10.0 * 2.2;
        assert!((action.capacity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_preset_exercise_fields() {
        let ex = exercise(13, 3, vec![set(15, 8.0, 1, 30), set(12, 9.7, 2, 60)]);
        let action = encode_exercise(&ex, 1301, false);

        assert_eq!(action.template_preset_id, 3);
        assert_eq!(action.weights, "3.5,3.5");
        assert_eq!(action.counterweight2, "8,9");
        assert_eq!(action.counterweight, "8,9");

        let expected = 15.0 * 8.0 * 2.2 + 12.0 * 9.7 * 2.2;
        assert!((action.capacity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unilateral_alternates_sides() {
        let ex = exercise(
            20,
            CUSTOM_PRESET_ID,
            vec![
                set(10, 6.0, 1, 45),
                set(10, 6.0, 1, 45),
                set(8, 7.0, 2, 60),
                set(8, 7.0, 2, 60),
            ],
        );
        let action = encode_exercise(&ex, 2001, true);
        assert_eq!(action.left_right, "1,2,1,2");
        assert_eq!(action.sets_and_reps, "10,10,8,8");
    }

    #[test]
    fn test_timed_sets_switch_completion_method() {
        let mut timed = set(30, 5.0, 1, 60);
        timed.unit = SetUnit::Sec;
        let ex = exercise(1, CUSTOM_PRESET_ID, vec![timed, set(10, 5.0, 1, 60)]);

        let action = encode_exercise(&ex, 101, false);
        assert_eq!(action.completion_method, "2,1");
        assert_eq!(action.count_type, "2,1");
        assert_eq!(action.select_completion_method, "1,1");
    }

    #[test]
    fn test_all_csv_fields_have_one_entry_per_set() {
        let ex = exercise(4, 2, vec![set(5, 1.0, 1, 10); 5]);
        let action = encode_exercise(&ex, 401, true);
        for field in [
            &action.sets_and_reps,
            &action.break_time,
            &action.break_time2,
            &action.sport_mode,
            &action.left_right,
            &action.select_completion_method,
            &action.completion_method,
            &action.count_type,
            &action.weights,
            &action.counterweight2,
            &action.level,
        ] {
            assert_eq!(field.split(',').count(), 5, "field {field:?}");
        }
    }

    #[test]
    fn test_workout_resolves_variants_and_skips_unknown() {
        let mut explicit = exercise(1, CUSTOM_PRESET_ID, vec![set(10, 10.0, 1, 60)]);
        explicit.variant_id = "555".to_string();
        let fallback = exercise(2, 4, vec![set(8, 6.0, 1, 60)]);
        let unknown = exercise(3, CUSTOM_PRESET_ID, vec![set(8, 6.0, 1, 60)]);

        let draft = WorkoutDraft {
            id: Some(99),
            name: "Legs".to_string(),
            exercises: vec![explicit, fallback, unknown],
        };
        let facts = ExerciseFacts::new()
            .with_default_variant(1, 111)
            .with_default_variant(2, 222)
            .with_unilateral(2);

        let payload = encode_workout(&draft, &facts);

        assert_eq!(payload.id, Some(99));
        assert_eq!(payload.device_type, 1);
        assert_eq!(payload.bg_color, 0);
        assert_eq!(payload.action_library_list.len(), 2);
        assert_eq!(payload.action_library_list[0].action_library_id, 555);
        assert_eq!(payload.action_library_list[1].action_library_id, 222);
        assert_eq!(payload.action_library_list[1].left_right, "1");

        let expected = 10.0 * 22.0 + 8.0 * 6.0 * 2.2;
        assert!((payload.total_capacity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_payload_json_shape() {
        let draft = WorkoutDraft {
            id: None,
            name: "A".to_string(),
            exercises: vec![exercise(1, CUSTOM_PRESET_ID, vec![set(10, 10.0, 1, 60)])],
        };
        let payload = encode_workout(&draft, &ExerciseFacts::new().with_default_variant(1, 11));
        let json = serde_json::to_value(&payload).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["deviceType"], 1);
        assert_eq!(json["bgColor"], 0);
        let action = &json["actionLibraryList"][0];
        assert_eq!(action["groupId"], 1);
        assert_eq!(action["actionLibraryId"], 11);
        assert_eq!(action["templatePresetId"], -1);
        assert_eq!(action["setsAndReps"], "10");
        assert_eq!(action["breakTime2"], "60");
        assert_eq!(action["counterweight2"], "");
        assert_eq!(action["weights"], "22.0");
    }
}
