// Workout drafts and their translation to and from the vendor's CSV encoding.

pub mod decode;
pub mod encode;
pub mod model;

pub use encode::{encode_workout, ExerciseFacts, TemplatePayload};
pub use model::{ExerciseDraft, SetDraft, SetUnit, WorkoutDraft};
