// Media URL discovery for exercise groups.

use std::collections::BTreeSet;

use crate::api::models::ExerciseGroup;

/// Single-URL media fields of a variant.
const VARIANT_MEDIA_FIELDS: &[&str] = &[
    "videoPath",
    "leftVideo",
    "rightVideo",
    "endVideo",
    "actionNameVoice",
    "completionTimeVoice",
    "completionNumberVoice",
    "goVoice",
    "restConfigVoice",
    "guideVoice1",
    "guideVoice2",
    "guideVoice3",
    "guideVoice4",
    "guideVoice5",
    "guideVoice6",
];

/// Every media URL an exercise page or workout playback may load.
pub fn exercise_media_urls(group: &ExerciseGroup) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    let mut add = |url: &str| {
        let url = url.trim();
        if !url.is_empty() {
            urls.insert(url.to_string());
        }
    };

    if let Some(img) = group.img.as_deref() {
        add(img);
    }

    for variant in &group.action_library_list {
        for field in VARIANT_MEDIA_FIELDS {
            if let Some(url) = variant.str_field(field) {
                add(url);
            }
        }

        // startVideo is a comma-separated list.
        if let Some(list) = variant.str_field("startVideo") {
            list.split(',').for_each(&mut add);
        }

        if let Some(avatar) = variant.coach.as_ref().and_then(|c| c.avatar.as_deref()) {
            add(avatar);
        }
    }

    for step in group.steps() {
        if let Some(img) = step.img.as_deref() {
            add(img);
        }
    }

    urls
}
