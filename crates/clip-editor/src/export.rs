//! The clip list as the backend's clip-cutting job expects it.

use hypr_timecode::format_for_api;

use crate::clip::Clip;

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SubmissionClip {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// `HH:MM:SS.mmm`
    pub start: String,
    pub end: String,
    pub text: String,
}

pub fn build_submission(clips: &[Clip]) -> Vec<SubmissionClip> {
    clips
        .iter()
        .map(|clip| SubmissionClip {
            name: sanitize_filename(&clip.title),
            folder: clip.folder.as_deref().map(sanitize_filename),
            start: format_for_api(clip.start_time),
            end: format_for_api(clip.end_time),
            text: clip.text.clone(),
        })
        .collect()
}

/// Make a clip title usable as an output file name.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace() && !RESERVED.contains(c))
        .collect();

    if cleaned.is_empty() {
        "clip".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize() {
        insta::assert_snapshot!(sanitize_filename("Intro: part 1/2"), @"Intropart12");
        insta::assert_snapshot!(sanitize_filename("what?*\"<>|\\"), @"what");
        insta::assert_snapshot!(sanitize_filename("  \t\n "), @"clip");
        insta::assert_snapshot!(sanitize_filename("大家好..."), @"大家好...");
    }

    #[test]
    fn submission_payload() {
        let clips = vec![
            Clip {
                id: "a".into(),
                title: "Hello world...".into(),
                text: "Hello world foo".into(),
                start_time: 1.5,
                end_time: 3725.042,
                is_default: false,
                folder: Some("day 1".into()),
            },
            Clip {
                id: "b".into(),
                title: "".into(),
                text: " bar".into(),
                start_time: 0.0,
                end_time: 0.25,
                is_default: true,
                folder: None,
            },
        ];

        let json = serde_json::to_string_pretty(&build_submission(&clips)).unwrap();
        insta::assert_snapshot!(json, @r#"
        [
          {
            "name": "Helloworld...",
            "folder": "day1",
            "start": "00:00:01.500",
            "end": "01:02:05.042",
            "text": "Hello world foo"
          },
          {
            "name": "clip",
            "start": "00:00:00.000",
            "end": "00:00:00.250",
            "text": " bar"
          }
        ]
        "#);
    }
}
