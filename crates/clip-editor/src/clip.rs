use hypr_transcript::TimeRange;

/// A user-defined sub-range of the source video with its text.
///
/// Invariant: `end_time >= start_time`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub title: String,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl Clip {
    pub fn field(&self, field: ClipField) -> f64 {
        match field {
            ClipField::Start => self.start_time,
            ClipField::End => self.end_time,
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClipField {
    Start,
    End,
}

/// Which clip boundary locate mode is retargeting. All `None` means idle.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct LocateTarget {
    pub clip_id: Option<String>,
    pub field: Option<ClipField>,
    pub clip_index: Option<usize>,
}

impl LocateTarget {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.clip_id.is_some() && self.field.is_some()
    }
}

/// First `max_chars` characters of the trimmed text, with `...` appended
/// when truncated.
pub fn derive_title(text: &str, max_chars: usize) -> String {
    let mut chars = text.trim().chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_title_truncates_by_chars() {
        assert_eq!(derive_title("short", 20), "short");
        assert_eq!(
            derive_title("the quick brown fox jumps over", 20),
            "the quick brown fox ..."
        );
        assert_eq!(derive_title("  padded  ", 20), "padded");
        assert_eq!(derive_title("一二三四五六", 3), "一二三...");
    }

    #[test]
    fn clip_field_names() {
        assert_eq!(ClipField::Start.to_string(), "start");
        assert_eq!("end".parse::<ClipField>().unwrap(), ClipField::End);
        assert_eq!(serde_json::to_string(&ClipField::End).unwrap(), "\"end\"");
    }

    #[test]
    fn clip_serializes_camel_case_without_empty_folder() {
        let clip = Clip {
            id: "a".into(),
            title: "t".into(),
            text: "x".into(),
            start_time: 1.0,
            end_time: 2.0,
            is_default: false,
            folder: None,
        };
        assert_eq!(
            serde_json::to_value(&clip).unwrap(),
            serde_json::json!({
                "id": "a",
                "title": "t",
                "text": "x",
                "startTime": 1.0,
                "endTime": 2.0,
                "isDefault": false
            })
        );
    }
}
