use crate::types::{TranscribedWord, TranscriptSegment};

// Wire format of the task payload produced by the transcription service.

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WireWord {
    pub start: f64,
    pub end: f64,
    pub word: String,
    #[serde(default)]
    pub probability: f64,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WireSegment {
    #[serde(default)]
    pub id: i64,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Option<Vec<WireWord>>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub file_duration: f64,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TaskPayload {
    #[serde(default)]
    pub segments: Vec<WireSegment>,
    #[serde(default)]
    pub video_info: VideoInfo,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
}

impl From<&WireWord> for TranscribedWord {
    fn from(w: &WireWord) -> Self {
        Self {
            text: w.word.clone(),
            start_time: w.start,
            end_time: w.end,
            probability: w.probability,
        }
    }
}

impl From<&WireSegment> for TranscriptSegment {
    fn from(s: &WireSegment) -> Self {
        Self {
            id: s.id,
            start_time: s.start,
            end_time: s.end,
            text: s.text.clone(),
            words: s
                .words
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(TranscribedWord::from)
                .collect(),
        }
    }
}

impl TaskPayload {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn segments(&self) -> Vec<TranscriptSegment> {
        self.segments.iter().map(TranscriptSegment::from).collect()
    }

    pub fn duration(&self) -> f64 {
        self.video_info.file_duration.max(0.0)
    }

    /// Text the character index is built on: word texts concatenated
    /// verbatim. Word tokens carry their own leading whitespace, if any.
    ///
    /// Falls back to concatenated segment texts for segment-only payloads.
    pub fn full_text(&self) -> String {
        let has_words = self
            .segments
            .iter()
            .any(|s| s.words.as_ref().is_some_and(|w| !w.is_empty()));

        if has_words {
            self.segments
                .iter()
                .flat_map(|s| s.words.as_deref().unwrap_or_default())
                .map(|w| w.word.as_str())
                .collect()
        } else {
            self.segments.iter().map(|s| s.text.as_str()).collect()
        }
    }

    /// Text for the initial clip: the translation when requested and present,
    /// otherwise the transcript.
    pub fn source_text(&self, prefer_translation: bool) -> String {
        if prefer_translation
            && let Some(translation) = self.translation.as_ref().filter(|t| !t.is_empty())
        {
            return translation.clone();
        }
        self.full_text()
    }
}
