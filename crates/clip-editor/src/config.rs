use std::time::Duration;

use hypr_transcript::TimeOffset;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Symmetric shrink applied to every resolved range.
    pub time_offset: TimeOffset,
    /// How long a seek is given to land before playback starts.
    pub seek_settle_ms: u64,
    pub autosave_debounce_ms: u64,
    /// How long rejected time-field input stays visible before reverting.
    pub field_recovery_ms: u64,
    pub title_max_chars: usize,
    /// Seed the initial clip with the task's translation when it has one.
    pub prefer_translation: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            time_offset: TimeOffset::ZERO,
            seek_settle_ms: 200,
            autosave_debounce_ms: 500,
            field_recovery_ms: 1000,
            title_max_chars: 20,
            prefer_translation: false,
        }
    }
}

impl EditorConfig {
    /// Overlay `value` onto the defaults, key by key.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let defaults = serde_json::to_value(Self::default())?;
        let merged = merge(defaults, value)?;
        let config: Self =
            serde_json::from_value(merged).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.title_max_chars == 0 {
            return Err(Error::InvalidConfig(
                "titleMaxChars must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn seek_settle(&self) -> Duration {
        Duration::from_millis(self.seek_settle_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn field_recovery(&self) -> Duration {
        Duration::from_millis(self.field_recovery_ms)
    }
}

fn merge(defaults: serde_json::Value, incoming: serde_json::Value) -> Result<serde_json::Value> {
    match (defaults, incoming) {
        (serde_json::Value::Object(mut map), serde_json::Value::Object(incoming)) => {
            for (key, value) in incoming {
                map.insert(key, value);
            }
            Ok(serde_json::Value::Object(map))
        }
        (defaults, serde_json::Value::Null) => Ok(defaults),
        (_, other) => Err(Error::InvalidConfig(format!(
            "expected an object, got {other}"
        ))),
    }
}
