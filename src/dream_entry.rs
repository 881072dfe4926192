use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Calm,
    Happy,
    Anxious,
    Scary,
}

impl Mood {
    pub fn next(self) -> Self {
        match self {
            Mood::Calm => Mood::Happy,
            Mood::Happy => Mood::Anxious,
            Mood::Anxious => Mood::Scary,
            Mood::Scary => Mood::Calm,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Mood::Calm => Mood::Scary,
            Mood::Happy => Mood::Calm,
            Mood::Anxious => Mood::Happy,
            Mood::Scary => Mood::Anxious,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Calm => "Calm",
            Mood::Happy => "Happy",
            Mood::Anxious => "Anxious",
            Mood::Scary => "Scary",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_lucid: bool,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default = "default_intensity", deserialize_with = "deserialize_intensity")]
    pub intensity: u8,
}

fn default_intensity() -> u8 {
    5
}

/// Accepts any integer and clamps it into the intensity scale.
fn deserialize_intensity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(i64::from(MIN_INTENSITY), i64::from(MAX_INTENSITY)) as u8)
}

impl DreamEntry {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        date: NaiveDate,
        mood: Mood,
        intensity: u8,
    ) -> Self {
        DreamEntry {
            id: String::new(),
            title: title.into(),
            content: content.into(),
            date,
            tags: Vec::new(),
            is_lucid: false,
            mood,
            intensity: clamp_intensity(intensity),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            push_tag(&mut self.tags, tag.as_ref());
        }
        self
    }

    pub fn lucid(mut self, is_lucid: bool) -> Self {
        self.is_lucid = is_lucid;
        self
    }

    /// Filled stars out of five.
    pub fn stars(&self) -> usize {
        usize::from(self.intensity / 2).min(5)
    }

    pub fn has_required_text(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    /// Case-insensitive substring match over title, content and tags.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// Rewrites tags into lowercase, trimmed, deduplicated form.
    pub fn normalize_tags(&mut self) {
        let raw = std::mem::take(&mut self.tags);
        for tag in raw {
            push_tag(&mut self.tags, &tag);
        }
    }
}

pub fn clamp_intensity(value: u8) -> u8 {
    value.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Appends `raw` unless it is blank or already present. Returns whether it was added.
pub fn push_tag(tags: &mut Vec<String>, raw: &str) -> bool {
    match normalize_tag(raw) {
        Some(tag) if !tags.contains(&tag) => {
            tags.push(tag);
            true
        }
        _ => false,
    }
}
