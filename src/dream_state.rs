use crate::dream_entry::{DreamEntry, Mood};
use chrono::NaiveDate;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::{fs, path::Path};
use uuid::Uuid;

/// The in-memory journal, newest first.
#[derive(Debug, Default)]
pub struct DreamState {
    entries: Vec<DreamEntry>,
}

impl DreamState {
    pub fn new() -> Self {
        DreamState {
            entries: Vec::new(),
        }
    }

    /// The three built-in entries, in the order they are shown.
    pub fn seeded() -> Self {
        let date = |m, d| NaiveDate::from_ymd_opt(2023, m, d).unwrap_or_default();
        let mut neon = DreamEntry::new(
            "Neon Cityscape Flight",
            "Soared through glowing skyscrapers that hummed with light. The air smelled like ozone and candy.",
            date(5, 15),
            Mood::Happy,
            8,
        )
        .with_tags(["flying", "city", "neon"])
        .lucid(true);
        neon.id = "1".into();

        let mut library = DreamEntry::new(
            "Infinite Library",
            "Walked through endless book corridors. Some books floated, whispering secrets.",
            date(5, 10),
            Mood::Anxious,
            6,
        )
        .with_tags(["books", "mystery"]);
        library.id = "2".into();

        let mut ocean = DreamEntry::new(
            "Celestial Jellyfish Ocean",
            "Floated in a cosmic sea with glowing star creatures forming constellations.",
            date(5, 5),
            Mood::Calm,
            9,
        )
        .with_tags(["space", "ocean"])
        .lucid(true);
        ocean.id = "3".into();

        DreamState {
            entries: vec![neon, library, ocean],
        }
    }

    /// Builds a journal from a JSON array of entries, keeping file order.
    pub fn from_seed_json(json: &str) -> Result<Self> {
        let entries: Vec<DreamEntry> =
            serde_json::from_str(json).wrap_err("Seed file is not a JSON array of entries")?;

        let mut state = DreamState::new();
        for mut entry in entries {
            if !entry.has_required_text() {
                return Err(eyre!("Seed entry {:?} has a blank title or content", entry.id));
            }
            if entry.id.trim().is_empty() {
                entry.id = state.fresh_id();
            } else if state.find(&entry.id).is_some() {
                return Err(eyre!("Seed entry id {:?} is not unique", entry.id));
            }
            entry.normalize_tags();
            state.entries.push(entry);
        }
        Ok(state)
    }

    pub fn load_seed_file(path: &Path) -> Result<Self> {
        let serialized = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read seed file {}", path.display()))?;
        let state = Self::from_seed_json(&serialized)
            .wrap_err_with(|| format!("Failed to load seed file {}", path.display()))?;
        tracing::info!(path = %path.display(), entries = state.len(), "loaded seed file");
        Ok(state)
    }

    /// Stores `entry` at the front of the journal under a fresh id and returns that id.
    pub fn add_entry(&mut self, mut entry: DreamEntry) -> String {
        entry.id = self.fresh_id();
        let id = entry.id.clone();
        tracing::info!(id = %id, title = %entry.title, "recorded dream");
        self.entries.insert(0, entry);
        id
    }

    pub fn get_entries(&self) -> &[DreamEntry] {
        &self.entries
    }

    pub fn find(&self, id: &str) -> Option<&DreamEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries whose title, content or a tag contains `query`, ignoring case.
    pub fn filter_entries(&self, query: &str) -> Vec<&DreamEntry> {
        let entries = self.get_entries().iter();
        if query.is_empty() {
            return entries.collect();
        }
        let needle = query.to_lowercase();
        entries.filter(|e| e.matches(&needle)).collect()
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.find(&id).is_none() {
                return id;
            }
        }
    }
}
