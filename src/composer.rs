use crate::dream_entry::{push_tag, DreamEntry, Mood, MAX_INTENSITY, MIN_INTENSITY};
use chrono::{Days, Local, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Title,
    Content,
    Date,
    Mood,
    Intensity,
    Tags,
    Lucid,
}

impl Field {
    const ORDER: [Field; 7] = [
        Field::Title,
        Field::Content,
        Field::Date,
        Field::Mood,
        Field::Intensity,
        Field::Tags,
        Field::Lucid,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Dream Title",
            Field::Content => "Dream Content",
            Field::Date => "Date",
            Field::Mood => "Mood",
            Field::Intensity => "Intensity",
            Field::Tags => "Tags",
            Field::Lucid => "Lucid Dream",
        }
    }

    pub fn takes_text(self) -> bool {
        matches!(self, Field::Title | Field::Content | Field::Tags)
    }
}

/// Edits a draft receives from the composer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert(char),
    Backspace,
    Newline,
    Increase,
    Decrease,
    FocusNext,
    FocusPrevious,
}

/// The in-progress entry behind the "Record New Dream" form.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
    pub mood: Mood,
    pub intensity: u8,
    pub tags: Vec<String>,
    pub is_lucid: bool,
    pub pending_tag: String,
    pub focus: Field,
}

impl Default for Draft {
    fn default() -> Self {
        Self::dated(Local::now().date_naive())
    }
}

impl Draft {
    pub fn dated(date: NaiveDate) -> Self {
        Draft {
            title: String::new(),
            content: String::new(),
            date,
            mood: Mood::Calm,
            intensity: 5,
            tags: Vec::new(),
            is_lucid: false,
            pending_tag: String::new(),
            focus: Field::Title,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    /// Moves the pending tag into the tag list. Blank and duplicate tags are ignored.
    pub fn add_tag(&mut self) -> bool {
        if push_tag(&mut self.tags, &self.pending_tag) {
            self.pending_tag.clear();
            true
        } else {
            tracing::debug!(tag = %self.pending_tag, "ignored blank or duplicate tag");
            false
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn shift_date(&mut self, days: i64) {
        let shifted = if days >= 0 {
            self.date.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(date) = shifted {
            self.date = date;
        }
    }

    pub fn step_intensity(&mut self, delta: i8) {
        let next = i16::from(self.intensity) + i16::from(delta);
        self.intensity =
            next.clamp(i16::from(MIN_INTENSITY), i16::from(MAX_INTENSITY)) as u8;
    }

    /// Builds the entry this draft describes, or `None` while title or content is blank.
    pub fn to_entry(&self) -> Option<DreamEntry> {
        if !self.can_submit() {
            return None;
        }
        Some(
            DreamEntry::new(
                self.title.clone(),
                self.content.clone(),
                self.date,
                self.mood,
                self.intensity,
            )
            .with_tags(&self.tags)
            .lucid(self.is_lucid),
        )
    }

    pub fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::FocusNext => self.focus = self.focus.next(),
            Edit::FocusPrevious => self.focus = self.focus.previous(),
            Edit::Insert(c) => match self.focus {
                Field::Title => self.title.push(c),
                Field::Content => self.content.push(c),
                Field::Tags => self.pending_tag.push(c),
                Field::Lucid if c == ' ' => self.is_lucid = !self.is_lucid,
                _ => {}
            },
            Edit::Backspace => match self.focus {
                Field::Title => {
                    self.title.pop();
                }
                Field::Content => {
                    self.content.pop();
                }
                Field::Tags => {
                    if self.pending_tag.pop().is_none() {
                        if let Some(last) = self.tags.last().cloned() {
                            self.remove_tag(&last);
                        }
                    }
                }
                _ => {}
            },
            Edit::Newline => match self.focus {
                Field::Content => self.content.push('\n'),
                Field::Tags => {
                    self.add_tag();
                }
                Field::Lucid => self.is_lucid = !self.is_lucid,
                _ => self.focus = self.focus.next(),
            },
            Edit::Increase => match self.focus {
                Field::Date => self.shift_date(1),
                Field::Mood => self.mood = self.mood.next(),
                Field::Intensity => self.step_intensity(1),
                Field::Lucid => self.is_lucid = true,
                _ => {}
            },
            Edit::Decrease => match self.focus {
                Field::Date => self.shift_date(-1),
                Field::Mood => self.mood = self.mood.previous(),
                Field::Intensity => self.step_intensity(-1),
                Field::Lucid => self.is_lucid = false,
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Draft {
        Draft::dated(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn type_into(draft: &mut Draft, field: Field, text: &str) {
        draft.focus = field;
        for c in text.chars() {
            draft.apply(Edit::Insert(c));
        }
    }

    #[test]
    fn tag_add_is_case_insensitive() {
        let mut d = draft();
        d.pending_tag = "Flying".into();
        assert!(d.add_tag());
        assert!(d.pending_tag.is_empty());
        d.pending_tag = "flying".into();
        assert!(!d.add_tag());
        assert_eq!(d.tags, vec!["flying"]);
        assert_eq!(d.pending_tag, "flying");
    }

    #[test]
    fn blank_tags_are_ignored() {
        let mut d = draft();
        d.pending_tag = "   ".into();
        assert!(!d.add_tag());
        assert!(d.tags.is_empty());
    }

    #[test]
    fn tags_field_enter_adds_and_backspace_removes_last() {
        let mut d = draft();
        type_into(&mut d, Field::Tags, "Water");
        d.apply(Edit::Newline);
        type_into(&mut d, Field::Tags, "city");
        d.apply(Edit::Newline);
        assert_eq!(d.tags, vec!["water", "city"]);

        d.apply(Edit::Backspace);
        assert_eq!(d.tags, vec!["water"]);
        d.remove_tag("water");
        assert!(d.tags.is_empty());
    }

    #[test]
    fn submit_requires_title_and_content() {
        let mut d = draft();
        assert!(!d.can_submit());
        type_into(&mut d, Field::Title, "Moon");
        assert!(d.to_entry().is_none());
        type_into(&mut d, Field::Content, "   ");
        assert!(!d.can_submit());
        d.content = "Silver tides".into();
        let entry = d.to_entry().unwrap();
        assert_eq!(entry.title, "Moon");
        assert_eq!(entry.date, d.date);
    }

    #[test]
    fn intensity_stays_in_range() {
        let mut d = draft();
        d.focus = Field::Intensity;
        for _ in 0..20 {
            d.apply(Edit::Increase);
        }
        assert_eq!(d.intensity, 10);
        for _ in 0..20 {
            d.apply(Edit::Decrease);
        }
        assert_eq!(d.intensity, 1);
    }

    #[test]
    fn date_and_mood_step() {
        let mut d = draft();
        d.focus = Field::Date;
        d.apply(Edit::Decrease);
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        d.focus = Field::Mood;
        d.apply(Edit::Decrease);
        assert_eq!(d.mood, Mood::Scary);
        d.apply(Edit::Increase);
        assert_eq!(d.mood, Mood::Calm);
    }

    #[test]
    fn lucid_toggles_with_space() {
        let mut d = draft();
        d.focus = Field::Lucid;
        d.apply(Edit::Insert(' '));
        assert!(d.is_lucid);
        d.apply(Edit::Newline);
        assert!(!d.is_lucid);
    }

    #[test]
    fn focus_wraps_around() {
        assert_eq!(Field::Lucid.next(), Field::Title);
        assert_eq!(Field::Title.previous(), Field::Lucid);
        let mut d = draft();
        d.apply(Edit::FocusPrevious);
        assert_eq!(d.focus, Field::Lucid);
    }
}
