use crate::animation::GALAXY_CAPACITY;
use crate::composer::{Draft, Edit};
use crate::dream_entry::DreamEntry;
use crate::dream_state::DreamState;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Grid,
    Galaxy,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::List, ViewMode::Grid, ViewMode::Galaxy];

    pub fn next(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Galaxy,
            ViewMode::Galaxy => ViewMode::List,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::List => "List",
            ViewMode::Grid => "Grid",
            ViewMode::Galaxy => "Galaxy",
        }
    }
}

/// Where keystrokes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Browse,
    Search,
    Composer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FocusSearch,
    SearchInput(char),
    SearchBackspace,
    LeaveSearch,
    ClearSearch,
    SetView(ViewMode),
    CycleView,
    ToggleTheme,
    MoveCursor(isize),
    SelectAtCursor,
    CloseDetail,
    OpenComposer,
    CloseComposer,
    Compose(Edit),
    Submit,
    Quit,
}

/// Everything the screen shows, updated only through [`AppState::update`].
#[derive(Debug)]
pub struct AppState {
    pub dreams: DreamState,
    pub draft: Draft,
    pub search: String,
    pub view: ViewMode,
    pub theme: Theme,
    pub focus: Focus,
    pub cursor: usize,
    active: Option<String>,
    running: bool,
}

impl AppState {
    pub fn new(dreams: DreamState, theme: Theme) -> Self {
        AppState {
            dreams,
            draft: Draft::default(),
            search: String::new(),
            view: ViewMode::List,
            theme,
            focus: Focus::Browse,
            cursor: 0,
            active: None,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn composer_open(&self) -> bool {
        self.focus == Focus::Composer
    }

    pub fn visible_entries(&self) -> Vec<&DreamEntry> {
        self.dreams.filter_entries(&self.search)
    }

    /// The entry shown in the detail panel. Looked up in the whole journal, not
    /// only the current search results.
    pub fn active_entry(&self) -> Option<&DreamEntry> {
        self.active.as_deref().and_then(|id| self.dreams.find(id))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::FocusSearch => self.focus = Focus::Search,
            Action::SearchInput(c) => {
                self.search.push(c);
                self.clamp_cursor();
            }
            Action::SearchBackspace => {
                self.search.pop();
                self.clamp_cursor();
            }
            Action::LeaveSearch => self.focus = Focus::Browse,
            Action::ClearSearch => {
                self.search.clear();
                self.focus = Focus::Browse;
                self.clamp_cursor();
            }
            Action::SetView(view) => self.set_view(view),
            Action::CycleView => self.set_view(self.view.next()),
            Action::ToggleTheme => {
                self.theme = self.theme.toggled();
                tracing::debug!(theme = ?self.theme, "theme toggled");
            }
            Action::MoveCursor(delta) => {
                let len = self.cursor_len();
                if len > 0 {
                    let next = self.cursor as isize + delta;
                    self.cursor = next.clamp(0, len as isize - 1) as usize;
                }
            }
            Action::SelectAtCursor => {
                let id = self.visible_entries().get(self.cursor).map(|e| e.id.clone());
                if let Some(id) = id {
                    self.select(id);
                }
            }
            Action::CloseDetail => self.active = None,
            Action::OpenComposer => self.focus = Focus::Composer,
            Action::CloseComposer => self.focus = Focus::Browse,
            Action::Compose(edit) => self.draft.apply(edit),
            Action::Submit => self.submit(),
            Action::Quit => self.running = false,
        }
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            tracing::debug!(from = ?self.view, to = ?view, "view changed");
            self.view = view;
            self.clamp_cursor();
        }
    }

    fn select(&mut self, id: String) {
        if self.dreams.find(&id).is_some() {
            self.active = Some(id);
        }
    }

    fn submit(&mut self) {
        match self.draft.to_entry() {
            Some(entry) => {
                self.dreams.add_entry(entry);
                self.draft = Draft::default();
                self.focus = Focus::Browse;
                self.clamp_cursor();
            }
            None => tracing::debug!("refused to save a dream without title and content"),
        }
    }

    /// How many entries the cursor can reach. The galaxy only draws its first bubbles.
    fn cursor_len(&self) -> usize {
        let len = self.visible_entries().len();
        match self.view {
            ViewMode::Galaxy => len.min(GALAXY_CAPACITY),
            ViewMode::List | ViewMode::Grid => len,
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.cursor_len().saturating_sub(1));
    }
}
