use crate::dashboard::DashboardState;
use crate::model::SimulationForm;
use std::time::Duration;

pub const TAB_SIMULATE: usize = 0;
pub const TAB_RESULTS: usize = 1;
pub const TAB_HISTORY: usize = 2;
pub const TAB_HELP: usize = 3;
pub const TAB_COUNT: usize = 4;

pub const FORM_LABELS: [&str; 4] = ["Crew", "Days", "Profile", "BioAI"];

pub struct UiState {
    pub tab: usize,
    pub form: SimulationForm,
    pub selected_field: usize,
    pub dashboard: DashboardState,
    pub info: String,
    pub history_scroll: usize,
}

impl UiState {
    pub fn new(form: SimulationForm, progress_total: Duration) -> Self {
        Self {
            tab: TAB_SIMULATE,
            form,
            selected_field: 0,
            dashboard: DashboardState::new(progress_total),
            info: String::new(),
            history_scroll: 0,
        }
    }

    pub fn field_value(&self, idx: usize) -> &str {
        match idx {
            0 => &self.form.crew,
            1 => &self.form.days,
            2 => &self.form.profile,
            _ => &self.form.bioai,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.selected_field {
            0 => &mut self.form.crew,
            1 => &mut self.form.days,
            2 => &mut self.form.profile,
            _ => &mut self.form.bioai,
        }
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % FORM_LABELS.len();
    }

    pub fn prev_field(&mut self) {
        self.selected_field = (self.selected_field + FORM_LABELS.len() - 1) % FORM_LABELS.len();
    }

    pub fn type_char(&mut self, c: char) {
        self.field_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.field_mut().pop();
    }

    pub fn history_len(&self) -> usize {
        match &self.dashboard.history {
            crate::dashboard::HistoryPanel::Loaded(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn scroll_history(&mut self, down: bool) {
        if down {
            if self.history_scroll + 1 < self.history_len() {
                self.history_scroll += 1;
            }
        } else {
            self.history_scroll = self.history_scroll.saturating_sub(1);
        }
    }
}
