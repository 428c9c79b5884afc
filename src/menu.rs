use ratatui::layout::Rect;
use ratatui::widgets::ListState;

use crate::persona::{ChatRoute, Persona};

/// Persona picker shown after the launcher is activated.
pub struct Menu {
    pub personas: Vec<Persona>,
    pub state: ListState,
    // Button areas for mouse hit-testing (updated during render)
    pub button_areas: Vec<Rect>,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        let mut state = ListState::default();
        state.select(Some(0));
        Self {
            personas: Persona::all(),
            state,
            button_areas: Vec::new(),
        }
    }

    pub fn next(&mut self) {
        let len = self.personas.len();
        if len > 0 {
            let i = self.state.selected().unwrap_or(0);
            self.state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn previous(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some(i.saturating_sub(1)));
    }

    pub fn select(&mut self, index: usize) {
        if index < self.personas.len() {
            self.state.select(Some(index));
        }
    }

    pub fn selected_persona(&self) -> Option<Persona> {
        self.state.selected().and_then(|i| self.personas.get(i).copied())
    }

    /// Route for the chat screen of the highlighted persona.
    pub fn choose(&self) -> Option<ChatRoute> {
        self.selected_persona().map(|p| p.route())
    }

    pub fn hit_test(&self, col: u16, row: u16) -> Option<usize> {
        self.button_areas.iter().position(|r| {
            col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
        })
    }
}
