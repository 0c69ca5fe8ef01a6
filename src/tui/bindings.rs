//! Keyboard policy for the analysis form.
//!
//! Keys are resolved here into [`Action`]s instead of being matched ad hoc in the event
//! loop, so the Enter-submits rule can be tested without a terminal.

use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Trigger,
    NextField,
    PrevField,
    Insert(char),
    Backspace,
    ClearField,
    ExportJson,
    ExportCsv,
    CopyPath,
    ToggleHelp,
    Quit,
}

#[derive(Debug, Clone)]
pub struct InputBindings {
    /// Enter in any field activates the trigger instead of editing the field.
    pub enter_submits: bool,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            enter_submits: true,
        }
    }
}

impl InputBindings {
    pub fn action(&self, modifiers: KeyModifiers, code: KeyCode) -> Option<Action> {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match (ctrl, code) {
            (true, KeyCode::Char('c')) | (_, KeyCode::Esc) => Some(Action::Quit),
            (true, KeyCode::Char('s')) => Some(Action::ExportJson),
            (true, KeyCode::Char('e')) => Some(Action::ExportCsv),
            (true, KeyCode::Char('y')) => Some(Action::CopyPath),
            (true, KeyCode::Char('u')) => Some(Action::ClearField),
            (true, _) => None,
            (_, KeyCode::Enter) if self.enter_submits => Some(Action::Trigger),
            (_, KeyCode::Tab) | (_, KeyCode::Down) => Some(Action::NextField),
            (_, KeyCode::BackTab) | (_, KeyCode::Up) => Some(Action::PrevField),
            (_, KeyCode::F(1)) => Some(Action::ToggleHelp),
            (_, KeyCode::Backspace) => Some(Action::Backspace),
            (_, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::ALT) => {
                Some(Action::Insert(c))
            }
            _ => None,
        }
    }
}
