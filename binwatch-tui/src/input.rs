use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `service.collect`(...) for the selected source and typed threshold
    Collect,
    /// Write the last report to the export path
    ExportReport,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::SourceSelect => match key.code {
            Up | Char('k') => {
                if app.source_list_index > 0 {
                    app.source_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.source_list_index + 1 < app.sources.len() {
                    app.source_list_index += 1;
                }
            }
            Enter | Char(' ') => {
                app.select_current_source();
            }
            _ => {}
        },

        Screen::ThresholdInput => match key.code {
            Char(character) if character.is_ascii_digit() || character == '.' => {
                app.threshold_input.push(character);
            }
            Backspace => {
                app.threshold_input.pop();
            }
            Enter => {
                action = Action::Collect;
            }
            Left | Esc => {
                app.screen = Screen::SourceSelect;
            }
            _ => {}
        },

        Screen::ReportView => match key.code {
            Char('e') => {
                action = Action::ExportReport;
            }
            Char('r') => {
                action = Action::Collect;
            }
            Left | Esc | Char('b') => {
                app.screen = Screen::ThresholdInput;
            }
            _ => {}
        },
    }
    action
}
