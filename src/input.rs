use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    SwitchTab(u8),
    Down,
    Up,
    PageDown,
    PageUp,
    Top,
    Bottom,
    GPrefix,
    ToggleHelp,
    ToggleDetails,
    ClearOverlay,
    Refresh,
    CycleSort,
    ReverseSort,
    NextFilterColumn,
    PrevFilterColumn,
    CycleFilterOption,
    ClearFilters,
    StartCommand,
    StartFilter,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Command | InputMode::Filter => map_input_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PageDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(c @ '1'..='9') if key.modifiers.is_empty() => {
            Some(Action::SwitchTab(c.to_digit(10).unwrap_or(1) as u8 - 1))
        }
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Left | KeyCode::BackTab => Some(Action::PrevTab),
        KeyCode::Right | KeyCode::Tab => Some(Action::NextTab),
        KeyCode::Char('g') => Some(Action::GPrefix),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Home => Some(Action::Top),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('/') => Some(Action::StartFilter),
        KeyCode::Char(':') => Some(Action::StartCommand),
        KeyCode::Char(';') if key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(Action::StartCommand)
        }
        KeyCode::Char('s') => Some(Action::CycleSort),
        KeyCode::Char('S') => Some(Action::ReverseSort),
        KeyCode::Char('c') | KeyCode::Char(']') => Some(Action::NextFilterColumn),
        KeyCode::Char('C') | KeyCode::Char('[') => Some(Action::PrevFilterColumn),
        KeyCode::Char('f') => Some(Action::CycleFilterOption),
        KeyCode::Char('x') => Some(Action::ClearFilters),
        KeyCode::Enter | KeyCode::Char('d') => Some(Action::ToggleDetails),
        KeyCode::Esc => Some(Action::ClearOverlay),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        _ => None,
    }
}

fn map_input_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::CancelInput)
        }
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Char('m') | KeyCode::Char('j')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(Action::SubmitInput)
        }
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn plain(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digits_switch_tabs() {
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('1'))),
            Some(Action::SwitchTab(0))
        );
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('3'))),
            Some(Action::SwitchTab(2))
        );
    }

    #[test]
    fn sort_keys_distinguish_case() {
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('s'))),
            Some(Action::CycleSort)
        );
        let shifted = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, shifted), Some(Action::ReverseSort));
    }

    #[test]
    fn ctrl_c_quits_in_normal_mode_and_cancels_input() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
        assert_eq!(map_key(InputMode::Filter, key), Some(Action::CancelInput));
    }

    #[test]
    fn plain_c_focuses_next_filter_column() {
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('c'))),
            Some(Action::NextFilterColumn)
        );
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Char('['))),
            Some(Action::PrevFilterColumn)
        );
    }

    #[test]
    fn normal_mode_maps_shift_semicolon_to_command() {
        let key = KeyEvent::new(KeyCode::Char(';'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::StartCommand));
    }

    #[test]
    fn input_mode_passes_characters_through() {
        assert_eq!(
            map_key(InputMode::Command, plain(KeyCode::Char('q'))),
            Some(Action::InputChar('q'))
        );
        let upper = KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Filter, upper), Some(Action::InputChar('D')));
        assert_eq!(
            map_key(InputMode::Command, plain(KeyCode::Enter)),
            Some(Action::SubmitInput)
        );
        assert_eq!(
            map_key(InputMode::Command, plain(KeyCode::Esc)),
            Some(Action::CancelInput)
        );
    }

    #[test]
    fn enter_toggles_details() {
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Enter)),
            Some(Action::ToggleDetails)
        );
        assert_eq!(
            map_key(InputMode::Normal, plain(KeyCode::Esc)),
            Some(Action::ClearOverlay)
        );
    }
}
