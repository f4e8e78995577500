use crate::app::InputMode;
use crate::panel::PageId;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ShowPage(PageId),
    NextPage,
    PrevPage,
    Up,
    Down,
    PageUp,
    PageDown,
    Enter,
    Logs,
    Describe,
    QuickNamespace(u8),
    OpenAlerts,
    OpenEvents,
    Escape,
    Refresh,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if is_interrupt(key) {
        return Some(Action::Quit);
    }
    match mode {
        InputMode::Modal => map_modal_key(key),
        InputMode::Normal | InputMode::Browse => map_dashboard_key(key),
    }
}

fn is_interrupt(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}

/// Open overlays only scroll and close.
fn map_modal_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::Escape),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        _ => None,
    }
}

fn map_dashboard_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('w') => Some(Action::ShowPage(PageId::Workloads)),
        KeyCode::Char('n') => Some(Action::ShowPage(PageId::Network)),
        KeyCode::Char('c') => Some(Action::ShowPage(PageId::Cluster)),
        KeyCode::Char('m') => Some(Action::ShowPage(PageId::Metrics)),
        KeyCode::Char('l') => Some(Action::Logs),
        KeyCode::Char('d') => Some(Action::Describe),
        KeyCode::Char('a') => Some(Action::OpenAlerts),
        KeyCode::Char('e') => Some(Action::OpenEvents),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char(c) if c.is_ascii_digit() => c
            .to_digit(10)
            .and_then(|digit| u8::try_from(digit).ok())
            .map(Action::QuickNamespace),
        KeyCode::Left => Some(Action::PrevPage),
        KeyCode::Right => Some(Action::NextPage),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::Enter => Some(Action::Enter),
        KeyCode::Esc => Some(Action::Escape),
        _ => None,
    }
}
