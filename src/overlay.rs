use crate::panel::PanelId;

pub const DISMISS_HINT: &str = " (Esc closes)";

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum OverlayBody {
    Pending(String),
    Ready(String),
}

impl OverlayBody {
    pub fn text(&self) -> &str {
        match self {
            Self::Pending(text) | Self::Ready(text) => text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Overlay {
    pub id: u64,
    pub title: String,
    pub body: OverlayBody,
    pub restore_focus: Option<PanelId>,
    pub scroll: u16,
}

impl Overlay {
    pub fn display_title(&self) -> String {
        format!("{}{DISMISS_HINT}", self.title)
    }

    /// Body split into screen rows no wider than `width`; 0 leaves lines whole.
    pub fn rows(&self, width: u16) -> Vec<String> {
        wrap_rows(self.body.text(), usize::from(width))
    }
}

fn wrap_rows(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let chars = line.chars().collect::<Vec<_>>();
        if width == 0 || chars.len() <= width {
            rows.push(line.to_string());
        } else {
            rows.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
        }
    }
    rows
}

#[derive(Debug, Default)]
pub struct OverlayStack {
    stack: Vec<Overlay>,
    next_id: u64,
}

impl OverlayStack {
    pub fn open(
        &mut self,
        title: impl Into<String>,
        body: OverlayBody,
        restore_focus: Option<PanelId>,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.stack.push(Overlay {
            id,
            title: title.into(),
            body,
            restore_focus,
            scroll: 0,
        });
        id
    }

    pub fn close(&mut self) -> Option<Option<PanelId>> {
        self.stack.pop().map(|overlay| overlay.restore_focus)
    }

    pub fn is_modal_open(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn top(&self) -> Option<&Overlay> {
        self.stack.last()
    }

    pub fn set_body(&mut self, id: u64, text: String) -> bool {
        match self.stack.iter_mut().find(|overlay| overlay.id == id) {
            Some(overlay) => {
                overlay.body = OverlayBody::Ready(text);
                overlay.scroll = 0;
                true
            }
            None => false,
        }
    }

    pub fn scroll_by(&mut self, delta: i32, width: u16) {
        let Some(overlay) = self.stack.last_mut() else {
            return;
        };
        let max = overlay.rows(width).len().saturating_sub(1);
        let max = u16::try_from(max).unwrap_or(u16::MAX);
        let next = i32::from(overlay.scroll) + delta;
        overlay.scroll = next.clamp(0, i32::from(max)) as u16;
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::{OverlayBody, OverlayStack};
    use crate::panel::PanelId;

    #[test]
    fn close_returns_focus_captured_at_open() {
        let mut overlays = OverlayStack::default();
        overlays.open(
            "LOGS web",
            OverlayBody::Pending("Loading logs...".to_string()),
            Some(PanelId::Pods),
        );
        assert!(overlays.is_modal_open());

        assert_eq!(overlays.close(), Some(Some(PanelId::Pods)));
        assert!(!overlays.is_modal_open());
        assert_eq!(overlays.close(), None);
    }

    #[test]
    fn late_body_for_closed_overlay_is_dropped() {
        let mut overlays = OverlayStack::default();
        let id = overlays.open("DESCRIBE", OverlayBody::Pending(String::new()), None);
        overlays.close();

        assert!(!overlays.set_body(id, "late".to_string()));
        assert!(overlays.top().is_none());
    }

    #[test]
    fn body_update_targets_the_matching_overlay() {
        let mut overlays = OverlayStack::default();
        let first = overlays.open("ALERTS", OverlayBody::Ready("a".to_string()), None);
        let second = overlays.open("LOGS", OverlayBody::Pending("...".to_string()), None);

        assert!(overlays.set_body(second, "line".to_string()));
        let top = overlays.top().expect("top overlay");
        assert_eq!(top.id, second);
        assert_eq!(top.body, OverlayBody::Ready("line".to_string()));

        overlays.close();
        let top = overlays.top().expect("outer overlay");
        assert_eq!(top.id, first);
        assert_eq!(top.display_title(), "ALERTS (Esc closes)");
    }

    #[test]
    fn scrolling_is_clamped_to_body() {
        let mut overlays = OverlayStack::default();
        overlays.open("LOGS", OverlayBody::Ready("a\nb\nc".to_string()), None);

        overlays.scroll_by(10, 0);
        assert_eq!(overlays.top().map(|overlay| overlay.scroll), Some(2));
        overlays.scroll_by(-5, 0);
        assert_eq!(overlays.top().map(|overlay| overlay.scroll), Some(0));
    }

    #[test]
    fn wrapped_rows_extend_the_scroll_range() {
        let mut overlays = OverlayStack::default();
        overlays.open(
            "LOGS",
            OverlayBody::Ready(format!("{}\nshort", "x".repeat(25))),
            None,
        );
        let top = overlays.top().expect("overlay");
        assert_eq!(
            top.rows(10),
            vec!["x".repeat(10), "x".repeat(10), "x".repeat(5), "short".to_string()]
        );
        assert_eq!(top.rows(0).len(), 2);

        overlays.scroll_by(100, 10);
        assert_eq!(overlays.top().map(|overlay| overlay.scroll), Some(3));
    }
}
