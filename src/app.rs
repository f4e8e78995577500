use crate::browse::{FIRST_SELECTABLE_LINE, Selection, find_selectable, is_selectable};
use crate::dispatch::{DiagnosticMode, DiagnosticRequest};
use crate::input::Action;
use crate::model::{NamespaceContext, NamespaceScope};
use crate::overlay::{Overlay, OverlayBody, OverlayStack, Toast};
use crate::panel::{PageId, Panel, PanelId, Tone, is_page_panel};
use crate::refresh::RefreshSnapshot;
use crate::resolver::resolve_target;
use chrono::{DateTime, Local};

const NO_ALERTS: &str = "No alerts.";
const NO_EVENTS: &str = "No events.";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Browse,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Refresh,
    SwitchNamespace {
        scope: NamespaceScope,
        toast_id: u64,
    },
    FetchDiagnostic {
        overlay_id: u64,
        request: DiagnosticRequest,
    },
}

pub struct App {
    running: bool,
    panels: Vec<Panel>,
    page: PageId,
    focus: Option<PanelId>,
    selection: Option<Selection>,
    overlays: OverlayStack,
    overlay_width: u16,
    overlay_height: u16,
    toast: Option<Toast>,
    next_toast_id: u64,
    namespaces: NamespaceContext,
    /// Scope the committed panel rows were rendered with.
    rendered_scope: NamespaceScope,
    last_refresh: Option<DateTime<Local>>,
}

impl App {
    pub fn new(scope: NamespaceScope) -> Self {
        Self {
            running: true,
            panels: PanelId::ALL.iter().copied().map(Panel::new).collect(),
            page: PageId::Workloads,
            focus: None,
            selection: None,
            overlays: OverlayStack::default(),
            overlay_width: 0,
            overlay_height: 0,
            toast: None,
            next_toast_id: 0,
            namespaces: NamespaceContext::new(scope.clone()),
            rendered_scope: scope,
            last_refresh: None,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        if self.overlays.is_modal_open() {
            InputMode::Modal
        } else if self.selection.is_some() {
            InputMode::Browse
        } else {
            InputMode::Normal
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn focus(&self) -> Option<PanelId> {
        self.focus
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn panel(&self, id: PanelId) -> &Panel {
        &self.panels[id.index()]
    }

    fn panel_mut(&mut self, id: PanelId) -> &mut Panel {
        &mut self.panels[id.index()]
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlays.top()
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn namespace_filter(&self) -> &NamespaceScope {
        self.namespaces.filter()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn set_panel_viewport(&mut self, id: PanelId, height: u16) {
        self.panel_mut(id).viewport_height = height;
    }

    pub fn set_overlay_viewport(&mut self, width: u16, height: u16) {
        self.overlay_width = width;
        self.overlay_height = height;
    }

    pub fn focus_order(&self) -> Vec<PanelId> {
        self.page
            .panels()
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| self.panel(*id).has_content())
            .collect()
    }

    pub fn set_page(&mut self, page: PageId) {
        self.exit_browse();
        self.page = page;
        self.focus = self.focus_order().first().copied();
        self.recompute_emphasis();
    }

    pub fn switch_page(&mut self, delta: isize) {
        self.set_page(self.page.offset(delta));
    }

    pub fn move_focus(&mut self, delta: isize) {
        let order = self.focus_order();
        if order.is_empty() {
            return;
        }
        let next = match self
            .focus
            .and_then(|focus| order.iter().position(|id| *id == focus))
        {
            Some(index) => (index as isize + delta).rem_euclid(order.len() as isize) as usize,
            None => 0,
        };
        self.focus = Some(order[next]);
        self.recompute_emphasis();
    }

    fn recompute_emphasis(&mut self) {
        let browsing = self.selection.map(|selection| selection.panel);
        for panel in &mut self.panels {
            panel.border = if browsing == Some(panel.id) {
                Tone::Browse
            } else if self.focus == Some(panel.id) {
                Tone::Focused
            } else if panel.collapsed {
                Tone::Muted
            } else {
                panel.default_tone
            };
        }
    }

    pub fn enter_browse(&mut self, id: PanelId) {
        let spec = id.spec();
        if !spec.browsable {
            return;
        }
        let first = {
            let lines = self.panel(id).lines();
            find_selectable(
                spec.rule,
                &lines,
                FIRST_SELECTABLE_LINE as isize,
                1,
                false,
            )
        };
        let Some(line) = first else {
            return;
        };

        self.exit_browse();
        let panel = self.panel_mut(id);
        let original = std::mem::take(&mut panel.title);
        panel.title = format!("{original} {}", id.browse_suffix());
        panel.stashed_title = Some(original);

        self.selection = Some(Selection { panel: id, line });
        self.focus = Some(id);
        self.highlight();
        self.recompute_emphasis();
    }

    pub fn exit_browse(&mut self) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        let panel = self.panel_mut(selection.panel);
        if let Some(title) = panel.stashed_title.take() {
            panel.title = title;
        }
        self.recompute_emphasis();
    }

    pub fn adjust_selection(&mut self, delta: isize) {
        let Some(selection) = self.selection else {
            return;
        };
        let next = {
            let rule = selection.panel.spec().rule;
            let lines = self.panel(selection.panel).lines();
            let current = selection.line as isize;
            let step = delta.signum();
            let last = lines.len().saturating_sub(1) as isize;
            let start = (current + delta).clamp(0, last);
            // Page jumps past the end settle on the outermost selectable line.
            find_selectable(rule, &lines, start, step, false).or_else(|| {
                find_selectable(rule, &lines, start, -step, false)
                    .filter(|line| (*line as isize - current) * step > 0)
            })
        };
        if let Some(line) = next {
            self.selection = Some(Selection { line, ..selection });
        }
        self.highlight();
    }

    /// Revalidates the selection against the panel's current text and keeps
    /// it scrolled into view. Browse mode ends when nothing is selectable.
    fn highlight(&mut self) {
        let Some(selection) = self.selection else {
            return;
        };
        let resolved = {
            let rule = selection.panel.spec().rule;
            let lines = self.panel(selection.panel).lines();
            if is_selectable(rule, &lines, selection.line) {
                Some(selection.line)
            } else {
                find_selectable(rule, &lines, selection.line as isize, 1, true)
            }
        };
        match resolved {
            Some(line) => {
                self.selection = Some(Selection { line, ..selection });
                self.panel_mut(selection.panel).scroll_to_line(line);
            }
            None => self.exit_browse(),
        }
    }

    pub fn commit_refresh(&mut self, snapshot: RefreshSnapshot) {
        for panel in &mut self.panels {
            panel.set_content(snapshot.text(panel.id).to_string());
            panel.collapsed = is_page_panel(panel.id) && !panel.has_content();
        }

        let alerts = self.panel_mut(PanelId::Alerts);
        alerts.default_tone = if alerts.has_content() {
            Tone::Warn
        } else {
            Tone::Calm
        };
        let events = self.panel_mut(PanelId::Events);
        events.default_tone = if events.has_content() {
            Tone::Notice
        } else {
            Tone::Calm
        };

        self.namespaces.replace_names(snapshot.namespace_names);
        self.rendered_scope = snapshot.scope;
        self.last_refresh = Some(snapshot.fetched_at);

        if self.selection.is_some() {
            self.highlight();
        }
        if self.focus.is_none() {
            self.focus = self.focus_order().first().copied();
        }
        self.recompute_emphasis();
    }

    pub fn open_overlay(&mut self, title: impl Into<String>, body: OverlayBody) -> u64 {
        self.overlays.open(title, body, self.focus)
    }

    pub fn close_overlay(&mut self) {
        if let Some(Some(restore)) = self.overlays.close() {
            self.focus = Some(restore);
        }
        self.recompute_emphasis();
    }

    pub fn apply_overlay_body(&mut self, overlay_id: u64, body: String) -> bool {
        self.overlays.set_body(overlay_id, body)
    }

    pub fn dismiss_toast(&mut self, toast_id: u64) {
        if self.toast.as_ref().is_some_and(|toast| toast.id == toast_id) {
            self.toast = None;
        }
    }

    fn trigger_diagnostic(&mut self, mode: DiagnosticMode) -> AppCommand {
        let Some(selection) = self.selection else {
            return AppCommand::None;
        };
        if mode == DiagnosticMode::Logs && !selection.panel.spec().supports_logs {
            return AppCommand::None;
        }
        let target = {
            let lines = self.panel(selection.panel).lines();
            resolve_target(
                selection.panel,
                &lines,
                selection.line,
                &self.rendered_scope,
            )
        };
        let Some(request) = target.and_then(|target| {
            DiagnosticRequest::for_target(mode, target, &self.rendered_scope)
        }) else {
            return AppCommand::None;
        };

        let overlay_id = self.open_overlay(
            request.title(),
            OverlayBody::Pending(mode.placeholder().to_string()),
        );
        AppCommand::FetchDiagnostic {
            overlay_id,
            request,
        }
    }

    fn quick_namespace(&mut self, index: usize) -> AppCommand {
        let Some(previous) = self.namespaces.quick_select(index) else {
            return AppCommand::None;
        };
        let scope = self.namespaces.filter().clone();
        self.exit_browse();

        self.next_toast_id += 1;
        let toast_id = self.next_toast_id;
        self.toast = Some(Toast {
            id: toast_id,
            message: format!("Namespace: {} -> {}", previous.label(), scope.label()),
        });
        AppCommand::SwitchNamespace { scope, toast_id }
    }

    fn open_digest(&mut self, id: PanelId, fallback: &str) {
        let panel = self.panel(id);
        let body = if panel.has_content() {
            panel.content.clone()
        } else {
            fallback.to_string()
        };
        let title = panel.title.clone();
        self.open_overlay(title, OverlayBody::Ready(body));
    }

    fn scroll_focused(&mut self, delta: i32) {
        let Some(id) = self.focus else {
            return;
        };
        let panel = self.panel_mut(id);
        let max = panel.lines().len().saturating_sub(1);
        let max = i32::try_from(max).unwrap_or(i32::MAX);
        let next = (i32::from(panel.scroll) + delta).clamp(0, max);
        panel.scroll = u16::try_from(next).unwrap_or(u16::MAX);
    }

    fn page_step(height: u16) -> i32 {
        i32::from(height.max(2) - 1)
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        let mode = self.mode();
        if mode == InputMode::Modal {
            let width = self.overlay_width;
            let page = Self::page_step(self.overlay_height);
            match action {
                Action::Quit => self.running = false,
                Action::Escape => self.close_overlay(),
                Action::Up => self.overlays.scroll_by(-1, width),
                Action::Down => self.overlays.scroll_by(1, width),
                Action::PageUp => self.overlays.scroll_by(-page, width),
                Action::PageDown => self.overlays.scroll_by(page, width),
                _ => {}
            }
            return AppCommand::None;
        }

        match action {
            Action::Quit => {
                self.running = false;
                AppCommand::None
            }
            Action::ShowPage(page) => {
                self.set_page(page);
                AppCommand::None
            }
            Action::NextPage => {
                self.switch_page(1);
                AppCommand::None
            }
            Action::PrevPage => {
                self.switch_page(-1);
                AppCommand::None
            }
            Action::Up | Action::Down => {
                let delta = if action == Action::Up { -1 } else { 1 };
                if mode == InputMode::Browse {
                    self.adjust_selection(delta);
                } else {
                    self.move_focus(delta);
                }
                AppCommand::None
            }
            Action::PageUp | Action::PageDown => {
                let height = self
                    .focus
                    .map(|id| self.panel(id).viewport_height)
                    .unwrap_or_default();
                let step = Self::page_step(height);
                let step = if action == Action::PageUp { -step } else { step };
                if mode == InputMode::Browse {
                    self.adjust_selection(step as isize);
                } else {
                    self.scroll_focused(step);
                }
                AppCommand::None
            }
            Action::Enter => {
                if mode == InputMode::Browse {
                    return self.trigger_diagnostic(DiagnosticMode::Logs);
                }
                if let Some(id) = self.focus {
                    self.enter_browse(id);
                }
                AppCommand::None
            }
            Action::Logs => self.trigger_diagnostic(DiagnosticMode::Logs),
            Action::Describe => self.trigger_diagnostic(DiagnosticMode::Describe),
            Action::QuickNamespace(digit) => self.quick_namespace(usize::from(digit)),
            Action::OpenAlerts => {
                self.open_digest(PanelId::Alerts, NO_ALERTS);
                AppCommand::None
            }
            Action::OpenEvents => {
                self.open_digest(PanelId::Events, NO_EVENTS);
                AppCommand::None
            }
            Action::Escape => {
                self.exit_browse();
                AppCommand::None
            }
            Action::Refresh => AppCommand::Refresh,
        }
    }
}
