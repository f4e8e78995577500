use crate::model::{ResourceGroup, ResourceKind};

pub const LOADING_TEXT: &str = "Loading...";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PanelId {
    Namespaces,
    Overview,
    Alerts,
    Events,
    Workloads,
    Pods,
    Network,
    Infra,
    Config,
    Storage,
    Metrics,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SelectRule {
    Tabular,
    Digest,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KindSource {
    None,
    Single(ResourceKind),
    Grouped(ResourceGroup),
}

#[derive(Debug, Clone, Copy)]
pub struct PanelSpec {
    pub title: &'static str,
    pub browsable: bool,
    pub rule: SelectRule,
    pub kind_source: KindSource,
    pub default_tone: Tone,
    pub min_height: u16,
    pub supports_logs: bool,
}

impl PanelId {
    pub const ALL: [Self; 11] = [
        Self::Namespaces,
        Self::Overview,
        Self::Alerts,
        Self::Events,
        Self::Workloads,
        Self::Pods,
        Self::Network,
        Self::Infra,
        Self::Config,
        Self::Storage,
        Self::Metrics,
    ];

    pub fn spec(self) -> PanelSpec {
        let tabular = |title, kind_source, min_height| PanelSpec {
            title,
            browsable: true,
            rule: SelectRule::Tabular,
            kind_source,
            default_tone: Tone::Resource,
            min_height,
            supports_logs: false,
        };

        match self {
            Self::Namespaces => PanelSpec {
                title: "NAMESPACES",
                browsable: false,
                rule: SelectRule::Tabular,
                kind_source: KindSource::None,
                default_tone: Tone::Plain,
                min_height: 3,
                supports_logs: false,
            },
            Self::Overview => PanelSpec {
                title: "OVERVIEW",
                browsable: false,
                rule: SelectRule::Tabular,
                kind_source: KindSource::None,
                default_tone: Tone::Info,
                min_height: 3,
                supports_logs: false,
            },
            Self::Alerts => PanelSpec {
                title: "ALERTS",
                browsable: false,
                rule: SelectRule::Digest,
                kind_source: KindSource::Single(ResourceKind::Pod),
                default_tone: Tone::Calm,
                min_height: 3,
                supports_logs: false,
            },
            Self::Events => PanelSpec {
                title: "EVENTS",
                browsable: false,
                rule: SelectRule::Digest,
                kind_source: KindSource::None,
                default_tone: Tone::Calm,
                min_height: 3,
                supports_logs: false,
            },
            Self::Workloads => {
                tabular("WORKLOADS", KindSource::Grouped(ResourceGroup::Workloads), 4)
            }
            Self::Pods => PanelSpec {
                supports_logs: true,
                ..tabular("PODS", KindSource::Single(ResourceKind::Pod), 4)
            },
            Self::Network => tabular("NETWORK", KindSource::Grouped(ResourceGroup::Network), 3),
            Self::Infra => tabular("INFRA", KindSource::Grouped(ResourceGroup::Infra), 3),
            Self::Config => tabular("CONFIG", KindSource::Grouped(ResourceGroup::Config), 3),
            Self::Storage => tabular("STORAGE", KindSource::Grouped(ResourceGroup::Storage), 3),
            Self::Metrics => PanelSpec {
                browsable: false,
                ..tabular("POD METRICS", KindSource::None, 3)
            },
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn browse_suffix(self) -> &'static str {
        if self.spec().supports_logs {
            "[L]ogs / [D]escribe"
        } else {
            "[D]escribe"
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tone {
    Plain,
    Info,
    Calm,
    Warn,
    Notice,
    Resource,
    Focused,
    Browse,
    Muted,
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub id: PanelId,
    pub title: String,
    pub content: String,
    pub loaded: bool,
    pub default_tone: Tone,
    pub border: Tone,
    pub collapsed: bool,
    pub scroll: u16,
    pub viewport_height: u16,
    pub stashed_title: Option<String>,
}

impl Panel {
    pub fn new(id: PanelId) -> Self {
        let spec = id.spec();
        Self {
            id,
            title: spec.title.to_string(),
            content: String::new(),
            loaded: false,
            default_tone: spec.default_tone,
            border: spec.default_tone,
            collapsed: false,
            scroll: 0,
            viewport_height: 0,
            stashed_title: None,
        }
    }

    pub fn has_content(&self) -> bool {
        self.loaded && !self.content.trim().is_empty()
    }

    pub fn set_content(&mut self, text: String) {
        self.content = text;
        self.loaded = true;
    }

    pub fn display_text(&self) -> &str {
        if !self.loaded {
            LOADING_TEXT
        } else if self.collapsed {
            ""
        } else {
            &self.content
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        self.content.split('\n').collect()
    }

    /// Keeps `line` inside the visible window of the last rendered frame.
    pub fn scroll_to_line(&mut self, line: usize) {
        let height = usize::from(self.viewport_height);
        if height == 0 {
            return;
        }
        let top = usize::from(self.scroll);
        if line < top {
            self.scroll = line.try_into().unwrap_or(u16::MAX);
        } else if line >= top + height {
            self.scroll = (line + 1 - height).try_into().unwrap_or(u16::MAX);
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PageId {
    Workloads,
    Network,
    Cluster,
    Metrics,
}

impl PageId {
    pub const ORDER: [Self; 4] = [Self::Workloads, Self::Network, Self::Cluster, Self::Metrics];

    pub fn label(self) -> &'static str {
        match self {
            Self::Workloads => "workloads",
            Self::Network => "network",
            Self::Cluster => "cluster",
            Self::Metrics => "metrics",
        }
    }

    pub fn panels(self) -> &'static [(PanelId, u16)] {
        match self {
            Self::Workloads => &[(PanelId::Workloads, 1), (PanelId::Pods, 1)],
            Self::Network => &[(PanelId::Network, 1)],
            Self::Cluster => &[(PanelId::Infra, 1), (PanelId::Config, 1), (PanelId::Storage, 1)],
            Self::Metrics => &[(PanelId::Metrics, 1)],
        }
    }

    pub fn offset(self, delta: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let index = Self::ORDER
            .iter()
            .position(|page| *page == self)
            .unwrap_or(0) as isize;
        Self::ORDER[(index + delta).rem_euclid(len) as usize]
    }
}

pub fn is_page_panel(id: PanelId) -> bool {
    PageId::ORDER
        .iter()
        .any(|page| page.panels().iter().any(|(panel, _)| *panel == id))
}
