use crate::model::{NamespaceScope, ResourceKind};
use crate::refresh::{ClusterSource, RefreshSnapshot};
use crate::resolver::ResourceTarget;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

pub const TOAST_DURATION: Duration = Duration::from_millis(1_500);

#[derive(Debug)]
pub enum UiEvent {
    /// The worker blocks on `ack` until the snapshot is applied.
    RefreshReady {
        snapshot: RefreshSnapshot,
        ack: oneshot::Sender<()>,
    },
    OverlayBody {
        overlay_id: u64,
        body: String,
    },
    ToastExpired(u64),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DiagnosticMode {
    Logs,
    Describe,
}

impl DiagnosticMode {
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Logs => "Loading logs...",
            Self::Describe => "Loading describe...",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DiagnosticRequest {
    pub mode: DiagnosticMode,
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
}

impl DiagnosticRequest {
    /// The row's own namespace wins over the filter; an all-namespaces
    /// filter never turns into `-A` here.
    pub fn for_target(
        mode: DiagnosticMode,
        target: ResourceTarget,
        filter: &NamespaceScope,
    ) -> Option<Self> {
        let name = target.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        let namespace = target
            .namespace
            .map(|namespace| namespace.trim().to_string())
            .filter(|namespace| !namespace.is_empty())
            .or_else(|| match filter {
                NamespaceScope::All => None,
                NamespaceScope::Named(namespace) => Some(namespace.clone()),
            });
        Some(Self {
            mode,
            kind: target.kind,
            name,
            namespace,
        })
    }

    pub fn title(&self) -> String {
        match self.mode {
            DiagnosticMode::Logs => format!("LOGS {}", self.name),
            DiagnosticMode::Describe => {
                format!("DESCRIBE {}/{}", self.kind.kubectl_token(), self.name)
            }
        }
    }

    pub fn kubectl_args(&self, tail_lines: u32) -> Vec<String> {
        let mut args = match self.mode {
            DiagnosticMode::Logs => vec![
                "logs".to_string(),
                self.name.clone(),
                format!("--tail={tail_lines}"),
            ],
            DiagnosticMode::Describe => vec![
                "describe".to_string(),
                self.kind.kubectl_token().to_string(),
                self.name.clone(),
            ],
        };
        if let Some(namespace) = &self.namespace {
            args.push("-n".to_string());
            args.push(namespace.clone());
        }
        args
    }
}

pub fn spawn_diagnostic<S: ClusterSource>(
    source: Arc<S>,
    overlay_id: u64,
    request: DiagnosticRequest,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
) -> JoinHandle<()> {
    info!("dispatching {}", request.title());
    tokio::spawn(async move {
        let body = source.run_diagnostic(&request).await;
        if ui_tx
            .send(UiEvent::OverlayBody { overlay_id, body })
            .is_err()
        {
            debug!("ui loop gone, dropping {}", request.title());
        }
    })
}

pub fn spawn_toast_timer(
    toast_id: u64,
    delay: Duration,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(delay).await;
        let _ = ui_tx.send(UiEvent::ToastExpired(toast_id));
    })
}
