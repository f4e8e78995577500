use crate::dispatch::{DiagnosticRequest, UiEvent};
use crate::model::{NamespaceScope, ResourceGroup};
use crate::panel::PanelId;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info};

/// Best-effort cluster queries. Implementations bound their own latency
/// and degrade to empty or placeholder text instead of failing.
pub trait ClusterSource: Send + Sync + 'static {
    fn summary_counts(&self, scope: &NamespaceScope) -> impl Future<Output = String> + Send;
    fn grouped_resources(
        &self,
        scope: &NamespaceScope,
        group: ResourceGroup,
    ) -> impl Future<Output = String> + Send;
    fn pods(&self, scope: &NamespaceScope) -> impl Future<Output = String> + Send;
    fn namespace_list(&self) -> impl Future<Output = (String, Vec<String>)> + Send;
    fn alerts(&self, scope: &NamespaceScope) -> impl Future<Output = String> + Send;
    fn events(&self, scope: &NamespaceScope) -> impl Future<Output = String> + Send;
    fn metrics(&self, scope: &NamespaceScope) -> impl Future<Output = String> + Send;
    fn run_diagnostic(&self, request: &DiagnosticRequest) -> impl Future<Output = String> + Send;
}

#[derive(Debug, Clone)]
pub struct RefreshSnapshot {
    pub scope: NamespaceScope,
    pub texts: BTreeMap<PanelId, String>,
    pub namespace_names: Vec<String>,
    pub fetched_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl RefreshSnapshot {
    pub fn text(&self, panel: PanelId) -> &str {
        self.texts.get(&panel).map(String::as_str).unwrap_or_default()
    }
}

pub async fn collect_snapshot<S: ClusterSource>(
    source: &S,
    scope: &NamespaceScope,
) -> RefreshSnapshot {
    let started = Instant::now();
    let (
        overview,
        workloads,
        network,
        config,
        storage,
        infra,
        pods,
        (namespaces, namespace_names),
        alerts,
        events,
        metrics,
    ) = tokio::join!(
        source.summary_counts(scope),
        source.grouped_resources(scope, ResourceGroup::Workloads),
        source.grouped_resources(scope, ResourceGroup::Network),
        source.grouped_resources(scope, ResourceGroup::Config),
        source.grouped_resources(scope, ResourceGroup::Storage),
        source.grouped_resources(scope, ResourceGroup::Infra),
        source.pods(scope),
        source.namespace_list(),
        source.alerts(scope),
        source.events(scope),
        source.metrics(scope),
    );

    let texts = BTreeMap::from([
        (PanelId::Namespaces, namespaces),
        (PanelId::Overview, overview),
        (PanelId::Alerts, alerts),
        (PanelId::Events, events),
        (PanelId::Workloads, workloads),
        (PanelId::Pods, pods),
        (PanelId::Network, network),
        (PanelId::Infra, infra),
        (PanelId::Config, config),
        (PanelId::Storage, storage),
        (PanelId::Metrics, metrics),
    ]);

    RefreshSnapshot {
        scope: scope.clone(),
        texts,
        namespace_names,
        fetched_at: Local::now(),
        elapsed: started.elapsed(),
    }
}

#[derive(Debug, Clone)]
pub struct RefreshHandle {
    slot: mpsc::Sender<()>,
}

impl RefreshHandle {
    pub fn request(&self) {
        match self.slot.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => debug!("refresh already pending, request coalesced"),
            Err(TrySendError::Closed(())) => debug!("refresh worker stopped"),
        }
    }
}

pub fn spawn_refresh_worker<S: ClusterSource>(
    source: Arc<S>,
    scope_rx: watch::Receiver<NamespaceScope>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
) -> (RefreshHandle, JoinHandle<()>) {
    let (slot, mut pending) = mpsc::channel::<()>(1);
    let worker = tokio::spawn(async move {
        while pending.recv().await.is_some() {
            let scope = scope_rx.borrow().clone();
            debug!("refresh started for namespace {scope}");
            let snapshot = collect_snapshot(source.as_ref(), &scope).await;
            let elapsed = snapshot.elapsed;

            let (ack, committed) = oneshot::channel();
            if ui_tx.send(UiEvent::RefreshReady { snapshot, ack }).is_err() {
                break;
            }
            match committed.await {
                Ok(()) => info!(
                    "refresh for namespace {scope} committed after {}ms",
                    elapsed.as_millis()
                ),
                Err(_) => debug!("refresh snapshot dropped before commit"),
            }
        }
    });
    (RefreshHandle { slot }, worker)
}

pub fn spawn_refresh_ticker(handle: RefreshHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            handle.request();
        }
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{ClusterSource, collect_snapshot, spawn_refresh_ticker, spawn_refresh_worker};
    use crate::dispatch::{DiagnosticRequest, UiEvent};
    use crate::model::{NamespaceScope, ResourceGroup};
    use crate::panel::PanelId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, watch};
    use tokio::time::{Duration, Instant, sleep, timeout};

    #[derive(Debug, Default)]
    pub(crate) struct FakeSource {
        pub(crate) cycles: AtomicUsize,
    }

    impl ClusterSource for FakeSource {
        async fn summary_counts(&self, scope: &NamespaceScope) -> String {
            self.cycles.fetch_add(1, Ordering::SeqCst);
            format!("NS {}", scope.label())
        }

        async fn grouped_resources(&self, scope: &NamespaceScope, group: ResourceGroup) -> String {
            match group {
                ResourceGroup::Workloads => format!(
                    "DEPLOY\nNAME READY UP-TO-DATE AVAILABLE AGE\nweb-{scope} 1/1 1 1 2d"
                ),
                _ => String::new(),
            }
        }

        async fn pods(&self, scope: &NamespaceScope) -> String {
            format!("NAME READY STATUS\nweb-{scope} 1/1 Running")
        }

        async fn namespace_list(&self) -> (String, Vec<String>) {
            (
                "0) ALL\n1) default\n2) kube-system".to_string(),
                vec![
                    String::new(),
                    "default".to_string(),
                    "kube-system".to_string(),
                ],
            )
        }

        async fn alerts(&self, _scope: &NamespaceScope) -> String {
            String::new()
        }

        async fn events(&self, _scope: &NamespaceScope) -> String {
            "LAST SEEN TYPE REASON\n1m Normal Pulled pod/web".to_string()
        }

        async fn metrics(&self, _scope: &NamespaceScope) -> String {
            String::new()
        }

        async fn run_diagnostic(&self, request: &DiagnosticRequest) -> String {
            request.kubectl_args(200).join(" ")
        }
    }

    #[tokio::test]
    async fn snapshot_maps_every_panel() {
        let scope = NamespaceScope::Named("default".to_string());
        let snapshot = collect_snapshot(&FakeSource::default(), &scope).await;

        assert_eq!(snapshot.texts.len(), PanelId::ALL.len());
        assert_eq!(snapshot.text(PanelId::Overview), "NS default");
        assert_eq!(snapshot.text(PanelId::Pods), "NAME READY STATUS\nweb-default 1/1 Running");
        assert_eq!(snapshot.text(PanelId::Network), "");
        assert_eq!(snapshot.namespace_names.len(), 3);
        assert_eq!(snapshot.scope, scope);
    }

    #[tokio::test]
    async fn many_requests_before_start_run_one_cycle() {
        let source = Arc::new(FakeSource::default());
        let (_scope_tx, scope_rx) = watch::channel(NamespaceScope::All);
        let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
        let (handle, _worker) = spawn_refresh_worker(source.clone(), scope_rx, ui_tx);

        for _ in 0..5 {
            handle.request();
        }

        match ui_rx.recv().await {
            Some(UiEvent::RefreshReady { ack, .. }) => {
                let _ = ack.send(());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(
            timeout(Duration::from_millis(100), ui_rx.recv())
                .await
                .is_err()
        );
        assert_eq!(source.cycles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn request_during_commit_runs_after_ack() {
        let source = Arc::new(FakeSource::default());
        let (scope_tx, scope_rx) = watch::channel(NamespaceScope::All);
        let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
        let (handle, _worker) = spawn_refresh_worker(source.clone(), scope_rx, ui_tx);

        handle.request();
        let Some(UiEvent::RefreshReady { snapshot, ack }) = ui_rx.recv().await else {
            panic!("expected first snapshot");
        };
        assert_eq!(snapshot.scope, NamespaceScope::All);

        scope_tx.send_replace(NamespaceScope::Named("kube-system".to_string()));
        handle.request();
        handle.request();
        assert!(
            timeout(Duration::from_millis(50), ui_rx.recv())
                .await
                .is_err()
        );

        let _ = ack.send(());
        let Some(UiEvent::RefreshReady { snapshot, ack }) = ui_rx.recv().await else {
            panic!("expected second snapshot");
        };
        let _ = ack.send(());
        assert_eq!(
            snapshot.scope,
            NamespaceScope::Named("kube-system".to_string())
        );
        assert_eq!(source.cycles.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_starts_a_cycle_every_period() {
        let source = Arc::new(FakeSource::default());
        let (_scope_tx, scope_rx) = watch::channel(NamespaceScope::All);
        let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
        let (handle, _worker) = spawn_refresh_worker(source.clone(), scope_rx, ui_tx);
        let started = Instant::now();
        let _ticker = spawn_refresh_ticker(handle, Duration::from_secs(2));

        for _ in 0..3 {
            let Some(UiEvent::RefreshReady { ack, .. }) = ui_rx.recv().await else {
                panic!("expected snapshot");
            };
            let _ = ack.send(());
        }

        assert_eq!(source.cycles.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(6), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_during_a_pending_commit_collapse_into_one_cycle() {
        let source = Arc::new(FakeSource::default());
        let (_scope_tx, scope_rx) = watch::channel(NamespaceScope::All);
        let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
        let (handle, _worker) = spawn_refresh_worker(source.clone(), scope_rx, ui_tx);
        let _ticker = spawn_refresh_ticker(handle, Duration::from_secs(1));

        let Some(UiEvent::RefreshReady { ack, .. }) = ui_rx.recv().await else {
            panic!("expected first snapshot");
        };
        sleep(Duration::from_millis(4_500)).await;
        assert_eq!(source.cycles.load(Ordering::SeqCst), 1);

        let _ = ack.send(());
        let Some(UiEvent::RefreshReady { ack, .. }) = ui_rx.recv().await else {
            panic!("expected second snapshot");
        };
        let _ = ack.send(());
        assert_eq!(source.cycles.load(Ordering::SeqCst), 2);
        assert!(
            timeout(Duration::from_millis(400), ui_rx.recv())
                .await
                .is_err()
        );
    }
}
