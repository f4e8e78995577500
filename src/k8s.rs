use anyhow::{Context, Result};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    ConfigMap, Endpoints, Node, PersistentVolume, PersistentVolumeClaim, Pod, Secret, Service,
    ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio::time::{Duration, timeout};
use tracing::debug;

use crate::config::DashboardConfig;
use crate::dispatch::DiagnosticRequest;
use crate::exec::{BoundedExecutor, TIMEOUT_TEXT};
use crate::model::{NamespaceScope, ResourceGroup, ResourceKind};
use crate::refresh::ClusterSource;

const NO_RESOURCES: &str = "No resources found";
const POD_LINE_LIMIT: usize = 30;
const EVENT_LINE_LIMIT: usize = 20;
const MAX_ALERTS: usize = 5;
const ALERT_STATUSES: [&str; 6] = [
    "CrashLoopBackOff",
    "Error",
    "ImagePullBackOff",
    "ErrImagePull",
    "Pending",
    "CreateContainerError",
];

/// Cluster access for the dashboard: counts go through the API client,
/// tables come from bounded kubectl runs.
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    kubectl: BoundedExecutor,
    diagnostics: BoundedExecutor,
    count_timeout: Duration,
    log_tail_lines: u32,
}

impl KubeGateway {
    pub async fn new(config: &DashboardConfig) -> Result<Self> {
        let kube_config = match Kubeconfig::read().ok() {
            Some(kubeconfig) => {
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context("failed to infer Kubernetes configuration")?
            }
            None => Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?,
        };
        let client =
            Client::try_from(kube_config).context("failed to initialize Kubernetes client")?;

        let kubectl = BoundedExecutor::new(
            config.kubectl.clone(),
            config.kubectl_base_args(),
            config.command_timeout(),
            config.max_output_bytes,
        );
        let diagnostics = kubectl.with_timeout(config.diagnostic_timeout());
        Ok(Self {
            client,
            kubectl,
            diagnostics,
            count_timeout: config.command_timeout(),
            log_tail_lines: config.log_tail_lines,
        })
    }

    async fn count_namespaced<K>(&self, scope: &NamespaceScope) -> usize
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = match scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };
        self.bounded_count(api).await
    }

    async fn count_cluster<K>(&self) -> usize
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        self.bounded_count(Api::<K>::all(self.client.clone())).await
    }

    async fn bounded_count<K>(&self, api: Api<K>) -> usize
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let kind = K::kind(&Default::default()).to_string();
        match timeout(self.count_timeout, api.list_metadata(&ListParams::default())).await {
            Ok(Ok(list)) => list.items.len(),
            Ok(Err(error)) => {
                debug!("failed to count {kind}: {error}");
                0
            }
            Err(_) => {
                debug!("counting {kind} timed out");
                0
            }
        }
    }

    async fn kubectl(&self, args: &[&str]) -> String {
        let args = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
        self.kubectl.run(&args).await
    }

    async fn scoped_kubectl(&self, args: &[&str], scope: &NamespaceScope) -> String {
        let mut args = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
        args.extend(scope.list_selector());
        self.kubectl.run(&args).await
    }

    async fn listing(&self, scope: &NamespaceScope, kind: ResourceKind) -> String {
        if kind.cluster_scoped() {
            self.kubectl(&["get", kind.kubectl_token()]).await
        } else {
            self.scoped_kubectl(&["get", kind.kubectl_token()], scope)
                .await
        }
    }
}

impl ClusterSource for KubeGateway {
    async fn summary_counts(&self, scope: &NamespaceScope) -> String {
        let (
            deployments,
            replicasets,
            statefulsets,
            daemonsets,
            jobs,
            cronjobs,
            pods,
            services,
            ingresses,
            endpoints,
            claims,
            secrets,
            configmaps,
            service_accounts,
        ) = tokio::join!(
            self.count_namespaced::<Deployment>(scope),
            self.count_namespaced::<ReplicaSet>(scope),
            self.count_namespaced::<StatefulSet>(scope),
            self.count_namespaced::<DaemonSet>(scope),
            self.count_namespaced::<Job>(scope),
            self.count_namespaced::<CronJob>(scope),
            self.count_namespaced::<Pod>(scope),
            self.count_namespaced::<Service>(scope),
            self.count_namespaced::<Ingress>(scope),
            self.count_namespaced::<Endpoints>(scope),
            self.count_namespaced::<PersistentVolumeClaim>(scope),
            self.count_namespaced::<Secret>(scope),
            self.count_namespaced::<ConfigMap>(scope),
            self.count_namespaced::<ServiceAccount>(scope),
        );
        let (nodes, volumes, crds) = tokio::join!(
            self.count_cluster::<Node>(),
            self.count_cluster::<PersistentVolume>(),
            self.kubectl(&["get", "crd", "--no-headers"]),
        );

        let counts = SummaryCounts {
            nodes,
            crds: count_rows(&crds),
            secrets,
            configmaps,
            service_accounts,
            services,
            ingresses,
            endpoints,
            claims,
            volumes,
            deployments,
            replicasets,
            statefulsets,
            daemonsets,
            jobs,
            cronjobs,
            pods,
        };
        counts.render(scope)
    }

    async fn grouped_resources(&self, scope: &NamespaceScope, group: ResourceGroup) -> String {
        let outputs = futures::future::join_all(
            group
                .kinds()
                .iter()
                .map(|kind| async move { (*kind, self.listing(scope, *kind).await) }),
        )
        .await;
        render_group(group, &outputs)
    }

    async fn pods(&self, scope: &NamespaceScope) -> String {
        let out = self.scoped_kubectl(&["get", "pods"], scope).await;
        if out.contains(NO_RESOURCES) {
            return String::new();
        }
        clamp_lines(&out, POD_LINE_LIMIT)
    }

    async fn namespace_list(&self) -> (String, Vec<String>) {
        let out = self.kubectl(&["get", "ns", "--no-headers"]).await;
        render_namespaces(&out)
    }

    async fn alerts(&self, scope: &NamespaceScope) -> String {
        let out = self
            .scoped_kubectl(&["get", "pods", "--no-headers"], scope)
            .await;
        render_alerts(&out, scope)
    }

    async fn events(&self, scope: &NamespaceScope) -> String {
        let out = self
            .scoped_kubectl(
                &["get", "events", "--sort-by=.metadata.creationTimestamp"],
                scope,
            )
            .await;
        last_lines(&out, EVENT_LINE_LIMIT)
    }

    async fn metrics(&self, scope: &NamespaceScope) -> String {
        let out = self.scoped_kubectl(&["top", "pods"], scope).await;
        if metrics_unavailable(&out) {
            String::new()
        } else {
            out
        }
    }

    async fn run_diagnostic(&self, request: &DiagnosticRequest) -> String {
        self.diagnostics
            .run(&request.kubectl_args(self.log_tail_lines))
            .await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SummaryCounts {
    nodes: usize,
    crds: usize,
    secrets: usize,
    configmaps: usize,
    service_accounts: usize,
    services: usize,
    ingresses: usize,
    endpoints: usize,
    claims: usize,
    volumes: usize,
    deployments: usize,
    replicasets: usize,
    statefulsets: usize,
    daemonsets: usize,
    jobs: usize,
    cronjobs: usize,
    pods: usize,
}

impl SummaryCounts {
    fn render(&self, scope: &NamespaceScope) -> String {
        [
            format!("NS {}", scope.label()),
            format!("infra nodes:{} crd:{}", self.nodes, self.crds),
            format!(
                "config sec:{} cm:{} sa:{}",
                self.secrets, self.configmaps, self.service_accounts
            ),
            format!(
                "net svc:{} ing:{} ep:{}",
                self.services, self.ingresses, self.endpoints
            ),
            format!("storage pvc:{} pv:{}", self.claims, self.volumes),
            format!(
                "workloads d:{} rs:{} sts:{} ds:{} jobs:{} cj:{}",
                self.deployments,
                self.replicasets,
                self.statefulsets,
                self.daemonsets,
                self.jobs,
                self.cronjobs
            ),
            format!("pods {}", self.pods),
        ]
        .join("\n")
    }
}

fn is_failure(out: &str) -> bool {
    let trimmed = out.trim();
    trimmed == TIMEOUT_TEXT || trimmed.starts_with("error:")
}

fn count_rows(out: &str) -> usize {
    if out.contains(NO_RESOURCES) || is_failure(out) {
        return 0;
    }
    out.lines().filter(|line| !line.trim().is_empty()).count()
}

fn clamp_lines(text: &str, limit: usize) -> String {
    text.trim_end_matches('\n')
        .lines()
        .take(limit)
        .collect::<Vec<_>>()
        .join("\n")
}

fn last_lines(text: &str, limit: usize) -> String {
    let lines = text.trim().lines().collect::<Vec<_>>();
    let start = lines.len().saturating_sub(limit);
    lines[start..].join("\n").trim().to_string()
}

fn render_group(group: ResourceGroup, outputs: &[(ResourceKind, String)]) -> String {
    let mut text = String::new();
    for (kind, out) in outputs {
        if out.trim().is_empty() || out.contains(NO_RESOURCES) {
            continue;
        }
        let body = match group.block_line_limit() {
            Some(limit) => clamp_lines(out, limit),
            None => out.trim_end().to_string(),
        };
        text.push_str(kind.heading());
        text.push('\n');
        text.push_str(&body);
        text.push_str("\n\n");
    }
    text.trim().to_string()
}

fn render_namespaces(out: &str) -> (String, Vec<String>) {
    let mut text = String::from("0) ALL\n");
    let mut names = vec![String::new()];
    if !is_failure(out) && !out.contains(NO_RESOURCES) {
        for name in out.lines().filter_map(|line| line.split_whitespace().next()) {
            text.push_str(&format!("{}) {name}\n", names.len()));
            names.push(name.to_string());
        }
    }
    (text.trim_end().to_string(), names)
}

fn render_alerts(out: &str, scope: &NamespaceScope) -> String {
    if is_failure(out) || out.contains(NO_RESOURCES) {
        return String::new();
    }
    let status_column = if scope.is_all() { 3 } else { 2 };
    out.lines()
        .filter_map(|line| {
            let fields = line.split_whitespace().collect::<Vec<_>>();
            let status = *fields.get(status_column)?;
            if !ALERT_STATUSES.contains(&status) {
                return None;
            }
            let name = if scope.is_all() {
                format!("{}/{}", fields[0], fields[1])
            } else {
                fields[0].to_string()
            };
            Some(format!("⚠ {name}: {status}"))
        })
        .take(MAX_ALERTS)
        .collect::<Vec<_>>()
        .join("\n")
}

fn metrics_unavailable(out: &str) -> bool {
    let lowered = out.trim().to_ascii_lowercase();
    lowered.is_empty()
        || ["error", "timeout", "unavailable"]
            .iter()
            .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::{
        SummaryCounts, clamp_lines, count_rows, last_lines, metrics_unavailable, render_alerts,
        render_group, render_namespaces,
    };
    use crate::model::{NamespaceScope, ResourceGroup, ResourceKind};

    #[test]
    fn summary_renders_seven_lines() {
        let counts = SummaryCounts {
            nodes: 3,
            crds: 12,
            deployments: 4,
            pods: 9,
            ..SummaryCounts::default()
        };
        let text = counts.render(&NamespaceScope::All);
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "NS ALL");
        assert_eq!(lines[1], "infra nodes:3 crd:12");
        assert_eq!(lines[5], "workloads d:4 rs:0 sts:0 ds:0 jobs:0 cj:0");
        assert_eq!(lines[6], "pods 9");

        let named = counts.render(&NamespaceScope::Named("shop".to_string()));
        assert!(named.starts_with("NS shop\n"));
    }

    #[test]
    fn crd_rows_degrade_to_zero() {
        assert_eq!(count_rows("a.example.io 2024\nb.example.io 2024\n"), 2);
        assert_eq!(count_rows("No resources found\n"), 0);
        assert_eq!(count_rows("  \n"), 0);
        assert_eq!(count_rows("timeout"), 0);
        assert_eq!(count_rows("error: exec: not found"), 0);
    }

    #[test]
    fn group_skips_empty_kinds_and_separates_blocks() {
        let outputs = vec![
            (
                ResourceKind::Service,
                "NAME TYPE\nweb ClusterIP\n".to_string(),
            ),
            (
                ResourceKind::Ingress,
                "No resources found in default namespace.\n".to_string(),
            ),
            (ResourceKind::Endpoints, "NAME ENDPOINTS\nweb 10.0.0.1:80\n".to_string()),
        ];
        assert_eq!(
            render_group(ResourceGroup::Network, &outputs),
            "SVC\nNAME TYPE\nweb ClusterIP\n\nENDPOINTS\nNAME ENDPOINTS\nweb 10.0.0.1:80"
        );
        assert_eq!(render_group(ResourceGroup::Network, &[]), "");
    }

    #[test]
    fn workload_blocks_are_clamped() {
        let table = (0..40)
            .map(|index| format!("app-{index} 1/1 1 1 2d"))
            .collect::<Vec<_>>()
            .join("\n");
        let text = render_group(
            ResourceGroup::Workloads,
            &[(ResourceKind::Deployment, table)],
        );
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 21);
        assert_eq!(lines[0], "DEPLOY");
        assert_eq!(lines[20], "app-19 1/1 1 1 2d");
    }

    #[test]
    fn clamp_and_tail_keep_the_right_end() {
        assert_eq!(clamp_lines("a\nb\nc\n", 2), "a\nb");
        assert_eq!(clamp_lines("a\n", 5), "a");
        assert_eq!(last_lines("1\n2\n3\n4\n", 2), "3\n4");
        assert_eq!(last_lines("", 20), "");
    }

    #[test]
    fn namespace_table_starts_with_all() {
        let (text, names) = render_namespaces("default Active 3d\nkube-system Active 3d\n");
        assert_eq!(text, "0) ALL\n1) default\n2) kube-system");
        assert_eq!(names, vec!["", "default", "kube-system"]);

        let (text, names) = render_namespaces("timeout");
        assert_eq!(text, "0) ALL");
        assert_eq!(names, vec![""]);
    }

    #[test]
    fn alerts_read_status_column_per_scope() {
        let named = "web-1 1/1 Running 0 2d\nweb-2 0/1 CrashLoopBackOff 7 2d\njob-x 0/1 Pending 0 1m\n";
        assert_eq!(
            render_alerts(named, &NamespaceScope::Named("shop".to_string())),
            "⚠ web-2: CrashLoopBackOff\n⚠ job-x: Pending"
        );

        let all = "shop web-2 0/1 ErrImagePull 0 2d\nkube-system dns 1/1 Running 0 9d\n";
        assert_eq!(
            render_alerts(all, &NamespaceScope::All),
            "⚠ shop/web-2: ErrImagePull"
        );
    }

    #[test]
    fn alerts_are_capped_and_ignore_short_rows() {
        let rows = (0..8)
            .map(|index| format!("pod-{index} 0/1 Error 0 1m"))
            .chain(["broken Error".to_string()])
            .collect::<Vec<_>>()
            .join("\n");
        let text = render_alerts(&rows, &NamespaceScope::Named("shop".to_string()));

        assert_eq!(text.lines().count(), 5);
        assert!(!text.contains("broken"));
        assert_eq!(render_alerts("timeout", &NamespaceScope::All), "");
    }

    #[test]
    fn metrics_errors_hide_the_panel() {
        assert!(metrics_unavailable(""));
        assert!(metrics_unavailable("error: Metrics API not available"));
        assert!(metrics_unavailable("Service Unavailable"));
        assert!(metrics_unavailable("timeout"));
        assert!(!metrics_unavailable("NAME CPU(cores) MEMORY(bytes)\nweb 1m 20Mi"));
    }
}
