use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum NamespaceScope {
    #[default]
    All,
    Named(String),
}

impl NamespaceScope {
    pub fn from_filter(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn label(&self) -> String {
        match self {
            Self::All => "ALL".to_string(),
            Self::Named(namespace) => namespace.clone(),
        }
    }

    pub fn list_selector(&self) -> Vec<String> {
        match self {
            Self::All => vec!["-A".to_string()],
            Self::Named(namespace) => vec!["-n".to_string(), namespace.clone()],
        }
    }
}

impl Display for NamespaceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    filter: NamespaceScope,
    names: Vec<String>,
}

impl NamespaceContext {
    pub fn new(filter: NamespaceScope) -> Self {
        Self {
            filter,
            names: Vec::new(),
        }
    }

    pub fn filter(&self) -> &NamespaceScope {
        &self.filter
    }

    pub fn replace_names(&mut self, names: Vec<String>) {
        self.names = names;
    }

    /// Returns the previous filter when the index hits the cached table.
    pub fn quick_select(&mut self, index: usize) -> Option<NamespaceScope> {
        let name = self.names.get(index)?;
        let next = NamespaceScope::from_filter(name);
        Some(std::mem::replace(&mut self.filter, next))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ResourceKind {
    Deployment,
    ReplicaSet,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    Pod,
    Service,
    Ingress,
    Endpoints,
    Secret,
    ConfigMap,
    ServiceAccount,
    PersistentVolumeClaim,
    PersistentVolume,
    Node,
    CustomResourceDefinition,
}

impl ResourceKind {
    pub fn kubectl_token(self) -> &'static str {
        match self {
            Self::Deployment => "deploy",
            Self::ReplicaSet => "rs",
            Self::StatefulSet => "sts",
            Self::DaemonSet => "ds",
            Self::Job => "jobs",
            Self::CronJob => "cronjobs",
            Self::Pod => "pod",
            Self::Service => "svc",
            Self::Ingress => "ingress",
            Self::Endpoints => "endpoints",
            Self::Secret => "secrets",
            Self::ConfigMap => "configmaps",
            Self::ServiceAccount => "serviceaccounts",
            Self::PersistentVolumeClaim => "pvc",
            Self::PersistentVolume => "pv",
            Self::Node => "nodes",
            Self::CustomResourceDefinition => "crd",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Self::Deployment => "DEPLOY",
            Self::ReplicaSet => "RS",
            Self::StatefulSet => "STS",
            Self::DaemonSet => "DS",
            Self::Job => "JOBS",
            Self::CronJob => "CRONJOBS",
            Self::Pod => "PODS",
            Self::Service => "SVC",
            Self::Ingress => "INGRESS",
            Self::Endpoints => "ENDPOINTS",
            Self::Secret => "SECRETS",
            Self::ConfigMap => "CONFIGMAPS",
            Self::ServiceAccount => "SERVICEACCOUNTS",
            Self::PersistentVolumeClaim => "PVC",
            Self::PersistentVolume => "PV",
            Self::Node => "NODES",
            Self::CustomResourceDefinition => "CRDS",
        }
    }

    pub fn cluster_scoped(self) -> bool {
        matches!(
            self,
            Self::PersistentVolume | Self::Node | Self::CustomResourceDefinition
        )
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceGroup {
    Workloads,
    Network,
    Config,
    Storage,
    Infra,
}

impl ResourceGroup {
    pub fn kinds(self) -> &'static [ResourceKind] {
        match self {
            Self::Workloads => &[
                ResourceKind::Deployment,
                ResourceKind::ReplicaSet,
                ResourceKind::StatefulSet,
                ResourceKind::DaemonSet,
                ResourceKind::Job,
                ResourceKind::CronJob,
            ],
            Self::Network => &[
                ResourceKind::Service,
                ResourceKind::Ingress,
                ResourceKind::Endpoints,
            ],
            Self::Config => &[
                ResourceKind::Secret,
                ResourceKind::ConfigMap,
                ResourceKind::ServiceAccount,
            ],
            Self::Storage => &[
                ResourceKind::PersistentVolumeClaim,
                ResourceKind::PersistentVolume,
            ],
            Self::Infra => &[ResourceKind::Node, ResourceKind::CustomResourceDefinition],
        }
    }

    pub fn kind_for_heading(self, line: &str) -> Option<ResourceKind> {
        let line = line.trim();
        self.kinds()
            .iter()
            .copied()
            .find(|kind| kind.heading() == line)
    }

    pub fn block_line_limit(self) -> Option<usize> {
        match self {
            Self::Workloads => Some(20),
            _ => None,
        }
    }
}
