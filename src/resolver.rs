use crate::model::{NamespaceScope, ResourceKind};
use crate::panel::{KindSource, PanelId};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceTarget {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
}

pub fn resolve_kind(panel: PanelId, lines: &[&str], index: usize) -> Option<ResourceKind> {
    if index >= lines.len() {
        return None;
    }
    match panel.spec().kind_source {
        KindSource::None => None,
        KindSource::Single(kind) => Some(kind),
        KindSource::Grouped(group) => lines[..=index]
            .iter()
            .rev()
            .find_map(|line| group.kind_for_heading(line)),
    }
}

pub fn resolve_name(kind: ResourceKind, line: &str, scope: &NamespaceScope) -> Option<String> {
    let fields = line.split_whitespace().collect::<Vec<_>>();
    let name = if scope.is_all() && !kind.cluster_scoped() {
        fields.get(1)
    } else {
        fields.first()
    };
    name.map(|name| (*name).to_string())
}

pub fn resolve_namespace(
    kind: ResourceKind,
    line: &str,
    scope: &NamespaceScope,
) -> Option<String> {
    if kind.cluster_scoped() {
        return None;
    }
    match scope {
        NamespaceScope::All => line.split_whitespace().next().map(str::to_string),
        NamespaceScope::Named(namespace) => Some(namespace.clone()),
    }
}

pub fn resolve_target(
    panel: PanelId,
    lines: &[&str],
    index: usize,
    scope: &NamespaceScope,
) -> Option<ResourceTarget> {
    let kind = resolve_kind(panel, lines, index)?;
    let line = lines[index];
    let name = resolve_name(kind, line, scope)?;
    let namespace = resolve_namespace(kind, line, scope);
    Some(ResourceTarget {
        kind,
        name,
        namespace,
    })
}
