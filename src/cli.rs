use crate::model::NamespaceScope;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "ktwins",
    version,
    about = "A live terminal dashboard for Kubernetes clusters."
)]
pub struct CliArgs {
    /// Start in a specific namespace (empty or "all" for every namespace)
    pub namespace: Option<String>,
}

impl CliArgs {
    pub fn namespace_scope(&self) -> NamespaceScope {
        self.namespace
            .as_deref()
            .map(NamespaceScope::from_filter)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use crate::model::NamespaceScope;
    use clap::Parser;

    #[test]
    fn namespace_argument_is_optional() {
        let args = CliArgs::try_parse_from(["ktwins"]).expect("args");
        assert_eq!(args.namespace_scope(), NamespaceScope::All);

        let args = CliArgs::try_parse_from(["ktwins", "ALL"]).expect("args");
        assert_eq!(args.namespace_scope(), NamespaceScope::All);

        let args = CliArgs::try_parse_from(["ktwins", "kube-system"]).expect("args");
        assert_eq!(
            args.namespace_scope(),
            NamespaceScope::Named("kube-system".to_string())
        );
    }

    #[test]
    fn flags_are_rejected() {
        assert!(CliArgs::try_parse_from(["ktwins", "--namespace", "default"]).is_err());
    }
}
