use crate::ResourceId;
use ingress_dag_k8s_api::{self as k8s, IngressRouteStatus, Resource};
use std::{fmt, sync::Arc};

/// The object that declared a route or that a status is reported against.
#[derive(Clone, Debug)]
pub enum Source {
    Ingress(Arc<k8s::Ingress>),
    IngressRoute(Arc<k8s::IngressRoute>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Ingress,
    IngressRoute,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Valid,
    Invalid,

    /// Not reachable through delegation from any root.
    Orphaned,
}

/// The validity of one source object, computed while building a graph.
#[derive(Clone, Debug)]
pub struct Status {
    pub source: Source,
    pub outcome: Outcome,
    pub description: String,

    /// The virtual host the object contributed to, if known.
    pub vhost: Option<String>,
}

// === impl Source ===

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Ingress(_) => SourceKind::Ingress,
            Self::IngressRoute(_) => SourceKind::IngressRoute,
        }
    }

    fn meta(&self) -> &k8s::ObjectMeta {
        match self {
            Self::Ingress(ingress) => ingress.meta(),
            Self::IngressRoute(route) => route.meta(),
        }
    }

    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or_default()
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.namespace(), self.name())
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ingress => "Ingress",
            Self::IngressRoute => "IngressRoute",
        })
    }
}

// === impl Outcome ===

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Orphaned => "orphaned",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl Status ===

impl Status {
    pub fn valid(source: Source, description: impl Into<String>, vhost: Option<String>) -> Self {
        Self {
            source,
            outcome: Outcome::Valid,
            description: description.into(),
            vhost,
        }
    }

    pub fn invalid(source: Source, description: impl Into<String>, vhost: Option<String>) -> Self {
        Self {
            source,
            outcome: Outcome::Invalid,
            description: description.into(),
            vhost,
        }
    }

    pub fn orphaned(source: Source, description: impl Into<String>) -> Self {
        Self {
            source,
            outcome: Outcome::Orphaned,
            description: description.into(),
            vhost: None,
        }
    }
}

impl From<&Status> for IngressRouteStatus {
    fn from(status: &Status) -> Self {
        Self {
            current_status: status.outcome.to_string(),
            description: status.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mk_ingress_source;

    #[test]
    fn converts_to_ingressroute_status() {
        let status = Status::invalid(
            mk_ingress_source("default", "echo"),
            "TLS Secret \"default/echo-cert\" not found or is malformed",
            Some("echo.example.com".to_string()),
        );
        assert_eq!(status.source.kind(), SourceKind::Ingress);
        assert_eq!(status.source.id(), ResourceId::new("default", "echo"));

        let converted = IngressRouteStatus::from(&status);
        assert_eq!(converted.current_status, "invalid");
        assert_eq!(
            converted.description,
            "TLS Secret \"default/echo-cert\" not found or is malformed"
        );
    }
}
