use ingress_dag_k8s_api::Resource;
use std::fmt;

/// Identifies a namespaced Kubernetes object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns `None` for objects that are missing a name or namespace.
    pub fn of<T: Resource>(resource: &T) -> Option<Self> {
        let meta = resource.meta();
        let namespace = meta.namespace.clone()?;
        let name = meta.name.clone()?;
        Some(Self { namespace, name })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
