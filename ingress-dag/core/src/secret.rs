use crate::{Vertex, Visit};
use ingress_dag_k8s_api::{self as k8s, ByteString};
use std::{collections::BTreeMap, sync::Arc};

/// The item in a `kubernetes.io/tls` Secret holding the certificate chain.
pub const TLS_CERT_KEY: &str = "tls.crt";

/// The item in a `kubernetes.io/tls` Secret holding the private key.
pub const TLS_PRIVATE_KEY: &str = "tls.key";

/// Secret items, keyed by item name.
pub type ByteMap = BTreeMap<String, ByteString>;

static EMPTY: ByteMap = BTreeMap::new();

/// A Kubernetes Secret used for TLS. A leaf in the graph.
#[derive(Clone, Debug)]
pub struct Secret {
    object: Arc<k8s::Secret>,
}

// === impl Secret ===

impl Secret {
    pub fn new(object: Arc<k8s::Secret>) -> Self {
        Self { object }
    }

    pub fn name(&self) -> &str {
        self.object.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.object.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Returns the contents of the backing Secret's `data` map, unmodified.
    pub fn data(&self) -> &ByteMap {
        self.object.data.as_ref().unwrap_or(&EMPTY)
    }

    /// Returns true if the Secret carries a non-empty certificate and key.
    ///
    /// The contents themselves are not validated.
    pub fn has_key_pair(&self) -> bool {
        let non_empty = |key: &str| self.data().get(key).is_some_and(|v| !v.0.is_empty());
        non_empty(TLS_CERT_KEY) && non_empty(TLS_PRIVATE_KEY)
    }
}

impl Visit for Secret {
    fn visit<'a, F>(&'a self, _: F)
    where
        F: FnMut(Vertex<'a>),
    {
    }
}
