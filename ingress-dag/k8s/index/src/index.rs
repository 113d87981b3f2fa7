use crate::{builder::Builder, lookup, Config, Reader};
use ingress_dag_core::{Dag, ResourceId};
use ingress_dag_k8s_api::{self as k8s, Resource};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

/// Caches the objects that contribute to the graph and republishes the
/// graph whenever one of them changes.
#[derive(Debug)]
pub struct Index {
    config: Config,
    cache: Cache,
    writer: lookup::Writer,
}

pub type SharedIndex = Arc<RwLock<Index>>;

/// The latest version of every indexed object.
///
/// Ordered maps fix the order in which objects are processed, so equal
/// caches always build equal graphs.
#[derive(Debug, Default)]
pub(crate) struct Cache {
    pub(crate) services: BTreeMap<ResourceId, Arc<k8s::Service>>,
    pub(crate) secrets: BTreeMap<ResourceId, Arc<k8s::Secret>>,
    pub(crate) ingresses: BTreeMap<ResourceId, Arc<k8s::Ingress>>,
    pub(crate) ingress_routes: BTreeMap<ResourceId, Arc<k8s::IngressRoute>>,
}

// === impl Index ===

impl Index {
    pub fn shared(config: Config) -> (Reader, SharedIndex) {
        let (writer, reader) = lookup::pair();
        let index = Self {
            config,
            cache: Cache::default(),
            writer,
        };
        (reader, Arc::new(RwLock::new(index)))
    }

    /// Returns a new reader of the published graph.
    pub fn reader(&self) -> Reader {
        self.writer.subscribe()
    }

    /// Builds a graph from the current cache without publishing it.
    pub fn build(&self) -> Dag {
        Builder::new(&self.config, &self.cache).build()
    }

    fn rebuild(&self) {
        let dag = self.build();
        tracing::debug!(
            roots = dag.roots().len(),
            statuses = dag.statuses().len(),
            "Rebuilt graph"
        );
        self.writer.publish(dag);
    }
}

impl kubert::index::IndexNamespacedResource<k8s::Service> for Index {
    fn apply(&mut self, service: k8s::Service) {
        if insert(&mut self.cache.services, service) {
            self.rebuild();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if remove(&mut self.cache.services, namespace, name) {
            self.rebuild();
        }
    }
}

impl kubert::index::IndexNamespacedResource<k8s::Secret> for Index {
    fn apply(&mut self, secret: k8s::Secret) {
        if insert(&mut self.cache.secrets, secret) {
            self.rebuild();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if remove(&mut self.cache.secrets, namespace, name) {
            self.rebuild();
        }
    }
}

impl kubert::index::IndexNamespacedResource<k8s::Ingress> for Index {
    fn apply(&mut self, ingress: k8s::Ingress) {
        if insert(&mut self.cache.ingresses, ingress) {
            self.rebuild();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if remove(&mut self.cache.ingresses, namespace, name) {
            self.rebuild();
        }
    }
}

impl kubert::index::IndexNamespacedResource<k8s::IngressRoute> for Index {
    fn apply(&mut self, route: k8s::IngressRoute) {
        if insert(&mut self.cache.ingress_routes, route) {
            self.rebuild();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if remove(&mut self.cache.ingress_routes, namespace, name) {
            self.rebuild();
        }
    }
}

fn insert<T>(cache: &mut BTreeMap<ResourceId, Arc<T>>, resource: T) -> bool
where
    T: Resource<DynamicType = ()>,
{
    let Some(id) = ResourceId::of(&resource) else {
        tracing::warn!(
            kind = %T::kind(&()),
            "Ignoring resource without a name and namespace"
        );
        return false;
    };
    tracing::debug!(kind = %T::kind(&()), %id, "Indexing");
    cache.insert(id, Arc::new(resource));
    true
}

fn remove<T>(cache: &mut BTreeMap<ResourceId, Arc<T>>, namespace: String, name: String) -> bool {
    let id = ResourceId::new(namespace, name);
    let removed = cache.remove(&id).is_some();
    tracing::debug!(%id, removed, "Deleting");
    removed
}
