use crate::{
    annotations, index::Cache, ingress, ingress_route, Config, HTTPS_PORT, HTTP_PORT,
};
use ahash::AHashMap as HashMap;
use ingress_dag_core::{
    Dag, HttpService, Outcome, ResourceId, Root, Secret, SecureVirtualHost, Service, ServiceMeta,
    SourceKind, Status, TlsVersion, VirtualHost,
};
use ingress_dag_k8s_api::{ingressroute::HealthCheck, ResourceExt, ServicePort};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Assembles a single graph from a snapshot of the cache.
///
/// A builder is used once and discarded; nothing it creates is shared with
/// a previous build.
pub(crate) struct Builder<'c> {
    config: &'c Config,
    cache: &'c Cache,
    vhosts: BTreeMap<String, VirtualHost>,
    svhosts: BTreeMap<String, SecureVirtualHost>,
    services: HashMap<ServiceMeta, Arc<HttpService>>,
    secrets: HashMap<ResourceId, Option<Arc<Secret>>>,
    statuses: BTreeMap<(SourceKind, ResourceId), Status>,
}

/// Selects a port of a Service.
#[derive(Copy, Clone, Debug)]
pub(crate) enum PortRef<'a> {
    Number(i32),
    Name(&'a str),
}

/// How a route refers to a Service.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ServiceRef<'a> {
    pub(crate) namespace: &'a str,
    pub(crate) name: &'a str,
    pub(crate) port: PortRef<'a>,
    pub(crate) weight: u32,
    pub(crate) strategy: &'a str,
    pub(crate) health_check: Option<&'a HealthCheck>,
}

// === impl Builder ===

impl<'c> Builder<'c> {
    pub(crate) fn new(config: &'c Config, cache: &'c Cache) -> Self {
        Self {
            config,
            cache,
            vhosts: BTreeMap::new(),
            svhosts: BTreeMap::new(),
            services: HashMap::default(),
            secrets: HashMap::default(),
            statuses: BTreeMap::new(),
        }
    }

    pub(crate) fn config(&self) -> &'c Config {
        self.config
    }

    pub(crate) fn cache(&self) -> &'c Cache {
        self.cache
    }

    pub(crate) fn build(mut self) -> Dag {
        let cache = self.cache;
        for ingress in cache.ingresses.values() {
            ingress::process(&mut self, ingress);
        }
        ingress_route::process(&mut self);

        let insecure = self
            .vhosts
            .into_values()
            .filter(|vhost| !vhost.is_empty())
            .map(Root::from);
        let secure = self
            .svhosts
            .into_values()
            .filter(|svhost| !svhost.virtual_host().is_empty())
            .map(Root::from);
        let roots = insecure.chain(secure).collect();

        Dag::new(roots, self.statuses.into_values().collect())
    }

    /// Returns the insecure host for `host`, creating it if necessary.
    pub(crate) fn insecure_host(&mut self, host: &str) -> &mut VirtualHost {
        self.vhosts
            .entry(host.to_string())
            .or_insert_with(|| VirtualHost::new(host, HTTP_PORT))
    }

    /// Returns the secure host for `host`, creating it with `secret` if
    /// necessary. The secret and minimum version of the first declaration
    /// are kept.
    pub(crate) fn secure_host(
        &mut self,
        host: &str,
        secret: Arc<Secret>,
        min_proto_version: TlsVersion,
    ) -> &mut SecureVirtualHost {
        self.svhosts.entry(host.to_string()).or_insert_with(|| {
            let mut svhost = SecureVirtualHost::new(VirtualHost::new(host, HTTPS_PORT), secret);
            svhost.min_proto_version = min_proto_version;
            svhost
        })
    }

    pub(crate) fn existing_secure_host(&mut self, host: &str) -> Option<&mut SecureVirtualHost> {
        self.svhosts.get_mut(host)
    }

    /// Resolves a Secret that holds a TLS key pair.
    pub(crate) fn lookup_secret(&mut self, namespace: &str, name: &str) -> Option<Arc<Secret>> {
        let id = ResourceId::new(namespace, name);
        let cache = self.cache;
        self.secrets
            .entry(id)
            .or_insert_with_key(|id| {
                let secret = Secret::new(cache.secrets.get(id)?.clone());
                if !secret.has_key_pair() {
                    tracing::info!(%id, "Secret does not hold a TLS key pair");
                    return None;
                }
                Some(Arc::new(secret))
            })
            .clone()
    }

    /// Resolves a Service port, returning the vertex already built for an
    /// equivalent reference when there is one.
    pub(crate) fn lookup_service(&mut self, svc: ServiceRef<'_>) -> Option<Arc<HttpService>> {
        let cache = self.cache;
        let object = cache
            .services
            .get(&ResourceId::new(svc.namespace, svc.name))?;
        let port = find_port(object.spec.as_ref()?.ports.as_deref()?, svc.port)?;
        let object_annotations = object.annotations();

        let mut service = Service::new(object.clone(), port.clone());
        service.weight = svc.weight;
        service.load_balancer_strategy = svc.strategy.to_string();
        service.circuit_breakers = annotations::circuit_breakers(object_annotations);

        let mut http = HttpService::new(service);
        http.protocol = annotations::upstream_protocol(object_annotations, port);
        http.health_check = svc.health_check.cloned();

        let http = self
            .services
            .entry(http.meta())
            .or_insert_with(|| Arc::new(http));
        Some(http.clone())
    }

    /// Records an object's status. Once an object is invalid, it stays
    /// invalid for the rest of the build and keeps its first description.
    pub(crate) fn set_status(&mut self, status: Status) {
        let key = (status.source.kind(), status.source.id());
        if let Some(prior) = self.statuses.get(&key) {
            if prior.outcome == Outcome::Invalid {
                return;
            }
        }
        if status.outcome == Outcome::Invalid {
            tracing::info!(
                kind = %key.0,
                id = %key.1,
                description = %status.description,
                "Rejected"
            );
        }
        self.statuses.insert(key, status);
    }

    pub(crate) fn has_status(&self, kind: SourceKind, id: &ResourceId) -> bool {
        self.statuses.contains_key(&(kind, id.clone()))
    }
}

fn find_port<'p>(ports: &'p [ServicePort], port: PortRef<'_>) -> Option<&'p ServicePort> {
    ports.iter().find(|p| match port {
        PortRef::Number(n) => p.port == n,
        PortRef::Name(name) => p.name.as_deref() == Some(name),
    })
}

impl fmt::Display for PortRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}
