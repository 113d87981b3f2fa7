use crate::{HttpService, ServiceMeta, Source, Vertex, Visit};
use std::{collections::BTreeMap, sync::Arc, time::Duration};

/// Maps a path prefix to a weighted set of backend services.
#[derive(Clone, Debug)]
pub struct Route {
    pub prefix: String,
    source: Source,
    services: BTreeMap<ServiceMeta, Arc<HttpService>>,

    /// Redirect plain-text requests to HTTPS. Only meaningful when the route
    /// is served by an insecure virtual host.
    pub https_upgrade: bool,

    pub websocket: bool,

    pub timeout: Timeout,

    pub retry_policy: Option<RetryPolicy>,

    /// Replaces the matched prefix when forwarding.
    pub prefix_rewrite: Option<String>,
}

/// A request timeout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Timeout {
    /// Use the proxy's default timeout.
    #[default]
    Default,

    /// Never time out.
    Infinite,

    After(Duration),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The conditions under which a retry takes place, e.g. `5xx`.
    pub retry_on: String,

    pub num_retries: u32,

    pub per_try_timeout: Option<Duration>,
}

// === impl Route ===

impl Route {
    pub fn new(prefix: impl Into<String>, source: Source) -> Self {
        Self {
            prefix: prefix.into(),
            source,
            services: BTreeMap::new(),
            https_upgrade: false,
            websocket: false,
            timeout: Timeout::Default,
            retry_policy: None,
            prefix_rewrite: None,
        }
    }

    /// The object that declared this route.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Attaches a backend under its dedup key.
    ///
    /// Attachment is an upsert: a backend already attached under the same key
    /// is replaced and returned.
    pub fn add_service(&mut self, service: Arc<HttpService>) -> Option<Arc<HttpService>> {
        self.services.insert(service.meta(), service)
    }

    pub fn services(&self) -> impl Iterator<Item = &Arc<HttpService>> + '_ {
        self.services.values()
    }

    pub fn service(&self, meta: &ServiceMeta) -> Option<&Arc<HttpService>> {
        self.services.get(meta)
    }
}

impl Visit for Route {
    fn visit<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(Vertex<'a>),
    {
        for service in self.services.values() {
            f(Vertex::HttpService(service));
        }
    }
}

// === impl RetryPolicy ===

impl RetryPolicy {
    /// Returns `None` when `retry_on` is empty, as retries are then disabled.
    /// Otherwise at least one retry is allowed.
    pub fn new(
        retry_on: impl Into<String>,
        num_retries: u32,
        per_try_timeout: Option<Duration>,
    ) -> Option<Self> {
        let retry_on = retry_on.into();
        if retry_on.is_empty() {
            return None;
        }
        Some(Self {
            retry_on,
            num_retries: num_retries.max(1),
            per_try_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::mk_ingress_source, tests::mk_service};

    #[test]
    fn add_service_replaces_same_key() {
        let mut route = Route::new("/", mk_ingress_source("default", "echo"));

        let first = mk_service("default", "echo", 80, 1);
        let second = mk_service("default", "echo", 80, 1);
        assert!(route.add_service(first.clone()).is_none());

        let replaced = route
            .add_service(second.clone())
            .expect("first service must be replaced");
        assert!(Arc::ptr_eq(&replaced, &first));

        let services = route.services().collect::<Vec<_>>();
        assert_eq!(services.len(), 1);
        assert!(Arc::ptr_eq(services[0], &second));
    }

    #[test]
    fn visits_each_service_once() {
        let mut route = Route::new("/", mk_ingress_source("default", "echo"));
        route.add_service(mk_service("default", "echo", 80, 1));
        route.add_service(mk_service("default", "echo", 80, 2));
        route.add_service(mk_service("default", "admin", 9090, 0));

        let mut visited = Vec::new();
        route.visit(|v| visited.push(v.to_string()));
        assert_eq!(
            visited,
            vec![
                "service default/admin:9090 weight=0",
                "service default/echo:80 weight=1",
                "service default/echo:80 weight=2",
            ]
        );
    }

    #[test]
    fn retries_need_a_condition() {
        assert_eq!(RetryPolicy::new("", 3, None), None);

        let policy = RetryPolicy::new("5xx", 0, None).unwrap();
        assert_eq!(policy.num_retries, 1);

        let per_try = Some(Duration::from_millis(150));
        let policy = RetryPolicy::new("gateway-error", 4, per_try).unwrap();
        assert_eq!(policy.num_retries, 4);
        assert_eq!(policy.per_try_timeout, Some(Duration::from_millis(150)));
    }
}
