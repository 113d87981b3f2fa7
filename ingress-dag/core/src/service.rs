use crate::{Vertex, Visit};
use ingress_dag_k8s_api::{self as k8s, ingressroute::HealthCheck};
use std::{fmt, sync::Arc};

/// One port of a Kubernetes Service, as referenced by a route.
#[derive(Clone, Debug)]
pub struct Service {
    object: Arc<k8s::Service>,
    port: k8s::ServicePort,

    pub weight: u32,

    /// The load balancer policy used to pick a host in the upstream cluster.
    /// Empty selects the proxy's default.
    pub load_balancer_strategy: String,

    pub circuit_breakers: CircuitBreakers,
}

/// Circuit-breaking limits for an upstream cluster. Zero leaves a limit at
/// the proxy's default.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CircuitBreakers {
    /// Maximum number of connections made to the upstream cluster.
    pub max_connections: u32,

    /// Maximum number of requests allowed to queue for a connection.
    pub max_pending_requests: u32,

    /// Maximum number of parallel requests to the upstream cluster.
    pub max_requests: u32,

    /// Maximum number of parallel retries to the upstream cluster.
    pub max_retries: u32,
}

/// The layer 7 protocol an upstream speaks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    /// HTTP/1.1.
    #[default]
    Http1,
    /// HTTP/2 over TLS.
    H2,
    /// HTTP/2 over cleartext.
    H2c,
}

/// A Service that speaks HTTP/1.1 or HTTP/2. A leaf in the graph.
#[derive(Clone, Debug)]
pub struct HttpService {
    pub service: Service,
    pub protocol: Protocol,
    pub health_check: Option<HealthCheck>,
}

/// The identity under which an `HttpService` is deduplicated.
///
/// Two references that agree on every field describe the same upstream
/// cluster and share one vertex; any difference yields a distinct vertex.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceMeta {
    namespace: String,
    name: String,
    port: i32,
    weight: u32,
    strategy: String,
    health_check: String,
}

// === impl Service ===

impl Service {
    pub fn new(object: Arc<k8s::Service>, port: k8s::ServicePort) -> Self {
        Self {
            object,
            port,
            weight: 0,
            load_balancer_strategy: String::new(),
            circuit_breakers: CircuitBreakers::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.object.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.object.metadata.namespace.as_deref().unwrap_or_default()
    }

    pub fn object(&self) -> &k8s::Service {
        &self.object
    }

    pub fn port(&self) -> &k8s::ServicePort {
        &self.port
    }
}

// === impl Protocol ===

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http1 => "",
            Self::H2 => "h2",
            Self::H2c => "h2c",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl HttpService ===

impl HttpService {
    pub fn new(service: Service) -> Self {
        Self {
            service,
            protocol: Protocol::default(),
            health_check: None,
        }
    }

    pub fn name(&self) -> &str {
        self.service.name()
    }

    pub fn namespace(&self) -> &str {
        self.service.namespace()
    }

    pub fn meta(&self) -> ServiceMeta {
        ServiceMeta {
            namespace: self.namespace().to_string(),
            name: self.name().to_string(),
            port: self.service.port.port,
            weight: self.service.weight,
            strategy: self.service.load_balancer_strategy.clone(),
            health_check: ServiceMeta::render_health_check(self.health_check.as_ref()),
        }
    }
}

impl Visit for HttpService {
    fn visit<'a, F>(&'a self, _: F)
    where
        F: FnMut(Vertex<'a>),
    {
    }
}

// === impl ServiceMeta ===

impl ServiceMeta {
    /// Renders a health check field by field, in a fixed order, so that
    /// equal checks always render equally. An absent check renders empty.
    fn render_health_check(hc: Option<&HealthCheck>) -> String {
        let Some(hc) = hc else {
            return String::new();
        };

        // Unset fields render as their zero value; strings are quoted so
        // distinct checks cannot collide.
        format!(
            "path={:?} host={:?} interval={} timeout={} unhealthy={} healthy={}",
            hc.path,
            hc.host.as_deref().unwrap_or_default(),
            hc.interval_seconds.unwrap_or_default(),
            hc.timeout_seconds.unwrap_or_default(),
            hc.unhealthy_threshold_count.unwrap_or_default(),
            hc.healthy_threshold_count.unwrap_or_default(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn port(&self) -> i32 {
        self.port
    }
}

impl fmt::Display for ServiceMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}:{} weight={}",
            self.namespace, self.name, self.port, self.weight
        )?;
        if !self.strategy.is_empty() {
            write!(f, " strategy={}", self.strategy)?;
        }
        if !self.health_check.is_empty() {
            write!(f, " healthcheck=[{}]", self.health_check)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_http_service(ns: &str, name: &str, port: i32) -> HttpService {
        let object = Arc::new(k8s::Service {
            metadata: k8s::ObjectMeta {
                namespace: Some(ns.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        let port = k8s::ServicePort {
            port,
            ..Default::default()
        };
        HttpService::new(Service::new(object, port))
    }

    fn mk_health_check() -> HealthCheck {
        HealthCheck {
            path: "/healthz".to_string(),
            interval_seconds: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn equal_references_share_a_key() {
        let mut a = mk_http_service("default", "echo", 80);
        a.service.weight = 10;
        a.service.load_balancer_strategy = "Random".to_string();
        a.health_check = Some(mk_health_check());

        // Built independently, from separate objects.
        let mut b = mk_http_service("default", "echo", 80);
        b.service.weight = 10;
        b.service.load_balancer_strategy = "Random".to_string();
        b.health_check = Some(mk_health_check());

        assert_eq!(a.meta(), b.meta());
        assert!(!std::ptr::eq(a.service.object(), b.service.object()));
    }

    #[test]
    fn any_field_difference_changes_the_key() {
        let base = {
            let mut svc = mk_http_service("default", "echo", 80);
            svc.service.weight = 10;
            svc.service.load_balancer_strategy = "Random".to_string();
            svc.health_check = Some(mk_health_check());
            svc
        };

        let variants: Vec<(&str, HttpService)> = vec![
            ("namespace", {
                let mut svc = mk_http_service("other", "echo", 80);
                svc.service.weight = 10;
                svc.service.load_balancer_strategy = "Random".to_string();
                svc.health_check = Some(mk_health_check());
                svc
            }),
            ("name", {
                let mut svc = mk_http_service("default", "echo2", 80);
                svc.service.weight = 10;
                svc.service.load_balancer_strategy = "Random".to_string();
                svc.health_check = Some(mk_health_check());
                svc
            }),
            ("port", {
                let mut svc = mk_http_service("default", "echo", 8080);
                svc.service.weight = 10;
                svc.service.load_balancer_strategy = "Random".to_string();
                svc.health_check = Some(mk_health_check());
                svc
            }),
            ("weight", {
                let mut svc = base.clone();
                svc.service.weight = 20;
                svc
            }),
            ("strategy", {
                let mut svc = base.clone();
                svc.service.load_balancer_strategy = "WeightedLeastRequest".to_string();
                svc
            }),
            ("no health check", {
                let mut svc = base.clone();
                svc.health_check = None;
                svc
            }),
            ("health check interval", {
                let mut svc = base.clone();
                svc.health_check = Some(HealthCheck {
                    interval_seconds: Some(10),
                    ..mk_health_check()
                });
                svc
            }),
            ("health check host", {
                let mut svc = base.clone();
                svc.health_check = Some(HealthCheck {
                    host: Some("echo.internal".to_string()),
                    ..mk_health_check()
                });
                svc
            }),
        ];

        for (field, variant) in variants {
            assert_ne!(base.meta(), variant.meta(), "{field} must affect the key");
        }
    }

    #[test]
    fn unset_and_zero_health_check_fields_share_a_key() {
        let mut unset = mk_http_service("default", "echo", 80);
        unset.health_check = Some(HealthCheck {
            path: "/".to_string(),
            ..Default::default()
        });

        let mut zero = mk_http_service("default", "echo", 80);
        zero.health_check = Some(HealthCheck {
            path: "/".to_string(),
            host: Some(String::new()),
            interval_seconds: Some(0),
            timeout_seconds: Some(0),
            unhealthy_threshold_count: Some(0),
            healthy_threshold_count: Some(0),
        });
        assert_eq!(unset.meta(), zero.meta());

        // A check with only default fields still differs from no check.
        let mut absent = mk_http_service("default", "echo", 80);
        absent.health_check = None;
        assert_ne!(unset.meta(), absent.meta());
    }

    #[test]
    fn protocol_and_circuit_breakers_do_not_affect_the_key() {
        let a = mk_http_service("default", "echo", 80);
        let mut b = mk_http_service("default", "echo", 80);
        b.protocol = Protocol::H2c;
        b.service.circuit_breakers.max_connections = 100;
        assert_eq!(a.meta(), b.meta());
    }
}
