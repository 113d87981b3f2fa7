use crate::{
    annotations::{self, Annotations},
    builder::{Builder, PortRef, ServiceRef},
};
use ingress_dag_core::{HttpService, RetryPolicy, Route, Secret, Source, Status, Timeout};
use ingress_dag_k8s_api::{self as k8s, IngressBackend, ResourceExt};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// Host used by rules that do not name one.
const ANY_HOST: &str = "*";

const DEFAULT_PREFIX: &str = "/";

/// Route attributes an Ingress configures through annotations. They apply to
/// every route the Ingress declares.
struct RouteAnnotations {
    https_upgrade: bool,
    websocket_prefixes: BTreeSet<String>,
    timeout: Timeout,
    retry_policy: Option<RetryPolicy>,
}

/// Adds an Ingress's routes to the graph and records its status.
pub(crate) fn process(builder: &mut Builder<'_>, ingress: &Arc<k8s::Ingress>) {
    let ann = ingress.annotations();
    let class = annotations::ingress_class(ann).or_else(|| {
        ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.ingress_class_name.as_deref())
    });
    if !builder.config().admits_class(class) {
        tracing::debug!(
            ns = ?ingress.namespace(),
            name = ingress.name_any(),
            ?class,
            "Ignoring Ingress of another class"
        );
        return;
    }

    let source = Source::Ingress(ingress.clone());
    let Some(spec) = ingress.spec.as_ref() else {
        builder.set_status(Status::valid(source, "valid Ingress", None));
        return;
    };
    let namespace = source.namespace();

    // The first problem found is reported, but valid parts of the Ingress
    // are still served.
    let mut problem = None::<String>;

    let mut secrets = BTreeMap::<&str, Arc<Secret>>::new();
    for tls in spec.tls.iter().flatten() {
        let Some(secret_name) = tls.secret_name.as_deref().filter(|n| !n.is_empty()) else {
            problem.get_or_insert_with(|| "TLS entry does not name a Secret".to_string());
            continue;
        };
        match builder.lookup_secret(namespace, secret_name) {
            Some(secret) => {
                for host in tls.hosts.iter().flatten() {
                    secrets.entry(host.as_str()).or_insert_with(|| secret.clone());
                }
            }
            None => {
                problem.get_or_insert_with(|| {
                    format!("TLS Secret \"{namespace}/{secret_name}\" not found or is malformed")
                });
            }
        }
    }

    let allow_http = !annotations::is_false(ann, annotations::ALLOW_HTTP);
    let min_proto_version = annotations::min_tls_version(ann);
    let route_annotations = RouteAnnotations::new(ann);

    let default_backend = spec
        .default_backend
        .iter()
        .map(|backend| (ANY_HOST, DEFAULT_PREFIX, backend));
    let rules = spec.rules.iter().flatten().flat_map(|rule| {
        let host = rule
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(ANY_HOST);
        rule.http.iter().flat_map(move |http| {
            http.paths.iter().map(move |path| {
                let prefix = path
                    .path
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .unwrap_or(DEFAULT_PREFIX);
                (host, prefix, &path.backend)
            })
        })
    });

    let mut hosts = BTreeSet::new();
    for (host, prefix, backend) in default_backend.chain(rules) {
        let service = match resolve_backend(builder, namespace, backend) {
            Ok(service) => service,
            Err(error) => {
                problem.get_or_insert(error);
                continue;
            }
        };

        let route = Arc::new(route_annotations.route(prefix, source.clone(), service));
        if allow_http {
            builder.insecure_host(host).add_route(route.clone());
        }
        if let Some(secret) = secrets.get(host) {
            builder
                .secure_host(host, secret.clone(), min_proto_version)
                .add_route(route);
        }
        hosts.insert(host);
    }

    let vhost = (!hosts.is_empty()).then(|| hosts.into_iter().collect::<Vec<_>>().join(","));
    let status = match problem {
        Some(problem) => Status::invalid(source, problem, vhost),
        None => Status::valid(source, "valid Ingress", vhost),
    };
    builder.set_status(status);
}

fn resolve_backend(
    builder: &mut Builder<'_>,
    namespace: &str,
    backend: &IngressBackend,
) -> Result<Arc<HttpService>, String> {
    let Some(service) = backend.service.as_ref() else {
        return Err("backend does not reference a Service".to_string());
    };
    let port = match service.port.as_ref() {
        Some(k8s::ServiceBackendPort {
            number: Some(number),
            ..
        }) => PortRef::Number(*number),
        Some(k8s::ServiceBackendPort {
            name: Some(name), ..
        }) => PortRef::Name(name),
        _ => return Err(format!("backend Service \"{}\" has no port", service.name)),
    };

    builder
        .lookup_service(ServiceRef {
            namespace,
            name: &service.name,
            port,
            weight: 0,
            strategy: "",
            health_check: None,
        })
        .ok_or_else(|| format!("Service \"{namespace}/{}\" port {port} not found", service.name))
}

// === impl RouteAnnotations ===

impl RouteAnnotations {
    fn new(ann: &Annotations) -> Self {
        let retry_on = ann
            .get(annotations::RETRY_ON)
            .map(|s| s.trim())
            .unwrap_or_default();
        Self {
            https_upgrade: annotations::is_true(ann, annotations::FORCE_SSL_REDIRECT),
            websocket_prefixes: annotations::websocket_prefixes(ann),
            timeout: annotations::timeout(ann, annotations::REQUEST_TIMEOUT),
            retry_policy: RetryPolicy::new(
                retry_on,
                annotations::u32_value(ann, annotations::NUM_RETRIES),
                annotations::duration(ann, annotations::PER_TRY_TIMEOUT),
            ),
        }
    }

    fn route(&self, prefix: &str, source: Source, service: Arc<HttpService>) -> Route {
        let mut route = Route::new(prefix, source);
        route.https_upgrade = self.https_upgrade;
        route.websocket = self.websocket_prefixes.contains(prefix);
        route.timeout = self.timeout;
        route.retry_policy = self.retry_policy.clone();
        route.add_service(service);
        route
    }
}
