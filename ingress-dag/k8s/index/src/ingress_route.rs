use crate::{
    annotations,
    builder::{Builder, PortRef, ServiceRef},
    Config,
};
use ingress_dag_core::{
    HttpService, ResourceId, RetryPolicy, Route, Source, SourceKind, Status, Timeout, TlsVersion,
};
use ingress_dag_k8s_api::{self as k8s, ingressroute, ResourceExt};
use std::{collections::BTreeMap, sync::Arc};

/// IngressRoute retry policies always retry on server errors.
const RETRY_ON_5XX: &str = "5xx";

const ROOT_PREFIX: &str = "/";

const VALID: &str = "valid IngressRoute";
const ORPHANED: &str = "this IngressRoute is not part of a delegation chain from a root IngressRoute";

/// Adds the routes of every root IngressRoute, and of everything the roots
/// delegate to, then marks the remaining IngressRoutes as orphaned.
pub(crate) fn process(builder: &mut Builder<'_>) {
    let cache = builder.cache();
    let config = builder.config();
    let admitted = move || {
        cache
            .ingress_routes
            .values()
            .filter(move |route| is_admitted(config, route))
    };

    // An fqdn claimed by more than one root is served by none of them.
    let mut claims = BTreeMap::<&str, Vec<ResourceId>>::new();
    for route in admitted() {
        if let Some(vhost) = route.spec.virtualhost.as_ref() {
            let Some(id) = ResourceId::of::<k8s::IngressRoute>(route) else {
                continue;
            };
            claims.entry(vhost.fqdn.trim()).or_default().push(id);
        }
    }

    for route in admitted() {
        let Some(vhost) = route.spec.virtualhost.as_ref() else {
            continue;
        };
        match claims.get(vhost.fqdn.trim()) {
            Some(ids) if ids.len() > 1 && !vhost.fqdn.trim().is_empty() => {
                let ids = ids.iter().map(ToString::to_string).collect::<Vec<_>>();
                builder.set_status(Status::invalid(
                    Source::IngressRoute(route.clone()),
                    format!(
                        "fqdn {:?} is used in multiple IngressRoutes: {}",
                        vhost.fqdn.trim(),
                        ids.join(", ")
                    ),
                    Some(vhost.fqdn.trim().to_string()),
                ));
            }
            _ => process_root(builder, route, vhost),
        }
    }

    for route in admitted() {
        if route.spec.virtualhost.is_some() {
            continue;
        }
        let source = Source::IngressRoute(route.clone());
        if !builder.has_status(SourceKind::IngressRoute, &source.id()) {
            builder.set_status(Status::orphaned(source, ORPHANED));
        }
    }
}

fn is_admitted(config: &Config, route: &k8s::IngressRoute) -> bool {
    config.admits_class(annotations::ingress_class(route.annotations()))
}

fn process_root(
    builder: &mut Builder<'_>,
    route: &Arc<k8s::IngressRoute>,
    vhost: &ingressroute::VirtualHost,
) {
    let source = Source::IngressRoute(route.clone());
    let namespace = route.namespace().unwrap_or_default();
    let fqdn = vhost.fqdn.trim();

    if fqdn.is_empty() {
        builder.set_status(Status::invalid(
            source,
            "Spec.VirtualHost.Fqdn must be specified",
            None,
        ));
        return;
    }
    if fqdn.contains('*') {
        let description = format!("Spec.VirtualHost.Fqdn {fqdn:?} cannot use wildcards");
        builder.set_status(Status::invalid(source, description, Some(fqdn.to_string())));
        return;
    }
    if !builder.config().allows_root_in(&namespace) {
        builder.set_status(Status::invalid(
            source,
            "root IngressRoute cannot be defined in this namespace",
            Some(fqdn.to_string()),
        ));
        return;
    }

    let secure = match vhost.tls.as_ref() {
        None => false,
        Some(tls) => {
            let Some(secret) = builder.lookup_secret(&namespace, &tls.secret_name) else {
                let description = format!(
                    "TLS Secret \"{namespace}/{}\" not found or is malformed",
                    tls.secret_name
                );
                builder.set_status(Status::invalid(source, description, Some(fqdn.to_string())));
                return;
            };
            let min_proto_version = tls
                .minimum_protocol_version
                .as_deref()
                .map(TlsVersion::parse_lenient)
                .unwrap_or_default();
            builder.secure_host(fqdn, secret, min_proto_version);
            true
        }
    };

    let delegation = Delegation { host: fqdn, secure };
    let mut chain = vec![source.id()];
    delegation.walk(builder, route, ROOT_PREFIX, &mut chain);
}

/// The host that a chain of delegations serves.
struct Delegation<'h> {
    host: &'h str,
    secure: bool,
}

// === impl Delegation ===

impl Delegation<'_> {
    /// Adds `route`'s routes to the host, then follows its delegations.
    ///
    /// `chain` holds the IngressRoutes on the path from the root to `route`,
    /// inclusive. An object is only attached once it is known to be valid;
    /// an invalid object contributes no routes and no delegations.
    fn walk(
        &self,
        builder: &mut Builder<'_>,
        route: &Arc<k8s::IngressRoute>,
        parent_prefix: &str,
        chain: &mut Vec<ResourceId>,
    ) {
        let source = Source::IngressRoute(route.clone());
        let namespace = route.namespace().unwrap_or_default();
        let cache = builder.cache();
        let config = builder.config();

        let mut routes = Vec::new();
        let mut delegates = Vec::new();
        for r in &route.spec.routes {
            if !r.match_.starts_with(parent_prefix) {
                let description = format!(
                    "the path prefix {:?} does not match the parent's path prefix {:?}",
                    r.match_, parent_prefix
                );
                builder.set_status(self.invalid(source, description));
                return;
            }

            if let Some(delegate) = r.delegate.as_ref() {
                let id = ResourceId::new(
                    delegate.namespace.as_deref().unwrap_or(&namespace),
                    &delegate.name,
                );
                if chain.contains(&id) {
                    let path = chain
                        .iter()
                        .chain(Some(&id))
                        .map(ToString::to_string)
                        .collect::<Vec<_>>();
                    let description =
                        format!("route creates a delegation cycle: {}", path.join(" -> "));
                    builder.set_status(self.invalid(source, description));
                    return;
                }

                match cache
                    .ingress_routes
                    .get(&id)
                    .filter(|child| is_admitted(config, child))
                {
                    None => {
                        tracing::debug!(%id, "Delegate not found");
                    }
                    Some(child) if child.spec.virtualhost.is_some() => {
                        let description = format!(
                            "root IngressRoute cannot delegate to another root IngressRoute {id}"
                        );
                        builder.set_status(self.invalid(source, description));
                        return;
                    }
                    Some(child) => delegates.push((r.match_.as_str(), child, id)),
                }
                continue;
            }

            let mut services = Vec::with_capacity(r.services.len());
            for svc in &r.services {
                let resolved = builder.lookup_service(ServiceRef {
                    namespace: &namespace,
                    name: &svc.name,
                    port: PortRef::Number(svc.port),
                    weight: svc.weight.unwrap_or(0),
                    strategy: svc.strategy.as_deref().unwrap_or_default(),
                    health_check: svc.health_check.as_ref(),
                });
                let Some(resolved) = resolved else {
                    let description =
                        format!("Service [{}:{}] is invalid or missing", svc.name, svc.port);
                    builder.set_status(self.invalid(source, description));
                    return;
                };
                services.push(resolved);
            }
            routes.push((r, services));
        }

        builder.set_status(Status::valid(
            source.clone(),
            VALID,
            Some(self.host.to_string()),
        ));

        for (r, services) in routes {
            let route = Arc::new(self.route(r, source.clone(), services));
            if self.secure {
                if let Some(svhost) = builder.existing_secure_host(self.host) {
                    svhost.add_route(route.clone());
                }
            }
            builder.insecure_host(self.host).add_route(route);
        }

        for (prefix, child, id) in delegates {
            chain.push(id);
            self.walk(builder, child, prefix, chain);
            chain.pop();
        }
    }

    fn invalid(&self, source: Source, description: String) -> Status {
        Status::invalid(source, description, Some(self.host.to_string()))
    }

    fn route(
        &self,
        r: &ingressroute::Route,
        source: Source,
        services: Vec<Arc<HttpService>>,
    ) -> Route {
        let mut route = Route::new(r.match_.as_str(), source);
        // Plain-text requests to a secure host are upgraded unless the route
        // opts out.
        route.https_upgrade = self.secure && !r.permit_insecure;
        route.websocket = r.enable_websockets;
        route.prefix_rewrite = r.prefix_rewrite.clone().filter(|p| !p.is_empty());
        route.timeout = r
            .timeout_policy
            .as_ref()
            .and_then(|policy| policy.request.as_deref())
            .map(|request| {
                annotations::parse_timeout(request).unwrap_or_else(|error| {
                    tracing::warn!(%error, prefix = %r.match_, "Invalid request timeout");
                    Timeout::Default
                })
            })
            .unwrap_or_default();
        route.retry_policy = r.retry_policy.as_ref().and_then(|policy| {
            let per_try_timeout = policy
                .per_try_timeout
                .filter(|d| !d.is_negative() && !d.is_zero())
                .map(Into::into);
            RetryPolicy::new(RETRY_ON_5XX, policy.count, per_try_timeout)
        });
        for service in services {
            route.add_service(service);
        }
        route
    }
}
