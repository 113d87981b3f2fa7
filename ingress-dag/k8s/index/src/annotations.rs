//! Annotations that tune how ingress objects and services are translated
//! into the graph.

use anyhow::{Context, Result};
use ingress_dag_core::{CircuitBreakers, Protocol, Timeout, TlsVersion};
use ingress_dag_k8s_api::{K8sDuration, ServicePort};
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

pub(crate) type Annotations = BTreeMap<String, String>;

pub(crate) const INGRESS_CLASS: &str = "kubernetes.io/ingress.class";
pub(crate) const CONTOUR_INGRESS_CLASS: &str = "contour.heptio.com/ingress.class";

pub(crate) const ALLOW_HTTP: &str = "kubernetes.io/ingress.allow-http";
pub(crate) const FORCE_SSL_REDIRECT: &str = "ingress.kubernetes.io/force-ssl-redirect";
pub(crate) const WEBSOCKET_ROUTES: &str = "contour.heptio.com/websocket-routes";
pub(crate) const REQUEST_TIMEOUT: &str = "contour.heptio.com/request-timeout";
pub(crate) const RETRY_ON: &str = "contour.heptio.com/retry-on";
pub(crate) const NUM_RETRIES: &str = "contour.heptio.com/num-retries";
pub(crate) const PER_TRY_TIMEOUT: &str = "contour.heptio.com/per-try-timeout";
pub(crate) const TLS_MINIMUM_PROTOCOL_VERSION: &str =
    "contour.heptio.com/tls-minimum-protocol-version";

pub(crate) const UPSTREAM_PROTOCOL_H2: &str = "contour.heptio.com/upstream-protocol.h2";
pub(crate) const UPSTREAM_PROTOCOL_H2C: &str = "contour.heptio.com/upstream-protocol.h2c";
pub(crate) const MAX_CONNECTIONS: &str = "contour.heptio.com/max-connections";
pub(crate) const MAX_PENDING_REQUESTS: &str = "contour.heptio.com/max-pending-requests";
pub(crate) const MAX_REQUESTS: &str = "contour.heptio.com/max-requests";
pub(crate) const MAX_RETRIES: &str = "contour.heptio.com/max-retries";

/// The value of a timeout that never expires.
const INFINITY: &str = "infinity";

/// Returns the object's ingress class, preferring the Contour-specific
/// annotation.
pub(crate) fn ingress_class(annotations: &Annotations) -> Option<&str> {
    annotations
        .get(CONTOUR_INGRESS_CLASS)
        .or_else(|| annotations.get(INGRESS_CLASS))
        .map(|class| class.trim())
}

pub(crate) fn is_true(annotations: &Annotations, annotation: &str) -> bool {
    annotations
        .get(annotation)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

pub(crate) fn is_false(annotations: &Annotations, annotation: &str) -> bool {
    annotations
        .get(annotation)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("false"))
}

/// Reads a comma-separated list of path prefixes.
pub(crate) fn websocket_prefixes(annotations: &Annotations) -> BTreeSet<String> {
    annotations
        .get(WEBSOCKET_ROUTES)
        .map(|list| parse_list(list).map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Reads a timeout, falling back to the proxy's default when the annotation
/// is malformed.
pub(crate) fn timeout(annotations: &Annotations, annotation: &str) -> Timeout {
    let Some(value) = annotations.get(annotation) else {
        return Timeout::Default;
    };
    parse_timeout(value).unwrap_or_else(|error| {
        tracing::warn!(%error, %annotation, %value, "Invalid timeout");
        Timeout::Default
    })
}

/// Reads a positive duration. Malformed, zero and negative values are
/// treated as unset.
pub(crate) fn duration(annotations: &Annotations, annotation: &str) -> Option<Duration> {
    let value = annotations.get(annotation)?;
    match value.trim().parse::<K8sDuration>() {
        Ok(d) if d.is_negative() || d.is_zero() => None,
        Ok(d) => Some(d.into()),
        Err(error) => {
            tracing::warn!(%error, %annotation, %value, "Invalid duration");
            None
        }
    }
}

/// Reads an unsigned integer; malformed values are treated as zero.
pub(crate) fn u32_value(annotations: &Annotations, annotation: &str) -> u32 {
    let Some(value) = annotations.get(annotation) else {
        return 0;
    };
    value
        .trim()
        .parse()
        .with_context(|| format!("parsing {annotation}"))
        .unwrap_or_else(|error| {
            tracing::warn!(%error, %value, "Invalid integer");
            0
        })
}

pub(crate) fn min_tls_version(annotations: &Annotations) -> TlsVersion {
    annotations
        .get(TLS_MINIMUM_PROTOCOL_VERSION)
        .map(|v| TlsVersion::parse_lenient(v))
        .unwrap_or_default()
}

pub(crate) fn circuit_breakers(annotations: &Annotations) -> CircuitBreakers {
    CircuitBreakers {
        max_connections: u32_value(annotations, MAX_CONNECTIONS),
        max_pending_requests: u32_value(annotations, MAX_PENDING_REQUESTS),
        max_requests: u32_value(annotations, MAX_REQUESTS),
        max_retries: u32_value(annotations, MAX_RETRIES),
    }
}

/// Determines a service port's upstream protocol from the service's
/// annotations, each of which lists port names or numbers.
pub(crate) fn upstream_protocol(annotations: &Annotations, port: &ServicePort) -> Protocol {
    let number = port.port.to_string();
    let matches = |list: &String| {
        parse_list(list).any(|p| p == number || port.name.as_deref() == Some(p))
    };

    if annotations.get(UPSTREAM_PROTOCOL_H2C).is_some_and(matches) {
        return Protocol::H2c;
    }
    if annotations.get(UPSTREAM_PROTOCOL_H2).is_some_and(matches) {
        return Protocol::H2;
    }
    Protocol::Http1
}

/// Parses a timeout: empty selects the default, `infinity` disables the
/// timeout, and otherwise a Go duration is expected. Negative durations
/// also disable the timeout.
pub(crate) fn parse_timeout(s: &str) -> Result<Timeout> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Timeout::Default);
    }
    if s == INFINITY {
        return Ok(Timeout::Infinite);
    }

    let d = s
        .parse::<K8sDuration>()
        .with_context(|| format!("parsing timeout {s:?}"))?;
    if d.is_negative() {
        return Ok(Timeout::Infinite);
    }
    if d.is_zero() {
        return Ok(Timeout::Default);
    }
    Ok(Timeout::After(d.into()))
}

fn parse_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|item| !item.is_empty())
}
