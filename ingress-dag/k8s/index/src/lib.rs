//! Ingress DAG index
//!
//! Caches the cluster objects that contribute to the ingress graph and
//! rebuilds the graph from scratch whenever any of them change:
//!
//! - An `Ingress` declares hosts, path prefixes and TLS secrets directly.
//! - An `IngressRoute` with a `virtualhost` is a root; its routes may delegate
//!   a prefix to another `IngressRoute`, possibly in another namespace.
//! - Each route references `Service` ports by name or number. References that
//!   agree on their dedup key share one `HttpService` vertex.
//! - A `Secret` holding a TLS key pair secures a host.
//!
//! ```text
//! [ Ingress | IngressRoute ] -> [ VirtualHost ] -> [ Route ] -> [ Service ]
//!                            -> [ SecureVirtualHost ] -> [ Secret ]
//! ```
//!
//! Each rebuild is published as a new immutable `Arc<Dag>`; readers obtain
//! the current snapshot from a [`Reader`] without locking the index.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod annotations;
mod builder;
mod index;
mod ingress;
mod ingress_route;
mod lookup;


pub use self::{
    index::{Index, SharedIndex},
    lookup::Reader,
};

/// The ingress class served when none is configured.
pub const DEFAULT_INGRESS_CLASS: &str = "contour";

/// Port served by insecure virtual hosts.
pub const HTTP_PORT: u16 = 80;

/// Port served by secure virtual hosts.
pub const HTTPS_PORT: u16 = 443;

/// Controls which objects the index admits into the graph.
#[derive(Clone, Debug)]
pub struct Config {
    /// Objects annotated with a different ingress class are ignored.
    /// Objects without a class annotation are always admitted.
    pub ingress_class: String,

    /// Namespaces allowed to hold root IngressRoutes. Empty permits all.
    pub root_namespaces: Vec<String>,
}

// === impl Config ===

impl Default for Config {
    fn default() -> Self {
        Self {
            ingress_class: DEFAULT_INGRESS_CLASS.to_string(),
            root_namespaces: Vec::new(),
        }
    }
}

impl Config {
    fn admits_class(&self, class: Option<&str>) -> bool {
        class.map_or(true, |class| class == self.ingress_class)
    }

    fn allows_root_in(&self, namespace: &str) -> bool {
        self.root_namespaces.is_empty() || self.root_namespaces.iter().any(|ns| ns == namespace)
    }
}
