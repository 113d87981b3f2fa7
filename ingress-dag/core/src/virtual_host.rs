use crate::{ByteMap, Route, Secret, Vertex, Visit};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// An insecure HTTP host.
#[derive(Clone, Debug)]
pub struct VirtualHost {
    pub host: String,

    /// The port this host listens on, usually 80. A secure host wraps a
    /// `VirtualHost` listening on 443.
    pub port: u16,

    routes: BTreeMap<String, Arc<Route>>,
}

/// An HTTP host protected by TLS.
///
/// Shares its route set with the insecure host of the same name by holding
/// the same `Arc<Route>` values.
#[derive(Clone, Debug)]
pub struct SecureVirtualHost {
    virtual_host: VirtualHost,
    secret: Arc<Secret>,
    pub min_proto_version: TlsVersion,
}

/// The minimum TLS protocol version a secure host negotiates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TlsVersion {
    /// Let the proxy choose.
    #[default]
    Auto,
    V1_1,
    V1_2,
    V1_3,
}

// === impl VirtualHost ===

impl VirtualHost {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            routes: BTreeMap::new(),
        }
    }

    /// Attaches a route under its prefix.
    ///
    /// This is where routes declared by different objects for the same host
    /// are merged: a route already attached under the same prefix is replaced
    /// and returned, so the most recently processed declaration wins.
    pub fn add_route(&mut self, route: Arc<Route>) -> Option<Arc<Route>> {
        self.routes.insert(route.prefix.clone(), route)
    }

    pub fn route(&self, prefix: &str) -> Option<&Arc<Route>> {
        self.routes.get(prefix)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> + '_ {
        self.routes.values()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Visit for VirtualHost {
    fn visit<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(Vertex<'a>),
    {
        for route in self.routes.values() {
            f(Vertex::Route(route));
        }
    }
}

// === impl SecureVirtualHost ===

impl SecureVirtualHost {
    /// A secure host cannot exist without its secret.
    pub fn new(virtual_host: VirtualHost, secret: Arc<Secret>) -> Self {
        Self {
            virtual_host,
            secret,
            min_proto_version: TlsVersion::default(),
        }
    }

    pub fn host(&self) -> &str {
        &self.virtual_host.host
    }

    pub fn port(&self) -> u16 {
        self.virtual_host.port
    }

    pub fn virtual_host(&self) -> &VirtualHost {
        &self.virtual_host
    }

    pub fn add_route(&mut self, route: Arc<Route>) -> Option<Arc<Route>> {
        self.virtual_host.add_route(route)
    }

    pub fn secret(&self) -> &Arc<Secret> {
        &self.secret
    }

    /// The key material of this host's secret; empty if the secret has no
    /// data.
    pub fn data(&self) -> &ByteMap {
        self.secret.data()
    }
}

impl Visit for SecureVirtualHost {
    fn visit<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(Vertex<'a>),
    {
        self.virtual_host.visit(&mut f);
        f(Vertex::Secret(&self.secret));
    }
}

// === impl TlsVersion ===

impl TlsVersion {
    /// Parses `1.1`, `1.2` or `1.3`; anything else selects `Auto`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim() {
            "1.1" => Self::V1_1,
            "1.2" => Self::V1_2,
            "1.3" => Self::V1_3,
            _ => Self::Auto,
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::V1_1 => "1.1",
            Self::V1_2 => "1.2",
            Self::V1_3 => "1.3",
        })
    }
}
