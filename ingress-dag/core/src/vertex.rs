use crate::{HttpService, Route, Secret, SecureVirtualHost, VirtualHost};
use std::fmt;

/// A borrowed reference to any node in the graph.
///
/// The set of node kinds is closed: matching on a `Vertex` is exhaustive.
#[derive(Copy, Clone, Debug)]
pub enum Vertex<'a> {
    VirtualHost(&'a VirtualHost),
    SecureVirtualHost(&'a SecureVirtualHost),
    Route(&'a Route),
    HttpService(&'a HttpService),
    Secret(&'a Secret),
}

/// Implemented by every node in the graph.
pub trait Visit {
    /// Calls `f` exactly once for each immediate child of this node.
    ///
    /// Leaves have no children. The order is stable for a given node.
    fn visit<'a, F>(&'a self, f: F)
    where
        F: FnMut(Vertex<'a>);
}

// === impl Vertex ===

impl<'a> Vertex<'a> {
    /// Calls `f` for each immediate child of the referenced node.
    pub fn visit<F>(self, f: F)
    where
        F: FnMut(Vertex<'a>),
    {
        match self {
            Self::VirtualHost(vhost) => vhost.visit(f),
            Self::SecureVirtualHost(svhost) => svhost.visit(f),
            Self::Route(route) => route.visit(f),
            Self::HttpService(service) => service.visit(f),
            Self::Secret(secret) => secret.visit(f),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::HttpService(_) | Self::Secret(_))
    }

    /// Returns true if both vertices refer to the same node instance.
    pub fn ptr_eq(&self, other: &Vertex<'_>) -> bool {
        match (*self, *other) {
            (Self::VirtualHost(a), Vertex::VirtualHost(b)) => std::ptr::eq(a, b),
            (Self::SecureVirtualHost(a), Vertex::SecureVirtualHost(b)) => std::ptr::eq(a, b),
            (Self::Route(a), Vertex::Route(b)) => std::ptr::eq(a, b),
            (Self::HttpService(a), Vertex::HttpService(b)) => std::ptr::eq(a, b),
            (Self::Secret(a), Vertex::Secret(b)) => std::ptr::eq(a, b),
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::VirtualHost(_) => "virtualhost",
            Self::SecureVirtualHost(_) => "securevirtualhost",
            Self::Route(_) => "route",
            Self::HttpService(_) => "service",
            Self::Secret(_) => "secret",
        }
    }
}

impl fmt::Display for Vertex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VirtualHost(vhost) => write!(f, "{} {}:{}", self.kind(), vhost.host, vhost.port),
            Self::SecureVirtualHost(svhost) => write!(
                f,
                "{} {}:{} min={}",
                self.kind(),
                svhost.host(),
                svhost.port(),
                svhost.min_proto_version
            ),
            Self::Route(route) => write!(f, "{} {}", self.kind(), route.prefix),
            Self::HttpService(service) => write!(f, "{} {}", self.kind(), service.meta()),
            Self::Secret(secret) => write!(
                f,
                "{} {}/{}",
                self.kind(),
                secret.namespace(),
                secret.name()
            ),
        }
    }
}
