use crate::{SecureVirtualHost, Status, Vertex, VirtualHost};

/// A graph of virtual hosts and everything reachable from them, along with
/// the statuses computed while building it.
#[derive(Debug, Default)]
pub struct Dag {
    roots: Vec<Root>,
    statuses: Vec<Status>,
}

/// A root of the graph.
#[derive(Clone, Debug)]
pub enum Root {
    Insecure(VirtualHost),
    Secure(SecureVirtualHost),
}

// === impl Dag ===

impl Dag {
    /// Each (host, port, secure) combination must appear at most once among
    /// `roots`.
    pub fn new(roots: Vec<Root>, statuses: Vec<Status>) -> Self {
        debug_assert!(
            {
                let mut keys = roots.iter().map(|root| root.key()).collect::<Vec<_>>();
                let n = keys.len();
                keys.sort_unstable();
                keys.dedup();
                keys.len() == n
            },
            "duplicate root"
        );
        Self { roots, statuses }
    }

    /// Calls `f` once for each root, in the order the roots were assembled.
    pub fn visit<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(Vertex<'a>),
    {
        for root in &self.roots {
            f(root.as_vertex());
        }
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    /// The statuses of all source objects considered while building this
    /// graph, as assembled.
    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }
}

// === impl Root ===

impl Root {
    pub fn as_vertex(&self) -> Vertex<'_> {
        match self {
            Self::Insecure(vhost) => Vertex::VirtualHost(vhost),
            Self::Secure(svhost) => Vertex::SecureVirtualHost(svhost),
        }
    }

    pub fn virtual_host(&self) -> &VirtualHost {
        match self {
            Self::Insecure(vhost) => vhost,
            Self::Secure(svhost) => svhost.virtual_host(),
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure(_))
    }

    fn key(&self) -> (&str, u16, bool) {
        let vhost = self.virtual_host();
        (&vhost.host, vhost.port, self.is_secure())
    }
}

impl From<VirtualHost> for Root {
    fn from(vhost: VirtualHost) -> Self {
        Self::Insecure(vhost)
    }
}

impl From<SecureVirtualHost> for Root {
    fn from(svhost: SecureVirtualHost) -> Self {
        Self::Secure(svhost)
    }
}
