//! A directed acyclic graph of the relationships between Kubernetes ingress
//! objects, the Services they route to, and the Secrets that secure them.
//!
//! ```text
//! [ VirtualHost ] -> [ Route ] -> [ HttpService ]
//! [ SecureVirtualHost ] -> [ Route ] -> [ HttpService ]
//!                       -> [ Secret ]
//! ```
//!
//! Roots are virtual hosts. A `Dag` is assembled privately by a builder and
//! is immutable once handed to readers; it is replaced wholesale, never
//! patched, when cluster state changes.
//!
//! Child sets are held in ordered maps, so every traversal yields the same
//! sequence for the same graph regardless of insertion order.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod dag;
mod resource_id;
mod route;
mod secret;
mod service;
mod status;
mod vertex;
mod virtual_host;


pub use self::{
    dag::{Dag, Root},
    resource_id::ResourceId,
    route::{RetryPolicy, Route, Timeout},
    secret::{ByteMap, Secret},
    service::{CircuitBreakers, HttpService, Protocol, Service, ServiceMeta},
    status::{Outcome, Source, SourceKind, Status},
    vertex::{Vertex, Visit},
    virtual_host::{SecureVirtualHost, TlsVersion, VirtualHost},
};
