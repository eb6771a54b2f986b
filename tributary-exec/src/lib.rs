#![forbid(unsafe_code)]

pub mod resolver;
pub mod transport;

pub use crate::resolver::{
    extract_bindings, ExtractError, FetchTask, ResolveError, Resolver, ResolverConfig,
};
pub use crate::transport::{
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
