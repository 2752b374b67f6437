//! HTTP transport implementations.

mod transport;

pub use transport::ReqwestTransport;
