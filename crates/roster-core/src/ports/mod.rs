//! Ports - trait definitions for everything outside the client logic.
//! Adapters live in `roster-infra`; tests use hand-written fakes.

mod auth;
mod delay;
mod files;
mod store;
mod transport;

pub use auth::AuthBackend;
pub use delay::{Delay, TokioDelay};
pub use files::{FileSource, SelectedFile};
pub use store::KeyValueStore;
pub use transport::{
    FilePart, HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody, TransportError,
};
