//! HTTP message types and the transport boundary.

mod request;
mod response;
mod transport;

pub use request::Request;
pub use response::HttpResponse;
pub use transport::{ReqwestTransport, Transport};
