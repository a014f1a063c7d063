//! HTTP transport seam.
//!
//! Services talk to the review API only through [`HttpClient`]. Production
//! code uses [`ReqwestClient`]; tests and embedders can script
//! [`StubHttpClient`] instead.

pub mod classify;
pub mod client;
pub mod stub;
pub mod traits;

pub use client::ReqwestClient;
pub use stub::{StubHttpClient, StubReply};
pub use traits::{HttpClient, HttpResponse, TransportError};
