//! HTTP client adapter over the inventory backend

pub mod api;
pub mod session;
pub mod transport;

pub use api::ApiClient;
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionEvent, TokenStore, Tokens};
pub use transport::{ApiRequest, ApiResponse, Body, FilePart, Method, ReqwestTransport, Transport};
