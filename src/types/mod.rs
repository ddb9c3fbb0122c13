pub mod errors;
pub mod forward;

pub use errors::{ProxyError, Result};
pub use forward::{ForwardRequest, ForwardResponse};
