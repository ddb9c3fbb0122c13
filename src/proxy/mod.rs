pub mod client;
pub mod forward;

pub use client::ProxyClient;
pub use forward::Forwarder;
