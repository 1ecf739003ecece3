//! HTTP transport for the request executor.
mod client;
mod sender;


pub use client::HttpSettings;
pub use sender::{HttpSender, RequestSender};
