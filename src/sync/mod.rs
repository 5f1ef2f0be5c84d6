//! The request/reply protocol between note windows and the store owner.

pub mod client;
pub mod protocol;
pub mod service;

pub use client::StoreClient;
pub use protocol::{channels, DeleteResponse, Request};
pub use service::StoreService;
