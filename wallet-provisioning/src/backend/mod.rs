pub mod client;
pub mod completion;

pub use client::BackendClient;
