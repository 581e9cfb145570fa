// src/config/mod.rs
pub mod ai;
pub mod server;

pub use ai::{ProviderConfig, ProviderKind};
pub use server::ServerConfig;
