pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod image_processing;
pub mod orchestrator;
pub mod provider;
pub mod server;
pub mod telemetry;

#[cfg(test)]
mod test;
