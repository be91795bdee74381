pub mod accounts;
pub mod analytics;
pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod metrics;
pub mod migrator;
pub mod queue;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod test_support;
