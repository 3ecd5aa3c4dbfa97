pub mod manifest;
pub mod metrics;
pub mod orchestrator;
