pub mod domain;
pub mod engine;
pub mod import;
pub mod metrics;
