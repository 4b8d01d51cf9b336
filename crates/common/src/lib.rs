pub mod domain;
pub mod store;
pub mod telemetry;
pub mod webhook;
