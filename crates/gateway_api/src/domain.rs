mod person_service;
mod provisioning_service;

pub use person_service::*;
pub use provisioning_service::*;
