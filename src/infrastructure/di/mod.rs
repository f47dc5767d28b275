//! Dependency injection

mod service_container;

pub use service_container::{pauser_for, ServiceContainer};
