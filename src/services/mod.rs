//! Business logic services layer

pub mod audit_service;
pub mod decision_service;
pub mod model_handle;
pub mod model_loader;
pub mod profile_builder;
pub mod profile_merger;
pub mod reload_service;
pub mod resolver;

pub use audit_service::{AccessEvent, AuditService, AuditSink};
pub use decision_service::DecisionService;
pub use model_handle::ModelHandle;
pub use reload_service::{FileModelSource, ModelSource, ReloadOutcome, ReloadService, ReloadTrigger};
pub use resolver::{decide, Decision, DenyReason};
