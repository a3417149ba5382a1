// Application layer
// Use cases that sequence repositories, domain services and notifications

pub mod errors;
pub mod team_orchestration;

pub use errors::{OrchestrationError, OrchestrationResult};
pub use team_orchestration::{StatusChange, TeamOrchestrationService};
