// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod errors;
pub mod member;
pub mod notification;
pub mod repositories;
pub mod services;
pub mod team;

pub use errors::{DomainError, DomainResult, NotificationError, RepositoryError, RepositoryResult};
