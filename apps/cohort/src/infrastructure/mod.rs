// Infrastructure layer module
// Contains database adapters and notification transports
// Follows Hexagonal Architecture

pub mod notifications;
pub mod repositories;
