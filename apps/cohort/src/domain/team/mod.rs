// Team domain module
// Contains the team aggregate root, its value objects, and composition results

#![allow(clippy::module_inception)]

pub mod composition;
pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use composition::{
    CompositionKind, RedistributionOutcome, TeamComposition, TeamCompositionResult,
    TeamRedistributionResult,
};
pub use team::Team;
pub use value_objects::TeamName;
