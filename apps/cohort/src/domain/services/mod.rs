// Domain services
// Pure business rules that span more than one aggregate

pub mod selection;
pub mod team_composition;

pub use selection::{RandomTeamSelector, TeamSelector};
pub use team_composition::TeamCompositionDomainService;
