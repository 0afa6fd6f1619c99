//! Scene coordination services.
//!
//! Services are the trust boundary: every membership, GM and ownership
//! check happens here against freshly loaded rows, never against flags
//! supplied by the caller. Mutating operations return an
//! [`Outcome`](crate::events::Outcome) whose events are published only after
//! the surrounding transaction commits.

pub mod access;
pub mod compose_locks;
pub mod passes;
pub mod phase;
pub mod posts;
pub mod rolls;
pub mod roster;
pub mod witnesses;

pub use compose_locks::ComposeLockService;
pub use passes::PassService;
pub use phase::PhaseService;
pub use posts::PostService;
pub use rolls::RollService;
pub use roster::RosterService;
pub use witnesses::WitnessResolver;
