//! SeaORM adapters, one per table family.
//!
//! Functions here are generic over `ConnectionTrait` and return `DbErr`;
//! the repos layer maps errors into `DomainError`. Timestamps are passed in
//! by the caller so every write follows the injected clock.

pub mod campaigns_sea;
pub mod characters_sea;
pub mod compose_locks_sea;
pub mod memberships_sea;
pub mod pass_states_sea;
pub mod phase_transitions_sea;
pub mod posts_sea;
pub mod rolls_sea;
pub mod scenes_sea;
pub mod users_sea;
