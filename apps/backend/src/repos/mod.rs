//! Domain-facing repository functions.
//!
//! Each entity has exactly one projection into a domain struct
//! (`From<Model>`); everything above this layer speaks those structs.

pub mod campaigns;
pub mod characters;
pub mod compose_locks;
pub mod pass_states;
pub mod phase_transitions;
pub mod posts;
pub mod rolls;
pub mod scenes;
pub mod users;
