pub mod campaign_members;
pub mod campaigns;
pub mod characters;
pub mod compose_locks;
pub mod pass_states;
pub mod phase_transitions;
pub mod posts;
pub mod rolls;
pub mod scene_characters;
pub mod scenes;
pub mod users;

pub use campaign_members::Entity as CampaignMembers;
pub use campaigns::Entity as Campaigns;
pub use characters::Entity as Characters;
pub use compose_locks::Entity as ComposeLocks;
pub use pass_states::Entity as PassStates;
pub use phase_transitions::Entity as PhaseTransitions;
pub use posts::Entity as Posts;
pub use rolls::Entity as Rolls;
pub use scene_characters::Entity as SceneCharacters;
pub use scenes::Entity as Scenes;
pub use users::Entity as Users;
