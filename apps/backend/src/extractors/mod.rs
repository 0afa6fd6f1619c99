pub mod campaign_membership;
pub mod current_user;
pub mod validated_json;

pub use campaign_membership::CampaignMembership;
pub use current_user::CurrentUser;
pub use validated_json::ValidatedJson;
