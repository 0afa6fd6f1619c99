//! Membership, GM and character-ownership guards shared by all services.

use sea_orm::ConnectionTrait;

use crate::errors::domain::{DomainError, ForbiddenKind, NotFoundKind};
use crate::repos::campaigns::{self, Campaign, Membership};
use crate::repos::characters::{self, Character};
use crate::repos::scenes::{self, Scene};

/// A scene plus the acting user's standing in its campaign.
#[derive(Debug, Clone)]
pub struct SceneAccess {
    pub scene: Scene,
    pub campaign: Campaign,
    pub membership: Membership,
}

impl SceneAccess {
    pub fn is_gm(&self) -> bool {
        self.membership.is_gm()
    }
}

pub async fn require_member<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
) -> Result<Membership, DomainError> {
    campaigns::find_membership(conn, campaign_id, user_id)
        .await?
        .ok_or_else(|| {
            DomainError::forbidden(
                ForbiddenKind::NotMember,
                format!("User {user_id} is not a member of campaign {campaign_id}"),
            )
        })
}

pub fn ensure_gm(membership: &Membership) -> Result<(), DomainError> {
    if membership.is_gm() {
        Ok(())
    } else {
        Err(DomainError::forbidden(
            ForbiddenKind::NotGm,
            "Only the game master may do this",
        ))
    }
}

pub async fn require_gm<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
) -> Result<Membership, DomainError> {
    let membership = require_member(conn, campaign_id, user_id).await?;
    ensure_gm(&membership)?;
    Ok(membership)
}

/// Load a scene and the caller's membership in its campaign.
pub async fn scene_access<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    user_id: i64,
) -> Result<SceneAccess, DomainError> {
    let scene = scenes::require_scene(conn, scene_id).await?;
    let campaign = campaigns::require_campaign(conn, scene.campaign_id).await?;
    let membership = require_member(conn, campaign.id, user_id).await?;
    Ok(SceneAccess {
        scene,
        campaign,
        membership,
    })
}

/// A user may act for characters they own. The GM may also act for NPCs.
pub fn can_act_for(membership: &Membership, character: &Character) -> bool {
    if character.campaign_id != membership.campaign_id {
        return false;
    }
    character.owner_user_id == Some(membership.user_id)
        || (membership.is_gm() && character.is_npc())
}

/// Load a character of the member's campaign that the member may act for.
pub async fn require_actable_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    membership: &Membership,
    character_id: i64,
) -> Result<Character, DomainError> {
    let character = characters::require_character(conn, character_id).await?;
    if character.campaign_id != membership.campaign_id {
        return Err(DomainError::not_found(
            NotFoundKind::Character,
            format!("Character {character_id} not found"),
        ));
    }
    if !can_act_for(membership, &character) {
        return Err(DomainError::forbidden(
            ForbiddenKind::NotCharacterOwner,
            format!("Character {character_id} is not yours to act for"),
        ));
    }
    Ok(character)
}
