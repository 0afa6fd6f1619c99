use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::characters_sea as characters_adapter;
use crate::entities::characters::{self, CharacterKind};
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    pub id: i64,
    pub campaign_id: i64,
    pub owner_user_id: Option<i64>,
    pub name: String,
    pub kind: CharacterKind,
}

impl Character {
    pub fn is_npc(&self) -> bool {
        self.kind == CharacterKind::Npc
    }
}

impl From<characters::Model> for Character {
    fn from(model: characters::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            owner_user_id: model.owner_user_id,
            name: model.name,
            kind: model.kind,
        }
    }
}

pub async fn require_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    character_id: i64,
) -> Result<Character, DomainError> {
    characters_adapter::find_by_id(conn, character_id)
        .await?
        .map(Character::from)
        .ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Character,
                format!("Character {character_id} not found"),
            )
        })
}

pub async fn find_owned<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
) -> Result<Vec<Character>, DomainError> {
    let rows = characters_adapter::find_owned(conn, campaign_id, user_id).await?;
    Ok(rows.into_iter().map(Character::from).collect())
}

pub async fn create_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    owner_user_id: Option<i64>,
    name: &str,
    kind: CharacterKind,
    now: OffsetDateTime,
) -> Result<Character, DomainError> {
    let row =
        characters_adapter::create_character(conn, campaign_id, owner_user_id, name, kind, now)
            .await?;
    Ok(Character::from(row))
}
