//! Seed data for coordination tests.

use backend_test_support::unique_helpers::{unique_email, unique_str};
use scriptorium::adapters::campaigns_sea::CampaignCreate;
use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaign_members::MemberRole;
use scriptorium::entities::characters::CharacterKind;
use scriptorium::repos::campaigns::{self, Campaign};
use scriptorium::repos::characters::{self, Character};
use scriptorium::repos::scenes::{self, Scene};
use scriptorium::repos::users::{self, User};
use scriptorium::state::app_state::AppState;
use scriptorium::AppError;
use sea_orm::ConnectionTrait;
use time::OffsetDateTime;

pub async fn create_user(
    conn: &(impl ConnectionTrait + Send + Sync),
    prefix: &str,
    now: OffsetDateTime,
) -> Result<User, AppError> {
    let sub = unique_str(prefix);
    let email = unique_email(prefix);
    Ok(users::create_user(conn, &sub, Some(&email), Some(prefix), now).await?)
}

/// One campaign in gm_phase with a GM, two players and a scene.
///
/// `alice` belongs to `player`, `bob` to `other`, `npc` to nobody. All
/// three are on the scene roster in that order.
#[derive(Debug, Clone)]
pub struct Table {
    pub campaign: Campaign,
    pub scene: Scene,
    pub gm: User,
    pub player: User,
    pub other: User,
    pub outsider: User,
    pub alice: Character,
    pub bob: Character,
    pub npc: Character,
}

impl Table {
    pub fn roster(&self) -> Vec<i64> {
        vec![self.alice.id, self.bob.id, self.npc.id]
    }
}

pub async fn seed_table_in(
    conn: &(impl ConnectionTrait + Send + Sync),
    now: OffsetDateTime,
) -> Result<Table, AppError> {
    let gm = create_user(conn, "gm", now).await?;
    let player = create_user(conn, "player", now).await?;
    let other = create_user(conn, "other", now).await?;
    let outsider = create_user(conn, "outsider", now).await?;

    let campaign =
        campaigns::create_campaign(conn, CampaignCreate::new(unique_str("campaign"), gm.id), now)
            .await?;
    campaigns::create_membership(conn, campaign.id, gm.id, MemberRole::Gm, now).await?;
    campaigns::create_membership(conn, campaign.id, player.id, MemberRole::Player, now).await?;
    campaigns::create_membership(conn, campaign.id, other.id, MemberRole::Player, now).await?;

    let alice = characters::create_character(
        conn,
        campaign.id,
        Some(player.id),
        "Alice",
        CharacterKind::Pc,
        now,
    )
    .await?;
    let bob = characters::create_character(
        conn,
        campaign.id,
        Some(other.id),
        "Bob",
        CharacterKind::Pc,
        now,
    )
    .await?;
    let npc =
        characters::create_character(conn, campaign.id, None, "Innkeeper", CharacterKind::Npc, now)
            .await?;

    let scene = scenes::create_scene(conn, campaign.id, "The Crooked Lantern", now).await?;
    for (position, character) in [&alice, &bob, &npc].into_iter().enumerate() {
        scenes::add_to_roster(conn, scene.id, character.id, position as i32, now).await?;
    }

    Ok(Table {
        campaign,
        scene,
        gm,
        player,
        other,
        outsider,
        alice,
        bob,
        npc,
    })
}

/// Seed a table in its own committed transaction.
pub async fn seed_table(state: &AppState) -> Result<Table, AppError> {
    let now = state.clock.now();
    with_txn(None, state, |txn| Box::pin(async move { seed_table_in(txn, now).await })).await
}

/// Add another scene to the table's campaign with the given roster.
pub async fn add_scene(
    state: &AppState,
    campaign_id: i64,
    roster: Vec<i64>,
) -> Result<Scene, AppError> {
    let now = state.clock.now();
    with_txn(None, state, |txn| {
        Box::pin(async move {
            let scene = scenes::create_scene(txn, campaign_id, "Side Room", now).await?;
            for (position, character_id) in roster.into_iter().enumerate() {
                scenes::add_to_roster(txn, scene.id, character_id, position as i32, now).await?;
            }
            Ok(scene)
        })
    })
    .await
}
