use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Users {
    Table,
    Id,
    Sub,
    Email,
    Username,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Campaigns {
    Table,
    Id,
    Name,
    CreatedBy,
    Phase,
    PhaseStartedAt,
    PhaseExpiresAt,
    IsPaused,
    PausedAt,
    TimeGateSecs,
    LockVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CampaignMembers {
    Table,
    Id,
    CampaignId,
    UserId,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum Characters {
    Table,
    Id,
    CampaignId,
    OwnerUserId,
    Name,
    Kind,
    CreatedAt,
}

#[derive(Iden)]
enum Scenes {
    Table,
    Id,
    CampaignId,
    Title,
    IsArchived,
    CreatedAt,
}

#[derive(Iden)]
enum SceneCharacters {
    Table,
    Id,
    SceneId,
    CharacterId,
    Position,
    JoinedAt,
}

#[derive(Iden)]
enum Posts {
    Table,
    Id,
    SceneId,
    CharacterId,
    UserId,
    Blocks,
    OocText,
    Witnesses,
    IsHidden,
    IsDraft,
    IsLocked,
    AwaitingReveal,
    Intention,
    Modifier,
    SubmittedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ComposeLocks {
    Table,
    Id,
    SceneId,
    CharacterId,
    UserId,
    AcquiredAt,
    ExpiresAt,
    IsHidden,
}

#[derive(Iden)]
enum PassStates {
    Table,
    Id,
    SceneId,
    CharacterId,
    State,
    UpdatedAt,
}

#[derive(Iden)]
enum Rolls {
    Table,
    Id,
    PostId,
    SceneId,
    CharacterId,
    RequestedBy,
    Intention,
    OriginalIntention,
    Modifier,
    DiceType,
    DiceCount,
    Result,
    Total,
    Status,
    WasOverridden,
    OverriddenBy,
    OverrideReason,
    OverriddenAt,
    ManualResult,
    ManuallyResolvedBy,
    ManualResolutionReason,
    InvalidatedBy,
    InvalidatedAt,
    RolledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PhaseTransitions {
    Table,
    Id,
    CampaignId,
    FromPhase,
    ToPhase,
    TriggeredBy,
    Reason,
    CreatedAt,
}

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .primary_key()
        .auto_increment()
        .to_owned()
}

fn ts_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(ColumnDef::new(Users::Sub).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .col(ColumnDef::new(Users::Username).string().null())
                    .col(ts_col(Users::CreatedAt))
                    .col(ts_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_sub_unique")
                    .table(Users::Table)
                    .col(Users::Sub)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // campaigns
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(id_col(Campaigns::Id))
                    .col(ColumnDef::new(Campaigns::Name).string().not_null())
                    .col(ColumnDef::new(Campaigns::CreatedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Campaigns::Phase)
                            .string_len(16)
                            .not_null()
                            .default("gm_phase"),
                    )
                    .col(ts_col(Campaigns::PhaseStartedAt))
                    .col(
                        ColumnDef::new(Campaigns::PhaseExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::IsPaused)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Campaigns::PausedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Campaigns::TimeGateSecs).big_integer().null())
                    .col(
                        ColumnDef::new(Campaigns::LockVersion)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ts_col(Campaigns::CreatedAt))
                    .col(ts_col(Campaigns::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaigns_created_by")
                            .from(Campaigns::Table, Campaigns::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // campaign_members
        manager
            .create_table(
                Table::create()
                    .table(CampaignMembers::Table)
                    .if_not_exists()
                    .col(id_col(CampaignMembers::Id))
                    .col(
                        ColumnDef::new(CampaignMembers::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CampaignMembers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(CampaignMembers::Role).string_len(16).not_null())
                    .col(ts_col(CampaignMembers::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_members_campaign_id")
                            .from(CampaignMembers::Table, CampaignMembers::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_members_user_id")
                            .from(CampaignMembers::Table, CampaignMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_campaign_members_campaign_user")
                    .table(CampaignMembers::Table)
                    .col(CampaignMembers::CampaignId)
                    .col(CampaignMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // characters
        manager
            .create_table(
                Table::create()
                    .table(Characters::Table)
                    .if_not_exists()
                    .col(id_col(Characters::Id))
                    .col(ColumnDef::new(Characters::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(Characters::OwnerUserId).big_integer().null())
                    .col(ColumnDef::new(Characters::Name).string().not_null())
                    .col(ColumnDef::new(Characters::Kind).string_len(8).not_null())
                    .col(ts_col(Characters::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_characters_campaign_id")
                            .from(Characters::Table, Characters::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_characters_owner_user_id")
                            .from(Characters::Table, Characters::OwnerUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // scenes
        manager
            .create_table(
                Table::create()
                    .table(Scenes::Table)
                    .if_not_exists()
                    .col(id_col(Scenes::Id))
                    .col(ColumnDef::new(Scenes::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(Scenes::Title).string().not_null())
                    .col(
                        ColumnDef::new(Scenes::IsArchived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ts_col(Scenes::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenes_campaign_id")
                            .from(Scenes::Table, Scenes::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_scenes_campaign_id")
                    .table(Scenes::Table)
                    .col(Scenes::CampaignId)
                    .to_owned(),
            )
            .await?;

        // scene_characters (roster)
        manager
            .create_table(
                Table::create()
                    .table(SceneCharacters::Table)
                    .if_not_exists()
                    .col(id_col(SceneCharacters::Id))
                    .col(ColumnDef::new(SceneCharacters::SceneId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SceneCharacters::CharacterId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SceneCharacters::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ts_col(SceneCharacters::JoinedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scene_characters_scene_id")
                            .from(SceneCharacters::Table, SceneCharacters::SceneId)
                            .to(Scenes::Table, Scenes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scene_characters_character_id")
                            .from(SceneCharacters::Table, SceneCharacters::CharacterId)
                            .to(Characters::Table, Characters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_scene_characters_scene_character")
                    .table(SceneCharacters::Table)
                    .col(SceneCharacters::SceneId)
                    .col(SceneCharacters::CharacterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // posts
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(id_col(Posts::Id))
                    .col(ColumnDef::new(Posts::SceneId).big_integer().not_null())
                    .col(ColumnDef::new(Posts::CharacterId).big_integer().null())
                    .col(ColumnDef::new(Posts::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Posts::Blocks).json().not_null())
                    .col(ColumnDef::new(Posts::OocText).text().null())
                    .col(ColumnDef::new(Posts::Witnesses).json().not_null())
                    .col(
                        ColumnDef::new(Posts::IsHidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Posts::IsDraft)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Posts::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Posts::AwaitingReveal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Posts::Intention).string().null())
                    .col(ColumnDef::new(Posts::Modifier).integer().null())
                    .col(
                        ColumnDef::new(Posts::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ts_col(Posts::CreatedAt))
                    .col(ts_col(Posts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_scene_id")
                            .from(Posts::Table, Posts::SceneId)
                            .to(Scenes::Table, Scenes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_character_id")
                            .from(Posts::Table, Posts::CharacterId)
                            .to(Characters::Table, Characters::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_user_id")
                            .from(Posts::Table, Posts::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_posts_scene_submitted")
                    .table(Posts::Table)
                    .col(Posts::SceneId)
                    .col(Posts::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        // compose_locks: at most one row per scene
        manager
            .create_table(
                Table::create()
                    .table(ComposeLocks::Table)
                    .if_not_exists()
                    .col(id_col(ComposeLocks::Id))
                    .col(ColumnDef::new(ComposeLocks::SceneId).big_integer().not_null())
                    .col(ColumnDef::new(ComposeLocks::CharacterId).big_integer().not_null())
                    .col(ColumnDef::new(ComposeLocks::UserId).big_integer().not_null())
                    .col(ts_col(ComposeLocks::AcquiredAt))
                    .col(ts_col(ComposeLocks::ExpiresAt))
                    .col(
                        ColumnDef::new(ComposeLocks::IsHidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_compose_locks_scene_id")
                            .from(ComposeLocks::Table, ComposeLocks::SceneId)
                            .to(Scenes::Table, Scenes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_compose_locks_character_id")
                            .from(ComposeLocks::Table, ComposeLocks::CharacterId)
                            .to(Characters::Table, Characters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_compose_locks_scene_id")
                    .table(ComposeLocks::Table)
                    .col(ComposeLocks::SceneId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // pass_states
        manager
            .create_table(
                Table::create()
                    .table(PassStates::Table)
                    .if_not_exists()
                    .col(id_col(PassStates::Id))
                    .col(ColumnDef::new(PassStates::SceneId).big_integer().not_null())
                    .col(ColumnDef::new(PassStates::CharacterId).big_integer().not_null())
                    .col(ColumnDef::new(PassStates::State).string_len(16).not_null())
                    .col(ts_col(PassStates::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pass_states_scene_id")
                            .from(PassStates::Table, PassStates::SceneId)
                            .to(Scenes::Table, Scenes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pass_states_character_id")
                            .from(PassStates::Table, PassStates::CharacterId)
                            .to(Characters::Table, Characters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_pass_states_scene_character")
                    .table(PassStates::Table)
                    .col(PassStates::SceneId)
                    .col(PassStates::CharacterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // rolls
        manager
            .create_table(
                Table::create()
                    .table(Rolls::Table)
                    .if_not_exists()
                    .col(id_col(Rolls::Id))
                    .col(ColumnDef::new(Rolls::PostId).big_integer().null())
                    .col(ColumnDef::new(Rolls::SceneId).big_integer().not_null())
                    .col(ColumnDef::new(Rolls::CharacterId).big_integer().not_null())
                    .col(ColumnDef::new(Rolls::RequestedBy).big_integer().not_null())
                    .col(ColumnDef::new(Rolls::Intention).string().not_null())
                    .col(ColumnDef::new(Rolls::OriginalIntention).string().null())
                    .col(ColumnDef::new(Rolls::Modifier).integer().not_null())
                    .col(ColumnDef::new(Rolls::DiceType).integer().not_null())
                    .col(ColumnDef::new(Rolls::DiceCount).integer().not_null())
                    .col(ColumnDef::new(Rolls::Result).json().not_null())
                    .col(ColumnDef::new(Rolls::Total).integer().null())
                    .col(
                        ColumnDef::new(Rolls::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Rolls::WasOverridden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Rolls::OverriddenBy).big_integer().null())
                    .col(ColumnDef::new(Rolls::OverrideReason).text().null())
                    .col(
                        ColumnDef::new(Rolls::OverriddenAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Rolls::ManualResult).integer().null())
                    .col(ColumnDef::new(Rolls::ManuallyResolvedBy).big_integer().null())
                    .col(ColumnDef::new(Rolls::ManualResolutionReason).text().null())
                    .col(ColumnDef::new(Rolls::InvalidatedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Rolls::InvalidatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Rolls::RolledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ts_col(Rolls::CreatedAt))
                    .col(ts_col(Rolls::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rolls_post_id")
                            .from(Rolls::Table, Rolls::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rolls_scene_id")
                            .from(Rolls::Table, Rolls::SceneId)
                            .to(Scenes::Table, Scenes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rolls_character_id")
                            .from(Rolls::Table, Rolls::CharacterId)
                            .to(Characters::Table, Characters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_rolls_scene_status")
                    .table(Rolls::Table)
                    .col(Rolls::SceneId)
                    .col(Rolls::Status)
                    .to_owned(),
            )
            .await?;

        // phase_transitions (audit)
        manager
            .create_table(
                Table::create()
                    .table(PhaseTransitions::Table)
                    .if_not_exists()
                    .col(id_col(PhaseTransitions::Id))
                    .col(
                        ColumnDef::new(PhaseTransitions::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhaseTransitions::FromPhase)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PhaseTransitions::ToPhase).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PhaseTransitions::TriggeredBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PhaseTransitions::Reason).string_len(16).not_null())
                    .col(ts_col(PhaseTransitions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phase_transitions_campaign_id")
                            .from(PhaseTransitions::Table, PhaseTransitions::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // reverse dependency order; indexes go with their tables
        manager
            .drop_table(Table::drop().table(PhaseTransitions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rolls::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PassStates::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComposeLocks::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SceneCharacters::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Scenes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Characters::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CampaignMembers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
