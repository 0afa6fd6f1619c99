//! SeaORM adapter for users.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set};
use time::OffsetDateTime;

use crate::entities::users;

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<users::Model>, sea_orm::DbErr> {
    users::Entity::find_by_id(user_id).one(conn).await
}

pub async fn find_by_sub<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    sub: &str,
) -> Result<Option<users::Model>, sea_orm::DbErr> {
    users::Entity::find()
        .filter(users::Column::Sub.eq(sub))
        .one(conn)
        .await
}

pub async fn create_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    sub: &str,
    email: Option<&str>,
    username: Option<&str>,
    now: OffsetDateTime,
) -> Result<users::Model, sea_orm::DbErr> {
    users::ActiveModel {
        id: NotSet,
        sub: Set(sub.to_string()),
        email: Set(email.map(str::to_string)),
        username: Set(username.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}
