use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use sea_orm::ConnectionTrait;

use crate::db::require_db;
use crate::db::txn::SharedTxn;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::current_user::CurrentUser;
use crate::repos::campaigns::{self, Membership};
use crate::state::app_state::AppState;

/// `{campaign_id}` from the path plus the caller's membership in it.
///
/// Fails 403 `NOT_A_MEMBER` for outsiders and 404 for unknown campaigns.
#[derive(Debug, Clone)]
pub struct CampaignMembership {
    pub campaign_id: i64,
    pub user: CurrentUser,
    pub membership: Membership,
}

impl CampaignMembership {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

fn campaign_id_from_path(req: &HttpRequest) -> Result<i64, AppError> {
    let raw = req
        .match_info()
        .get("campaign_id")
        .ok_or_else(|| AppError::internal("route has no {campaign_id} segment"))?;
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            AppError::bad_request(
                ErrorCode::InvalidCampaignId,
                format!("Invalid campaign id: {raw}"),
            )
        })
}

impl FromRequest for CampaignMembership {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let user_fut = CurrentUser::from_request(&req, payload);

        Box::pin(async move {
            let campaign_id = campaign_id_from_path(&req)?;
            let user = user_fut.await?;
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available"))?;

            let membership = match SharedTxn::from_req(&req) {
                Some(shared) => {
                    lookup_membership(shared.transaction(), campaign_id, user.id).await?
                }
                None => lookup_membership(require_db(state)?, campaign_id, user.id).await?,
            };

            Ok(CampaignMembership {
                campaign_id,
                user,
                membership,
            })
        })
    }
}

async fn lookup_membership<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
) -> Result<Membership, AppError> {
    campaigns::require_campaign(conn, campaign_id).await?;
    campaigns::find_membership(conn, campaign_id, user_id)
        .await?
        .ok_or_else(|| {
            AppError::forbidden(
                ErrorCode::NotAMember,
                format!("Not a member of campaign {campaign_id}"),
            )
        })
}
