use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use serde::Serialize;

use crate::auth::claims::BackendClaims;
use crate::db::require_db;
use crate::db::txn::SharedTxn;
use crate::error::AppError;
use crate::repos::users;
use crate::state::app_state::AppState;

/// The authenticated caller, resolved from the JWT `sub` that `JwtExtract`
/// left in request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub sub: String,
    pub email: String,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let claims = req
                .extensions()
                .get::<BackendClaims>()
                .cloned()
                .ok_or_else(AppError::unauthorized_missing_bearer)?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available"))?;

            let user = match SharedTxn::from_req(&req) {
                Some(shared) => users::find_by_sub(shared.transaction(), &claims.sub).await?,
                None => users::find_by_sub(require_db(state)?, &claims.sub).await?,
            }
            .ok_or_else(AppError::forbidden_user_not_found)?;

            Ok(CurrentUser {
                id: user.id,
                sub: claims.sub,
                email: claims.email,
            })
        })
    }
}
