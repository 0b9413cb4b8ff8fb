use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::Account;

/// Extracts the authenticated account from request extensions.
///
/// Intended for routes protected by `AuthMiddleware`, which validates the
/// session token and inserts the resolved `Account`. If no account is present
/// (middleware not applied, or an internal wiring error), this extractor
/// rejects with 401 rather than panicking.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Account);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Account>().cloned() {
            Some(account) => ready(Ok(CurrentUser(account))),
            None => {
                let err = AppError::Unauthorized(
                    "Not authorized to access this route".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}
