use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::models::Account;

/// The one message every authentication failure produces, so a caller cannot
/// tell a missing token from a bad signature from a deleted account.
const REJECTION: &str = "Not authorized to access this route";

/// Authentication gate for the `/api` scope.
///
/// Extracts a session token from the `access_token` cookie (checked first) or
/// the `Authorization: Bearer` header, verifies it, and resolves the embedded
/// account id against the database. On success the full `Account` is inserted
/// into request extensions for the `CurrentUser` extractor. Login and
/// registration are the only paths allowed through without a token.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    // Rc because the account lookup forces the whole call into one async
    // block, which needs its own handle on the inner service.
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            // Login and registration must be reachable without a token.
            let path = req.path();
            if path.starts_with("/api/auth/login") || path.starts_with("/api/auth/register") {
                return Ok(service.call(req).await?.map_into_left_body());
            }

            match authenticate(&req).await {
                Ok(account) => {
                    req.extensions_mut().insert(account);
                    Ok(service.call(req).await?.map_into_left_body())
                }
                Err(app_err) => {
                    let res = app_err.error_response();
                    Ok(req.into_response(res).map_into_right_body())
                }
            }
        })
    }
}

/// Resolves the request's token to an account, or rejects with a generic 401.
async fn authenticate(req: &ServiceRequest) -> Result<Account, AppError> {
    let token = req
        .cookie("access_token")
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or_else(|| AppError::Unauthorized(REJECTION.into()))?;

    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::InternalServerError("TokenService not configured".into()))?;
    let pool = req
        .app_data::<web::Data<PgPool>>()
        .ok_or_else(|| AppError::InternalServerError("Database pool not configured".into()))?;

    let claims = tokens
        .verify(&token)
        .map_err(|_| AppError::Unauthorized(REJECTION.into()))?;

    let account = sqlx::query_as::<_, Account>(
        "SELECT id, name, email, password_hash, phone, role, created_at, updated_at \
         FROM accounts WHERE id = $1",
    )
    .bind(claims.sub)
    .fetch_optional(pool.get_ref())
    .await?;

    // A valid token for a deleted account gets the same rejection as a bad
    // token; the gate must not reveal which check failed.
    account.ok_or_else(|| AppError::Unauthorized(REJECTION.into()))
}
