use crate::{
    auth::{
        hash_password, verify_password, CurrentUser, LoginRequest, RegisterRequest,
        RegisteredAccount, ResetPasswordRequest, TokenService, UpdatePasswordRequest,
    },
    error::AppError,
    models::{Account, Role},
    policy,
};
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    post, put, web, HttpResponse, Responder,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new account.
///
/// Self-registration can never grant elevated privilege: a requested `admin`
/// role is silently stored as `user`. The email pre-check gives a friendly
/// error in the common case, but the real uniqueness enforcement is the
/// database constraint; a concurrent registration that loses the race still
/// comes back as the same 400 via the unique-violation mapping in `AppError`.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let existing = sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM accounts WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&**pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::BadRequest(
            "User with this email already exists".into(),
        ));
    }

    let role = match payload.role {
        Some(Role::Admin) | None => Role::User,
        Some(other) => other,
    };

    let password_hash = hash_password(&payload.password)?;

    let account = sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (id, name, email, password_hash, phone, role) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, name, email, password_hash, phone, role, created_at, updated_at",
    )
    .bind(uuid::Uuid::new_v4())
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.phone)
    .bind(role)
    .fetch_one(&**pool)
    .await?;

    let token = tokens.issue(account.id)?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": RegisteredAccount {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            phone: account.phone,
            token,
        }
    })))
}

/// Log in with email and password.
///
/// The two failure modes are reported distinctly ("No Email found" vs
/// "Invalid credentials"). That asymmetry is an account-enumeration weakness
/// in the existing contract; it is kept on purpose pending product sign-off.
///
/// On success the token is also set as an `access_token` cookie: secure,
/// http-only, same-site strict, with a 7-day lifetime.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let account = sqlx::query_as::<_, Account>(
        "SELECT id, name, email, password_hash, phone, role, created_at, updated_at \
         FROM accounts WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::Unauthorized("No Email found".into()))?;

    if !verify_password(&payload.password, &account.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = tokens.issue(account.id)?;

    let cookie = Cookie::build("access_token", token.clone())
        .secure(true)
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::days(7))
        .path("/")
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(json!({
        "user": account,
        "token": token
    })))
}

/// Change the authenticated account's password.
///
/// Requires the current password to verify; on success a fresh token is
/// returned. Previously issued tokens are not revoked and stay valid until
/// their own expiry.
#[put("/updatepassword")]
pub async fn update_password(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    user: CurrentUser,
    payload: web::Json<UpdatePasswordRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    if !verify_password(&payload.current_password, &user.0.password_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    let password_hash = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE accounts SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(&password_hash)
        .bind(user.0.id)
        .execute(&**pool)
        .await?;

    let token = tokens.issue(user.0.id)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "token": token }
    })))
}

/// Admin-only: reset an account's password by email, without the current one.
#[put("/resetpassword")]
pub async fn reset_password(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    if !policy::can_manage_accounts(&user.0) {
        return Err(AppError::Forbidden(format!(
            "User role {} is not authorized to perform this action",
            user.0.role
        )));
    }

    let password_hash = hash_password(&payload.new_password)?;

    let result = sqlx::query("UPDATE accounts SET password_hash = $1, updated_at = now() WHERE email = $2")
        .bind(&password_hash)
        .bind(&payload.email)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": "Password has been reset successfully"
    })))
}
