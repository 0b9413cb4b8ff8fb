use crate::{
    auth::{hash_password, CurrentUser},
    error::AppError,
    models::{Account, CreateAccountRequest, Role, UpdateDetailsRequest},
    policy,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, phone, role, created_at, updated_at";

fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if policy::can_manage_accounts(&user.0) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User role {} is not authorized to perform this action",
            user.0.role
        )))
    }
}

/// Returns the authenticated account's own profile.
/// The password hash is excluded by the `Account` serializer.
#[get("/me")]
pub async fn me(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(user.0))
}

/// Partial update of the caller's profile. Only supplied fields change.
///
/// Changing the email to one held by a *different* account is rejected; the
/// unique index backs this up against concurrent updates.
#[put("/details")]
pub async fn update_details(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    payload: web::Json<UpdateDetailsRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    if let Some(email) = &payload.email {
        let taken = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM accounts WHERE email = $1 AND id <> $2",
        )
        .bind(email)
        .bind(user.0.id)
        .fetch_optional(&**pool)
        .await?;

        if taken.is_some() {
            return Err(AppError::BadRequest("Email is already in use".into()));
        }
    }

    let updated = sqlx::query_as::<_, Account>(&format!(
        "UPDATE accounts \
         SET name = COALESCE($1, name), \
             email = COALESCE($2, email), \
             phone = COALESCE($3, phone), \
             updated_at = now() \
         WHERE id = $4 \
         RETURNING {}",
        ACCOUNT_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(user.0.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": updated
    })))
}

/// Admin-only: create an account with an arbitrary role.
#[post("")]
pub async fn create_account(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    payload: web::Json<CreateAccountRequest>,
) -> Result<impl Responder, AppError> {
    require_admin(&user)?;
    payload.validate()?;

    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&**pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::BadRequest(
            "User with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;

    let account = sqlx::query_as::<_, Account>(&format!(
        "INSERT INTO accounts (id, name, email, password_hash, phone, role) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {}",
        ACCOUNT_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.phone)
    .bind(payload.role.unwrap_or(Role::User))
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": account
    })))
}

/// Admin-only: list every account.
#[get("/all")]
pub async fn list_accounts(
    pool: web::Data<PgPool>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    require_admin(&user)?;

    let accounts = sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM accounts ORDER BY created_at DESC",
        ACCOUNT_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": accounts
    })))
}

/// Admin-only: fetch one account by id.
#[get("/{id}")]
pub async fn get_account(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    account_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    require_admin(&user)?;

    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM accounts WHERE id = $1",
        ACCOUNT_COLUMNS
    ))
    .bind(account_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": account
    })))
}

/// Admin-only: delete an account and cascade-delete its tasks.
///
/// Self-deletion is refused for any role. The store has no foreign-key
/// cascade, so the task cleanup happens here, in the same transaction as the
/// account delete, so tasks are never orphaned even if the process dies midway.
#[delete("/{id}")]
pub async fn delete_account(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    account_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    require_admin(&user)?;
    let target_id = account_id.into_inner();

    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE id = $1")
        .bind(target_id)
        .fetch_optional(&**pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    if !policy::can_delete_account(&user.0, target_id) {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
        .bind(target_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(target_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {}
    })))
}
