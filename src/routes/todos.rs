use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{StatusUpdate, Task, TaskInput, TaskPatch, TaskQuery, TaskStatus},
    policy,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, owner_id, created_at, updated_at";

/// Fetches a task and checks the caller may act on it.
/// 404 when the id does not resolve, 403 when the policy denies.
async fn load_authorized(
    pool: &PgPool,
    task_id: Uuid,
    user: &CurrentUser,
) -> Result<Task, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1",
        TASK_COLUMNS
    ))
    .bind(task_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Todo not found with id of {}", task_id)))?;

    if !policy::can_access_task(&user.0, &task) {
        return Err(AppError::Forbidden(
            "User not authorized to access this todo".into(),
        ));
    }

    Ok(task)
}

/// Lists the caller's own tasks, newest first.
///
/// Optional filters: exact status match (unknown status strings are ignored)
/// and a case-insensitive substring search over title or description.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let status: Option<TaskStatus> = query_params
        .status
        .as_deref()
        .and_then(|s| s.parse().ok());

    let mut sql = format!("SELECT {} FROM tasks WHERE owner_id = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if status.is_some() {
        sql.push_str(&format!(" AND status = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        sql.push_str(&format!(
            " AND (title ILIKE ${} OR description ILIKE ${})",
            param_count,
            param_count + 1
        ));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query_as::<_, Task>(&sql).bind(user.0.id);
    if let Some(status) = status {
        query = query.bind(status);
    }
    if let Some(search) = &query_params.search {
        let pattern = format!("%{}%", search);
        query = query.bind(pattern.clone()).bind(pattern);
    }

    let tasks = query.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": tasks.len(),
        "data": tasks
    })))
}

/// Creates a task owned by the caller.
///
/// Status always starts as `pending`, and ownership is forced to the
/// authenticated account; neither can be supplied by the client.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    payload: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let task = Task::new(payload.into_inner(), user.0.id);

    let created = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, title, description, status, priority, due_date, owner_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(task.owner_id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": created
    })))
}

/// Fetches a single task. Owner or admin only.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = load_authorized(&pool, task_id.into_inner(), &user).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": task
    })))
}

/// Partially updates a task. Owner or admin only.
///
/// `TaskPatch` has no owner field, so ownership cannot change here no matter
/// what the request body contains.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    payload: web::Json<TaskPatch>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let task = load_authorized(&pool, task_id.into_inner(), &user).await?;

    let updated = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks \
         SET title = COALESCE($1, title), \
             description = COALESCE($2, description), \
             priority = COALESCE($3, priority), \
             status = COALESCE($4, status), \
             due_date = COALESCE($5, due_date), \
             updated_at = now() \
         WHERE id = $6 \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.priority)
    .bind(payload.status)
    .bind(payload.due_date)
    .bind(task.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": updated
    })))
}

/// Hard-deletes a task. Owner or admin only.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = load_authorized(&pool, task_id.into_inner(), &user).await?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {}
    })))
}

/// Changes a task's status. Owner or admin only.
///
/// The status arrives as a plain string; anything outside
/// {pending, in-progress, completed} is a 400. Setting a status the task
/// already has succeeds and leaves the task unchanged apart from
/// `updated_at`.
#[patch("/{id}/status")]
pub async fn set_status(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    payload: web::Json<StatusUpdate>,
) -> Result<impl Responder, AppError> {
    let status: TaskStatus = payload
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::BadRequest("Please provide a valid status".into()))?;

    let task = load_authorized(&pool, task_id.into_inner(), &user).await?;

    let updated = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET status = $1, updated_at = now() WHERE id = $2 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(status)
    .bind(task.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": updated
    })))
}
