use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum; the wire form uses
/// hyphenated names ("in-progress") to match the stored values.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

/// Parses the wire form of a status. The status-change endpoint accepts the
/// status as a plain string so that unknown values produce a 400 with a clear
/// message instead of a generic deserialization error.
impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(()),
        }
    }
}

/// Input structure for creating a task.
///
/// There is no status field: new tasks always start as `pending`. There is no
/// owner field either; ownership is taken from the authenticated caller.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// The title of the task. Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description, up to 1000 characters.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// The priority of the task. Defaults to medium when omitted.
    pub priority: Option<TaskPriority>,

    /// Optional due date for the task.
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update for an existing task. Only supplied fields change.
///
/// Ownership is immutable by construction: this type has no owner field, so a
/// patch cannot transfer a task to another account no matter what the request
/// body contains.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Represents a task entity as stored in the database and returned by the API.
/// Serialized field names follow the JSON contract (`ownerId`, `dueDate`);
/// `FromRow` maps from the snake_case column names.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    /// Identifier of the account that owns the task. Set once at creation.
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    /// Filter by exact status. Unrecognized values are ignored rather than
    /// rejected, matching the lenient filter behavior of the UI.
    pub status: Option<String>,
    /// Case-insensitive substring match against title or description.
    pub search: Option<String>,
}

/// Body of the status-change endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the caller's account id.
    /// Status always initializes to `pending`; priority defaults to medium.
    pub fn new(input: TaskInput, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: TaskStatus::Pending,
            priority: input.priority.unwrap_or(TaskPriority::Medium),
            due_date: input.due_date,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}
