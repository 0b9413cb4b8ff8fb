pub mod task;
pub mod user;

pub use task::{StatusUpdate, Task, TaskInput, TaskPatch, TaskPriority, TaskQuery, TaskStatus};
pub use user::{Account, CreateAccountRequest, Role, UpdateDetailsRequest};
