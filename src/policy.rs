//!
//! # Authorization Policy
//!
//! Every authorization decision in the application goes through the pure
//! functions in this module. They take the caller's account and the target
//! entity and return a plain bool, with no database access and no hidden
//! state, so the whole access-control surface is testable in isolation and
//! auditable in one place.

use crate::models::{Account, Role, Task};
use uuid::Uuid;

/// Whether `account` may read, update, delete, or change the status of `task`.
/// True iff the account owns the task or holds the admin role. The same rule
/// applies uniformly to all task actions.
pub fn can_access_task(account: &Account, task: &Task) -> bool {
    account.id == task.owner_id || account.role == Role::Admin
}

/// Whether `account` may list accounts, create accounts with an arbitrary
/// role, or delete other accounts. Admin only.
pub fn can_manage_accounts(account: &Account) -> bool {
    account.role == Role::Admin
}

/// Whether `caller` may delete the account identified by `target_id`.
///
/// Requires the admin role, and an account may never delete itself, even an
/// admin.
pub fn can_delete_account(caller: &Account, target_id: Uuid) -> bool {
    caller.role == Role::Admin && caller.id != target_id
}
