use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Todo, User};
use crate::types::TodoStatus;

pub mod todo;
pub mod user;

pub use todo::PgTodoRepository;
pub use user::PgUserRepository;

/// Persistence for user accounts.
///
/// Mutations address a single row by id and report `UserNotFound` when the
/// statement touched nothing.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert `user` and write the generated timestamps back into it
    async fn create(&self, user: &mut User) -> Result<(), DatabaseError>;
    async fn get_by_id(&self, user_id: Uuid) -> Result<User, DatabaseError>;
    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError>;
    async fn get_all_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn change_name(&self, new_name: &str, user_id: Uuid) -> Result<(), DatabaseError>;
    async fn change_email(&self, new_email: &str, user_id: Uuid) -> Result<(), DatabaseError>;
    async fn change_password(&self, new_password_hash: &str, user_id: Uuid) -> Result<(), DatabaseError>;
    async fn delete(&self, user_id: Uuid) -> Result<(), DatabaseError>;
}

/// Persistence for todo items.
///
/// Every single-item operation is scoped by `(todo_id, user_id)`. A todo
/// owned by another user is indistinguishable from one that does not exist.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, todo: &mut Todo) -> Result<(), DatabaseError>;
    async fn get_todos_by_user_id(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError>;
    async fn get_todo_by_user_id(&self, todo_id: Uuid, user_id: Uuid) -> Result<Todo, DatabaseError>;
    async fn update_status(&self, status: TodoStatus, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError>;
    async fn update_content(&self, content: &str, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError>;
    async fn delete(&self, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError>;
}

/// Zero affected rows means the target was absent (or not owned by the caller)
pub fn expect_affected(rows: u64, not_found: DatabaseError) -> Result<(), DatabaseError> {
    if rows == 0 {
        Err(not_found)
    } else {
        Ok(())
    }
}
