use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{ServiceError, Validator};
use crate::database::models::Todo;
use crate::database::TodoRepository;
use crate::dto::{ChangeContentRequest, ChangeStatusRequest, CreateTodoRequest, TodoResponse};
use crate::middleware::auth::Identity;

/// Todo operations on behalf of an authenticated caller.
///
/// The caller's `user_id` is always passed down as the ownership predicate.
pub struct TodoService {
    todos: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoRepository>) -> Self {
        Self { todos }
    }

    pub async fn create_todo(&self, identity: &Identity, request: CreateTodoRequest) -> Result<TodoResponse, ServiceError> {
        let status = request.status.unwrap_or_default();
        Validator::new()
            .required("content", &request.content)
            .initial_status("status", status)
            .finish()?;

        let mut todo = Todo::new(Uuid::new_v4(), identity.user_id, request.content, status);
        self.todos.create(&mut todo).await?;

        info!(todo_id = %todo.id, user_id = %identity.user_id, "todo created");
        Ok(TodoResponse::from(&todo))
    }

    pub async fn get_todos(&self, identity: &Identity) -> Result<Vec<TodoResponse>, ServiceError> {
        let todos = self.todos.get_todos_by_user_id(identity.user_id).await?;
        Ok(todos.iter().map(TodoResponse::from).collect())
    }

    pub async fn get_todo(&self, identity: &Identity, todo_id: Uuid) -> Result<TodoResponse, ServiceError> {
        let todo = self.todos.get_todo_by_user_id(todo_id, identity.user_id).await?;
        Ok(TodoResponse::from(&todo))
    }

    pub async fn change_content(
        &self,
        identity: &Identity,
        todo_id: Uuid,
        request: ChangeContentRequest,
    ) -> Result<(), ServiceError> {
        Validator::new().required("content", &request.content).finish()?;
        self.todos
            .update_content(&request.content, todo_id, identity.user_id)
            .await?;
        Ok(())
    }

    pub async fn change_status(
        &self,
        identity: &Identity,
        todo_id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<(), ServiceError> {
        self.todos
            .update_status(request.status, todo_id, identity.user_id)
            .await?;
        Ok(())
    }

    pub async fn delete_todo(&self, identity: &Identity, todo_id: Uuid) -> Result<(), ServiceError> {
        self.todos.delete(todo_id, identity.user_id).await?;
        info!(%todo_id, user_id = %identity.user_id, "todo deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use crate::testing::MemoryTodoRepository;
    use crate::types::TodoStatus;

    fn identity() -> Identity {
        Identity { user_id: Uuid::new_v4(), email: "owner@mail.ru".into() }
    }

    fn create(content: &str) -> CreateTodoRequest {
        CreateTodoRequest { content: content.into(), status: None }
    }

    #[tokio::test]
    async fn create_defaults_to_todo_status() {
        let todos = Arc::new(MemoryTodoRepository::default());
        let service = TodoService::new(todos.clone());
        let owner = identity();

        let created = service.create_todo(&owner, create("buy milk")).await.unwrap();
        assert_eq!(created.status, TodoStatus::Todo);

        let stored = todos.stored(created.id).unwrap();
        assert_eq!(stored.user_id, owner.user_id);
        assert!(stored.created_at.timestamp() > 0);
    }

    #[tokio::test]
    async fn create_rejects_done_and_blank_content() {
        let service = TodoService::new(Arc::new(MemoryTodoRepository::default()));
        let owner = identity();

        let err = service
            .create_todo(&owner, CreateTodoRequest { content: "x".into(), status: Some(TodoStatus::Done) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.has_field("status")));

        let err = service.create_todo(&owner, create("  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.has_field("content")));
    }

    #[tokio::test]
    async fn other_users_todo_is_not_found_and_untouched() {
        let todos = Arc::new(MemoryTodoRepository::default());
        let service = TodoService::new(todos.clone());
        let (owner, intruder) = (identity(), identity());

        let created = service.create_todo(&owner, create("private")).await.unwrap();

        let err = service
            .change_status(&intruder, created.id, ChangeStatusRequest { status: TodoStatus::Done })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Database(DatabaseError::TodoNotFound)));

        let err = service.get_todo(&intruder, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Database(DatabaseError::TodoNotFound)));

        let err = service.delete_todo(&intruder, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Database(DatabaseError::TodoNotFound)));

        let stored = todos.stored(created.id).unwrap();
        assert_eq!(stored.status, TodoStatus::Todo);
        assert_eq!(stored.content, "private");
    }

    #[tokio::test]
    async fn owner_can_update_and_delete() {
        let service = TodoService::new(Arc::new(MemoryTodoRepository::default()));
        let owner = identity();
        let created = service.create_todo(&owner, create("draft")).await.unwrap();

        service
            .change_content(&owner, created.id, ChangeContentRequest { content: "final".into() })
            .await
            .unwrap();
        service
            .change_status(&owner, created.id, ChangeStatusRequest { status: TodoStatus::Done })
            .await
            .unwrap();

        let fetched = service.get_todo(&owner, created.id).await.unwrap();
        assert_eq!(fetched.content, "final");
        assert_eq!(fetched.status, TodoStatus::Done);

        service.delete_todo(&owner, created.id).await.unwrap();
        assert!(service.get_todos(&owner).await.unwrap().is_empty());
    }
}
