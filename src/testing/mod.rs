//! In-memory stand-ins for the Postgres repositories.
//!
//! They apply the same predicates as the SQL statements: single-todo
//! operations match on id and owner together, and a mutation that touches
//! no row reports not-found.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{JwtSettings, TokenIssuer, TokenValidator};
use crate::database::models::{Todo, User};
use crate::database::repository::{expect_affected, TodoRepository, UserRepository};
use crate::database::{DatabaseError, HealthCheck};
use crate::services::{AuthService, TodoService, UserService};
use crate::state::AppState;
use crate::types::TodoStatus;

pub const TEST_SECRET: &str = "test-secret";

pub fn jwt_settings() -> JwtSettings {
    JwtSettings::new(TEST_SECRET, Duration::from_secs(24 * 60 * 60))
}

#[derive(Default)]
pub struct MemoryUserRepository {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    fn update(&self, user_id: Uuid, apply: impl Fn(&mut User)) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let mut affected = 0;
        for user in rows.iter_mut().filter(|u| u.id == user_id) {
            apply(user);
            user.updated_at = Utc::now();
            affected += 1;
        }
        expect_affected(affected, DatabaseError::UserNotFound)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &mut User) -> Result<(), DatabaseError> {
        let now = Utc::now();
        user.created_at = now;
        user.updated_at = now;
        self.rows.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<User, DatabaseError> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(DatabaseError::UserNotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DatabaseError::UserNotFound)
    }

    async fn get_all_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut users = self.rows.lock().unwrap().clone();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn change_name(&self, new_name: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.update(user_id, |u| u.name = new_name.to_string())
    }

    async fn change_email(&self, new_email: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.update(user_id, |u| u.email = new_email.to_string())
    }

    async fn change_password(&self, new_password_hash: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.update(user_id, |u| u.password = new_password_hash.to_string())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|u| u.id != user_id);
        expect_affected((before - rows.len()) as u64, DatabaseError::UserNotFound)
    }
}

#[derive(Default)]
pub struct MemoryTodoRepository {
    rows: Mutex<Vec<Todo>>,
}

impl MemoryTodoRepository {
    /// Raw row lookup that ignores ownership, for asserting stored state
    pub fn stored(&self, todo_id: Uuid) -> Option<Todo> {
        self.rows.lock().unwrap().iter().find(|t| t.id == todo_id).cloned()
    }

    fn update(&self, todo_id: Uuid, user_id: Uuid, apply: impl Fn(&mut Todo)) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let mut affected = 0;
        for todo in rows.iter_mut().filter(|t| t.id == todo_id && t.user_id == user_id) {
            apply(todo);
            todo.updated_at = Utc::now();
            affected += 1;
        }
        expect_affected(affected, DatabaseError::TodoNotFound)
    }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn create(&self, todo: &mut Todo) -> Result<(), DatabaseError> {
        let now = Utc::now();
        todo.created_at = now;
        todo.updated_at = now;
        self.rows.lock().unwrap().push(todo.clone());
        Ok(())
    }

    async fn get_todos_by_user_id(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError> {
        let mut todos: Vec<Todo> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    async fn get_todo_by_user_id(&self, todo_id: Uuid, user_id: Uuid) -> Result<Todo, DatabaseError> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|t| t.id == todo_id && t.user_id == user_id)
            .cloned()
            .ok_or(DatabaseError::TodoNotFound)
    }

    async fn update_status(&self, status: TodoStatus, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        self.update(todo_id, user_id, |t| t.status = status)
    }

    async fn update_content(&self, content: &str, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        self.update(todo_id, user_id, |t| t.content = content.to_string())
    }

    async fn delete(&self, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| !(t.id == todo_id && t.user_id == user_id));
        expect_affected((before - rows.len()) as u64, DatabaseError::TodoNotFound)
    }
}

pub struct AlwaysHealthy;

#[async_trait]
impl HealthCheck for AlwaysHealthy {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Application state wired to in-memory stores, plus handles to inspect them
pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUserRepository>,
    pub todos: Arc<MemoryTodoRepository>,
    pub issuer: Arc<TokenIssuer>,
}

impl TestApp {
    pub fn new() -> Self {
        let settings = jwt_settings();
        let users = Arc::new(MemoryUserRepository::default());
        let todos = Arc::new(MemoryTodoRepository::default());
        let issuer = Arc::new(TokenIssuer::new(&settings));

        let state = AppState {
            auth: Arc::new(AuthService::new(users.clone(), issuer.clone())),
            users: Arc::new(UserService::new(users.clone())),
            todos: Arc::new(TodoService::new(todos.clone())),
            validator: Arc::new(TokenValidator::new(&settings)),
            health: Arc::new(AlwaysHealthy),
        };

        Self { state, users, todos, issuer }
    }

    pub fn token_for(&self, user_id: Uuid, email: &str) -> String {
        self.issuer.issue(user_id, email).unwrap().token
    }
}
