use std::sync::Arc;

use crate::auth::{JwtSettings, TokenIssuer, TokenValidator};
use crate::database::{Database, HealthCheck, PgTodoRepository, PgUserRepository};
use crate::services::{AuthService, TodoService, UserService};

/// Everything a handler can reach; cloning copies `Arc` handles only
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub todos: Arc<TodoService>,
    pub validator: Arc<TokenValidator>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    /// Wire the Postgres-backed services; issuer and validator share one set of settings
    pub fn new(database: Database, jwt: &JwtSettings) -> Self {
        let user_repo = Arc::new(PgUserRepository::new(database.pool().clone()));
        let todo_repo = Arc::new(PgTodoRepository::new(database.pool().clone()));
        let issuer = Arc::new(TokenIssuer::new(jwt));

        Self {
            auth: Arc::new(AuthService::new(user_repo.clone(), issuer)),
            users: Arc::new(UserService::new(user_repo)),
            todos: Arc::new(TodoService::new(todo_repo)),
            validator: Arc::new(TokenValidator::new(jwt)),
            health: Arc::new(database),
        }
    }
}
