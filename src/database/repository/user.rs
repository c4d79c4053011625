use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::{expect_affected, UserRepository};
use crate::database::manager::DatabaseError;
use crate::database::models::User;
use crate::database::query_builder::{QueryBuildError, SqlResult, Statement};

const TABLE: &str = "users";
const COLUMNS: &[&str] = &["id", "name", "email", "password", "created_at", "updated_at"];
const GENERATED: &[&str] = &["id", "created_at", "updated_at"];

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn mutate(&self, operation: &'static str, user_id: Uuid, sql: Result<SqlResult, QueryBuildError>) -> Result<(), DatabaseError> {
        let sql = sql.map_err(|e| {
            error!(operation, %user_id, error = %e, "failed to build statement");
            DatabaseError::from(e)
        })?;

        let rows = sql.execute(&self.pool).await.map_err(|e| {
            error!(operation, %user_id, error = %e, "statement failed");
            DatabaseError::storage(operation)(e)
        })?;

        if rows == 0 {
            debug!(operation, %user_id, "no user row affected");
        }
        expect_affected(rows, DatabaseError::UserNotFound)
    }

    async fn fetch_user(&self, operation: &'static str, sql: SqlResult) -> Result<User, DatabaseError> {
        sql.fetch_optional::<User>(&self.pool)
            .await
            .map_err(|e| {
                error!(operation, error = %e, "query failed");
                DatabaseError::storage(operation)(e)
            })?
            .ok_or(DatabaseError::UserNotFound)
    }
}

fn insert_statement(user: &User) -> Result<SqlResult, QueryBuildError> {
    Statement::insert(TABLE)
        .value("id", user.id)
        .value("name", user.name.as_str())
        .value("email", user.email.as_str())
        .value("password", user.password.as_str())
        .returning(GENERATED)
        .to_sql()
}

fn select_by_id_statement(user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::select(TABLE, COLUMNS).where_eq("id", user_id).to_sql()
}

fn select_by_email_statement(email: &str) -> Result<SqlResult, QueryBuildError> {
    Statement::select(TABLE, COLUMNS).where_eq("email", email).to_sql()
}

fn select_all_statement() -> Result<SqlResult, QueryBuildError> {
    Statement::select(TABLE, COLUMNS).order_by("email").to_sql()
}

fn update_column_statement(column: &'static str, value: &str, user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::update(TABLE)
        .set(column, value)
        .set_now("updated_at")
        .where_eq("id", user_id)
        .to_sql()
}

fn delete_statement(user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::delete(TABLE).where_eq("id", user_id).to_sql()
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &mut User) -> Result<(), DatabaseError> {
        let sql = insert_statement(user)?;
        let (id, created_at, updated_at) = sql
            .fetch_one::<(Uuid, DateTime<Utc>, DateTime<Utc>)>(&self.pool)
            .await
            .map_err(|e| {
                error!(operation = "create user", user_id = %user.id, error = %e, "insert failed");
                DatabaseError::storage("create user")(e)
            })?;

        user.id = id;
        user.created_at = created_at;
        user.updated_at = updated_at;
        Ok(())
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<User, DatabaseError> {
        self.fetch_user("get user by id", select_by_id_statement(user_id)?).await
    }

    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        self.fetch_user("get user by email", select_by_email_statement(email)?).await
    }

    async fn get_all_users(&self) -> Result<Vec<User>, DatabaseError> {
        select_all_statement()?.fetch_all::<User>(&self.pool).await.map_err(|e| {
            error!(operation = "get all users", error = %e, "query failed");
            DatabaseError::storage("get all users")(e)
        })
    }

    async fn change_name(&self, new_name: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.mutate("update name", user_id, update_column_statement("name", new_name, user_id))
            .await
    }

    async fn change_email(&self, new_email: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.mutate("update email", user_id, update_column_statement("email", new_email, user_id))
            .await
    }

    async fn change_password(&self, new_password_hash: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.mutate(
            "update password",
            user_id,
            update_column_statement("password", new_password_hash, user_id),
        )
        .await
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        self.mutate("delete user", user_id, delete_statement(user_id)).await
    }
}
