use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::{expect_affected, TodoRepository};
use crate::database::manager::DatabaseError;
use crate::database::models::Todo;
use crate::database::query_builder::{QueryBuildError, SqlResult, Statement};
use crate::types::TodoStatus;

const TABLE: &str = "todos";
const COLUMNS: &[&str] = &["id", "user_id", "content", "status", "created_at", "updated_at"];

#[derive(Clone)]
pub struct PgTodoRepository {
    pool: PgPool,
}

impl PgTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn mutate(
        &self,
        operation: &'static str,
        todo_id: Uuid,
        user_id: Uuid,
        sql: Result<SqlResult, QueryBuildError>,
    ) -> Result<(), DatabaseError> {
        let sql = sql.map_err(|e| {
            error!(operation, %todo_id, %user_id, error = %e, "failed to build statement");
            DatabaseError::from(e)
        })?;

        let rows = sql.execute(&self.pool).await.map_err(|e| {
            error!(operation, %todo_id, %user_id, error = %e, "statement failed");
            DatabaseError::storage(operation)(e)
        })?;

        if rows == 0 {
            debug!(operation, %todo_id, %user_id, "no todo row matched id and owner");
        }
        expect_affected(rows, DatabaseError::TodoNotFound)
    }
}

fn insert_statement(todo: &Todo) -> Result<SqlResult, QueryBuildError> {
    Statement::insert(TABLE)
        .value("id", todo.id)
        .value("user_id", todo.user_id)
        .value("content", todo.content.as_str())
        .value("status", todo.status)
        .returning(&["id", "created_at", "updated_at"])
        .to_sql()
}

fn select_for_user_statement(user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::select(TABLE, COLUMNS)
        .where_eq("user_id", user_id)
        .order_by("created_at")
        .to_sql()
}

fn select_one_statement(todo_id: Uuid, user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::select(TABLE, COLUMNS)
        .where_eq("id", todo_id)
        .where_eq("user_id", user_id)
        .to_sql()
}

fn update_status_statement(status: TodoStatus, todo_id: Uuid, user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::update(TABLE)
        .set("status", status)
        .set_now("updated_at")
        .where_eq("id", todo_id)
        .where_eq("user_id", user_id)
        .to_sql()
}

fn update_content_statement(content: &str, todo_id: Uuid, user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::update(TABLE)
        .set("content", content)
        .set_now("updated_at")
        .where_eq("id", todo_id)
        .where_eq("user_id", user_id)
        .to_sql()
}

fn delete_statement(todo_id: Uuid, user_id: Uuid) -> Result<SqlResult, QueryBuildError> {
    Statement::delete(TABLE)
        .where_eq("id", todo_id)
        .where_eq("user_id", user_id)
        .to_sql()
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn create(&self, todo: &mut Todo) -> Result<(), DatabaseError> {
        let sql = insert_statement(todo)?;
        let (id, created_at, updated_at) = sql
            .fetch_one::<(Uuid, DateTime<Utc>, DateTime<Utc>)>(&self.pool)
            .await
            .map_err(|e| {
                error!(operation = "create todo", todo_id = %todo.id, user_id = %todo.user_id, error = %e, "insert failed");
                DatabaseError::storage("create todo")(e)
            })?;

        todo.id = id;
        todo.created_at = created_at;
        todo.updated_at = updated_at;
        Ok(())
    }

    async fn get_todos_by_user_id(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError> {
        select_for_user_statement(user_id)?
            .fetch_all::<Todo>(&self.pool)
            .await
            .map_err(|e| {
                error!(operation = "get todos", %user_id, error = %e, "query failed");
                DatabaseError::storage("get todos")(e)
            })
    }

    async fn get_todo_by_user_id(&self, todo_id: Uuid, user_id: Uuid) -> Result<Todo, DatabaseError> {
        select_one_statement(todo_id, user_id)?
            .fetch_optional::<Todo>(&self.pool)
            .await
            .map_err(|e| {
                error!(operation = "get todo", %todo_id, %user_id, error = %e, "query failed");
                DatabaseError::storage("get todo")(e)
            })?
            .ok_or(DatabaseError::TodoNotFound)
    }

    async fn update_status(&self, status: TodoStatus, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        self.mutate(
            "update status",
            todo_id,
            user_id,
            update_status_statement(status, todo_id, user_id),
        )
        .await
    }

    async fn update_content(&self, content: &str, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        self.mutate(
            "update content",
            todo_id,
            user_id,
            update_content_statement(content, todo_id, user_id),
        )
        .await
    }

    async fn delete(&self, todo_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        self.mutate("delete todo", todo_id, user_id, delete_statement(todo_id, user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::query_builder::SqlValue;

    #[test]
    fn insert_writes_owner_and_status() {
        let todo = Todo::new(Uuid::new_v4(), Uuid::new_v4(), "buy milk", TodoStatus::Process);
        let sql = insert_statement(&todo).unwrap();

        assert_eq!(
            sql.query,
            r#"INSERT INTO "todos" ("id", "user_id", "content", "status") VALUES ($1, $2, $3, $4) RETURNING "id", "created_at", "updated_at""#
        );
        assert_eq!(
            sql.params,
            vec![
                SqlValue::Uuid(todo.id),
                SqlValue::Uuid(todo.user_id),
                SqlValue::Text("buy milk".into()),
                SqlValue::Text("process".into()),
            ]
        );
    }

    #[test]
    fn updates_are_scoped_by_id_and_owner() {
        let (todo_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());

        let sql = update_status_statement(TodoStatus::Done, todo_id, user_id).unwrap();
        assert_eq!(
            sql.query,
            r#"UPDATE "todos" SET "status" = $1, "updated_at" = NOW() WHERE "id" = $2 AND "user_id" = $3"#
        );
        assert_eq!(
            sql.params,
            vec![SqlValue::Text("done".into()), SqlValue::Uuid(todo_id), SqlValue::Uuid(user_id)]
        );

        let sql = update_content_statement("walk dog", todo_id, user_id).unwrap();
        assert_eq!(
            sql.query,
            r#"UPDATE "todos" SET "content" = $1, "updated_at" = NOW() WHERE "id" = $2 AND "user_id" = $3"#
        );
        assert_eq!(
            sql.params,
            vec![SqlValue::Text("walk dog".into()), SqlValue::Uuid(todo_id), SqlValue::Uuid(user_id)]
        );
    }

    #[test]
    fn delete_is_scoped_by_id_and_owner() {
        let (todo_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let sql = delete_statement(todo_id, user_id).unwrap();

        assert_eq!(sql.query, r#"DELETE FROM "todos" WHERE "id" = $1 AND "user_id" = $2"#);
        assert_eq!(sql.params, vec![SqlValue::Uuid(todo_id), SqlValue::Uuid(user_id)]);
    }

    #[test]
    fn reads_are_scoped_by_owner() {
        let (todo_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());

        let list = select_for_user_statement(user_id).unwrap();
        assert_eq!(
            list.query,
            r#"SELECT "id", "user_id", "content", "status", "created_at", "updated_at" FROM "todos" WHERE "user_id" = $1 ORDER BY "created_at""#
        );

        let one = select_one_statement(todo_id, user_id).unwrap();
        assert!(one.query.ends_with(r#"WHERE "id" = $1 AND "user_id" = $2"#));
        assert_eq!(one.params, vec![SqlValue::Uuid(todo_id), SqlValue::Uuid(user_id)]);
    }

    #[test]
    fn nil_owner_is_a_build_error() {
        assert_eq!(
            update_status_statement(TodoStatus::Done, Uuid::new_v4(), Uuid::nil()).unwrap_err(),
            QueryBuildError::NilIdentifier("user_id".into())
        );
        assert!(delete_statement(Uuid::nil(), Uuid::new_v4()).is_err());
    }
}
