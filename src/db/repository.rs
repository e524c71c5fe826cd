use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::db::query::TodoQuery;
use crate::models::{NewTodo, Todo, TodoChanges};

const TODO_COLUMNS: &str =
    "id, title, description, status, priority, dueDate, created_at, updated_at";

/// Returns the requested page and the size of the whole filtered set.
pub async fn fetch_todos(db: &SqlitePool, query: &TodoQuery) -> Result<(Vec<Todo>, u64), sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM todos");
    query.filter.push_where(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(db).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM todos", TODO_COLUMNS));
    query.filter.push_where(&mut select);
    query.sort.push_order_by(&mut select);
    query.page.push_limit(&mut select);
    debug!(sql = select.sql(), "listing todos");

    let todos = select.build_query_as::<Todo>().fetch_all(db).await?;

    Ok((todos, u64::try_from(total).unwrap_or_default()))
}

pub async fn find_todo_by_id(db: &SqlitePool, id: i64) -> Result<Option<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(&format!("SELECT {} FROM todos WHERE id = ?", TODO_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_todo(db: &SqlitePool, new_todo: NewTodo) -> Result<Todo, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Todo>(&format!(
        r#"
        INSERT INTO todos
            (title, description, status, priority, dueDate, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        RETURNING {}
        "#,
        TODO_COLUMNS
    ))
    .bind(new_todo.title)
    .bind(new_todo.description)
    .bind(new_todo.status)
    .bind(new_todo.priority)
    .bind(new_todo.due_date)
    .bind(now)
    .fetch_one(db)
    .await
}

/// Merges `changes` into the stored record. Returns `None` when no record
/// has this id.
pub async fn update_todo(
    db: &SqlitePool,
    id: i64,
    changes: TodoChanges,
) -> Result<Option<Todo>, sqlx::Error> {
    let mut current = match find_todo_by_id(db, id).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    if changes.is_empty() {
        return Ok(Some(current));
    }

    changes.apply_to(&mut current);
    // updated_at never moves backwards, even if the clock does.
    current.updated_at = Utc::now().max(current.updated_at);

    sqlx::query_as::<_, Todo>(&format!(
        r#"
        UPDATE todos
        SET title = ?1,
            description = ?2,
            status = ?3,
            priority = ?4,
            dueDate = ?5,
            updated_at = ?6
        WHERE id = ?7
        RETURNING {}
        "#,
        TODO_COLUMNS
    ))
    .bind(current.title)
    .bind(current.description)
    .bind(current.status)
    .bind(current.priority)
    .bind(current.due_date)
    .bind(current.updated_at)
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn delete_todo(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
