//! Row operations for the `directories` table.

use sqlx::{Executor, Sqlite};

use crate::model::Directory;

/// All directories, oldest first.
pub async fn all<'e, E>(executor: E) -> sqlx::Result<Vec<Directory>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Directory>("SELECT id, path FROM directories ORDER BY id")
        .fetch_all(executor)
        .await
}

pub async fn by_id<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Directory>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Directory>("SELECT id, path FROM directories WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn by_path<'e, E>(executor: E, path: &str) -> sqlx::Result<Option<Directory>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Directory>("SELECT id, path FROM directories WHERE path = ?")
        .bind(path)
        .fetch_optional(executor)
        .await
}

/// Insert a directory and return it with its assigned ID.
pub async fn insert<'e, E>(executor: E, path: &str) -> sqlx::Result<Directory>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Directory>("INSERT INTO directories (path) VALUES (?) RETURNING id, path")
        .bind(path)
        .fetch_one(executor)
        .await
}

/// Delete a directory row. Songs must already be gone.
///
/// Returns true if a row was deleted.
pub async fn delete<'e, E>(executor: E, id: i64) -> sqlx::Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM directories WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{self, Location};

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let pool = db::open(&Location::Memory, &DatabaseConfig::default())
            .await
            .unwrap();

        let first = insert(&pool, "/a").await.unwrap();
        let second = insert(&pool, "/b").await.unwrap();
        assert_eq!(first, Directory { id: 1, path: "/a".into() });
        assert_eq!(second.id, 2);

        assert_eq!(by_path(&pool, "/b").await.unwrap(), Some(second.clone()));
        assert_eq!(by_id(&pool, 1).await.unwrap(), Some(first));
        assert_eq!(all(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let pool = db::open(&Location::Memory, &DatabaseConfig::default())
            .await
            .unwrap();

        let first = insert(&pool, "/a").await.unwrap();
        assert!(delete(&pool, first.id).await.unwrap());
        assert!(!delete(&pool, first.id).await.unwrap());

        let again = insert(&pool, "/a").await.unwrap();
        assert_eq!(again.id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_path_violates_unique_constraint() {
        let pool = db::open(&Location::Memory, &DatabaseConfig::default())
            .await
            .unwrap();

        insert(&pool, "/a").await.unwrap();
        let err = insert(&pool, "/a").await.unwrap_err();
        assert!(crate::error::Error::from(err).is_unique_violation());
    }
}
