use chrono::Utc;
use signplay_core::model::{UserAggregate, UserId};

use super::SqliteRepository;
use super::mapping::{USER_COLUMNS, conn, id_i64, map_user_row, ser, user_id_from_i64};
use crate::repository::{NewUserRecord, StorageError, UserRepository};

fn insert_error(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserAggregate, StorageError> {
        // Validate before touching the table so bad names never get stored.
        let draft = UserAggregate::new(UserId::new(0), user.name).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO users (name, token_digest, created_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(draft.name())
        .bind(user.token_digest.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        let id = user_id_from_i64(res.last_insert_rowid())?;
        UserAggregate::new(id, draft.name()).map_err(ser)
    }

    async fn get_user(&self, id: UserId) -> Result<UserAggregate, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        map_user_row(&row)
    }

    async fn find_by_token_digest(&self, digest: &str) -> Result<UserAggregate, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE token_digest = ?1");
        let row = sqlx::query(&sql)
            .bind(digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        map_user_row(&row)
    }
}
