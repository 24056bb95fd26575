use chrono::{DateTime, Utc};
use signplay_core::model::{GameResult, GameResultId, NewGameResult, UserAggregate, UserId};

use super::SqliteRepository;
use super::mapping::{USER_COLUMNS, conn, id_i64, map_result_row, map_user_row};
use crate::repository::{GameResultRepository, RecordedResult, ResultPersistence, StorageError};

#[async_trait::async_trait]
impl GameResultRepository for SqliteRepository {
    async fn list_results(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<GameResult>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT
                    id, user_id, question, correct_answer, predicted_answer,
                    accuracy, speed, dexterity_score, is_correct, played_at
                FROM game_results
                WHERE user_id = ?1
                ORDER BY played_at DESC, id DESC
            ",
        );
        if limit.is_some() {
            sql.push_str(" LIMIT ?2");
        }

        let mut query = sqlx::query(&sql).bind(id_i64("user_id", user_id.value())?);
        if let Some(limit) = limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl ResultPersistence for SqliteRepository {
    async fn record_result(
        &self,
        user_id: UserId,
        submission: &NewGameResult,
        played_at: DateTime<Utc>,
    ) -> Result<RecordedResult, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let accuracy = i64::from(submission.accuracy().value());
        let dexterity = i64::from(submission.dexterity_score());

        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Counters are bumped in SQL, never read-modify-written.
        let updated = sqlx::query(
            r"
                UPDATE users
                SET total_games_played = total_games_played + 1,
                    accuracy_sum = accuracy_sum + ?2,
                    dexterity_score = MAX(dexterity_score, ?3)
                WHERE id = ?1
            ",
        )
        .bind(user)
        .bind(accuracy)
        .bind(dexterity)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StorageError::NotFound);
        }

        let inserted = sqlx::query(
            r"
                INSERT INTO game_results (
                    user_id, question, correct_answer, predicted_answer,
                    accuracy, speed, dexterity_score, is_correct, played_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(user)
        .bind(submission.question())
        .bind(submission.correct_answer())
        .bind(submission.predicted_answer())
        .bind(accuracy)
        .bind(i64::from(submission.speed()))
        .bind(dexterity)
        .bind(submission.is_correct())
        .bind(played_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(user)
            .fetch_one(&mut *tx)
            .await
            .map_err(conn)?;
        let aggregate = map_user_row(&row)?;

        tx.commit().await.map_err(conn)?;

        let id = GameResultId::new(
            u64::try_from(inserted.last_insert_rowid())
                .map_err(|_| StorageError::Serialization("result id sign overflow".into()))?,
        );
        let result = GameResult::new(id, user_id, submission.clone(), played_at);

        Ok(RecordedResult { result, aggregate })
    }

    async fn rebuild_aggregate(&self, user_id: UserId) -> Result<UserAggregate, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Recount and overwrite in one statement so no save can slip between.
        let updated = sqlx::query(
            r"
                UPDATE users
                SET (total_games_played, accuracy_sum, dexterity_score) = (
                    SELECT COUNT(*), COALESCE(SUM(accuracy), 0), COALESCE(MAX(dexterity_score), 0)
                    FROM game_results
                    WHERE user_id = ?1
                )
                WHERE id = ?1
            ",
        )
        .bind(user)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if updated.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(user)
            .fetch_one(&mut *tx)
            .await
            .map_err(conn)?;
        let aggregate = map_user_row(&row)?;

        tx.commit().await.map_err(conn)?;
        Ok(aggregate)
    }
}
