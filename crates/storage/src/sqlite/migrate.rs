use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates `users` (with running statistics) and `game_results`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    token_digest TEXT NOT NULL UNIQUE,
                    total_games_played INTEGER NOT NULL DEFAULT 0
                        CHECK (total_games_played >= 0),
                    accuracy_sum INTEGER NOT NULL DEFAULT 0
                        CHECK (accuracy_sum >= 0 AND accuracy_sum <= total_games_played * 100),
                    dexterity_score INTEGER NOT NULL DEFAULT 0
                        CHECK (dexterity_score >= 0),
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS game_results (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    question TEXT NOT NULL,
                    correct_answer INTEGER NOT NULL,
                    predicted_answer INTEGER,
                    accuracy INTEGER NOT NULL CHECK (accuracy BETWEEN 0 AND 100),
                    speed INTEGER NOT NULL DEFAULT 0 CHECK (speed >= 0),
                    dexterity_score INTEGER NOT NULL CHECK (dexterity_score >= 0),
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    played_at TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_game_results_user_played
                    ON game_results (user_id, played_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
