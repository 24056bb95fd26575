use signplay_core::model::{
    Accuracy, GameResult, GameResultId, NewGameResult, UserAggregate, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) const USER_COLUMNS: &str =
    "id, name, total_games_played, accuracy_sum, dexterity_score";

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserAggregate, StorageError> {
    let id = user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let name: String = row.try_get("name").map_err(ser)?;
    let total = u32_from_i64(
        "total_games_played",
        row.try_get::<i64, _>("total_games_played").map_err(ser)?,
    )?;
    let accuracy_sum = i64_to_u64(
        "accuracy_sum",
        row.try_get::<i64, _>("accuracy_sum").map_err(ser)?,
    )?;
    let dexterity = u32_from_i64(
        "dexterity_score",
        row.try_get::<i64, _>("dexterity_score").map_err(ser)?,
    )?;

    UserAggregate::from_persisted(id, name, total, accuracy_sum, dexterity).map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<GameResult, StorageError> {
    let id = GameResultId::new(i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?);
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;
    let accuracy = Accuracy::new(row.try_get::<i64, _>("accuracy").map_err(ser)?).map_err(ser)?;
    let dexterity = u32_from_i64(
        "dexterity_score",
        row.try_get::<i64, _>("dexterity_score").map_err(ser)?,
    )?;
    let speed = u32_from_i64("speed", row.try_get::<i64, _>("speed").map_err(ser)?)?;

    let submission = NewGameResult::new(
        row.try_get::<String, _>("question").map_err(ser)?,
        row.try_get::<i64, _>("correct_answer").map_err(ser)?,
        row.try_get::<Option<i64>, _>("predicted_answer").map_err(ser)?,
        accuracy,
        dexterity,
    )
    .map_err(ser)?
    .with_speed(speed);

    GameResult::from_persisted(
        id,
        user_id,
        submission,
        row.try_get::<bool, _>("is_correct").map_err(ser)?,
        row.try_get("played_at").map_err(ser)?,
    )
    .map_err(ser)
}
