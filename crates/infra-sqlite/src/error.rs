// sqlx::Error -> AppError

use talentflow_core::error::AppError;

/// Convert a driver error. Unique violations become `DuplicateKey`.
pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite extended result codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                Some("2067") | Some("1555") => {
                    // UNIQUE / PRIMARY KEY constraint failed
                    AppError::DuplicateKey(db_err.message().to_string())
                }
                Some("5") => {
                    // SQLITE_BUSY - database is locked
                    AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    ))
                }
                Some("13") => {
                    // SQLITE_FULL - database or disk is full
                    AppError::Database(format!("Database full: {}", db_err.message()))
                }
                Some(code) => {
                    AppError::Database(format!("Database error [{}]: {}", code, db_err.message()))
                }
                None => AppError::Database(format!("Database error: {}", db_err.message())),
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        // Connection, pool, protocol errors
        _ => AppError::Database(err.to_string()),
    }
}
