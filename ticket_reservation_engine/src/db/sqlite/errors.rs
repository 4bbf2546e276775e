use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("A show with id {0} already exists")]
    DuplicateShow(String),
    #[error("Could not generate a unique validation code for booking {0}")]
    ValidationCodeExhausted(String),
}

/// True if the error is a unique-constraint violation on the named index or column path
/// (e.g. `bookings.payment_reference`).
pub fn unique_violation_on(err: &sqlx::Error, target: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains(target)
        },
        _ => false,
    }
}

/// True for any unique-constraint violation, regardless of which index tripped.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
