//! Diesel and pool error translation shared by the repositories.
//!
//! Repositories pass their own port-error constructors so each adapter keeps
//! its error type while the classification lives in one place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Any pool failure means the database is unreachable.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Closed connections map to `connection`; everything else to `query`.
///
/// Database messages are logged at debug level and never copied into the
/// returned error.
pub(crate) fn map_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
            query("database constraint rejected the write")
        }
        _ => query("database error"),
    }
}

pub(crate) fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
    }

    fn map(error: DieselError) -> Mapped {
        map_diesel_error(
            error,
            |m| Mapped::Query(m.to_owned()),
            |m| Mapped::Connection(m.to_owned()),
        )
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let mapped = map_pool_error(PoolError::checkout("timed out"), Mapped::Connection);
        assert_eq!(mapped, Mapped::Connection("timed out".to_owned()));
    }

    #[rstest]
    #[case(DatabaseErrorKind::ClosedConnection, Mapped::Connection("database connection error".into()))]
    #[case(DatabaseErrorKind::CheckViolation, Mapped::Query("database constraint rejected the write".into()))]
    #[case(DatabaseErrorKind::SerializationFailure, Mapped::Query("database error".into()))]
    fn database_errors_are_classified(#[case] kind: DatabaseErrorKind, #[case] expected: Mapped) {
        let error = DieselError::DatabaseError(kind, Box::new("detail".to_owned()));
        assert_eq!(map(error), expected);
    }

    #[rstest]
    fn database_detail_is_not_leaked() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new("relation \"secret\" does not exist".to_owned()),
        );
        let Mapped::Query(message) = map(error) else {
            panic!("expected query error");
        };
        assert!(!message.contains("secret"));
    }

    #[rstest]
    fn unique_violations_are_recognised() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert!(is_unique_violation(&error));
        assert!(!is_unique_violation(&DieselError::NotFound));
    }
}
