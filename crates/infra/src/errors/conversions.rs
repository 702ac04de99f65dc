//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tasklane_domain::TasklaneError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TasklaneError);

impl From<InfraError> for TasklaneError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TasklaneError> for InfraError {
    fn from(value: TasklaneError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoTasklaneError {
    fn into_tasklane(self) -> TasklaneError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → TasklaneError */
/* -------------------------------------------------------------------------- */

impl IntoTasklaneError for SqlError {
    fn into_tasklane(self) -> TasklaneError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        TasklaneError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        TasklaneError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        TasklaneError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        TasklaneError::Database("foreign key constraint violation".into())
                    }
                    _ => TasklaneError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => TasklaneError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                TasklaneError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                TasklaneError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                TasklaneError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                TasklaneError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => TasklaneError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => TasklaneError::Database("invalid SQL query".into()),
            other => TasklaneError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_tasklane())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → TasklaneError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(TasklaneError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TasklaneError */
/* -------------------------------------------------------------------------- */

impl IntoTasklaneError for HttpError {
    fn into_tasklane(self) -> TasklaneError {
        if self.is_timeout() {
            return TasklaneError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return TasklaneError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => TasklaneError::NotFound(message),
                429 => TasklaneError::Network(message),
                400..=499 => TasklaneError::InvalidInput(message),
                _ => TasklaneError::Network(message),
            };
        }

        TasklaneError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_tasklane())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
