use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use failure::Fail;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum Error {
    #[fail(display = "{} not found", _0)]
    NotFound(String),
    #[fail(display = "conflict: {}", _0)]
    Conflict(String),
    #[fail(display = "forbidden: {}", _0)]
    Forbidden(String),
    #[fail(display = "group has reached maximum capacity ({} members)", _0)]
    CapacityExceeded(usize),
    #[fail(display = "invalid state: {}", _0)]
    InvalidState(String),
    #[fail(display = "invalid input: {}", _0)]
    Validation(String),
    #[fail(display = "no authenticated user")]
    Unauthenticated,
    #[fail(display = "transient store failure: {}", _0)]
    Transient(String),
    #[fail(display = "store failure: {}", _0)]
    Store(String),
    #[fail(display = "configuration error: {}", _0)]
    Config(String),
}

impl Error {
    pub fn not_found<S: Into<String>>(what: S) -> Error {
        Error::NotFound(what.into())
    }

    pub fn conflict<S: Into<String>>(what: S) -> Error {
        Error::Conflict(what.into())
    }

    pub fn forbidden<S: Into<String>>(what: S) -> Error {
        Error::Forbidden(what.into())
    }

    pub fn invalid_state<S: Into<String>>(what: S) -> Error {
        Error::InvalidState(what.into())
    }

    pub fn validation<S: Into<String>>(what: S) -> Error {
        Error::Validation(what.into())
    }

    /// Stable category the presentation layer keys its messages on.
    pub fn category(&self) -> &'static str {
        match *self {
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Forbidden(_) => "forbidden",
            Error::CapacityExceeded(_) => "capacity_exceeded",
            Error::InvalidState(_) => "invalid_state",
            Error::Validation(_) => "validation_error",
            Error::Unauthenticated => "unauthenticated",
            Error::Transient(_) => "transient",
            Error::Store(_) => "store_error",
            Error::Config(_) => "config_error",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match *self {
            Error::Transient(_) => true,
            _ => false,
        }
    }
}

fn is_serialization_failure(message: &str) -> bool {
    message.contains("could not serialize access") || message.contains("deadlock detected")
}

impl From<DieselError> for Error {
    fn from(error: DieselError) -> Error {
        match error {
            DieselError::NotFound => Error::NotFound("record".to_owned()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Error::Conflict(info.message().to_owned())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Error::NotFound(info.message().to_owned())
            }
            DieselError::DatabaseError(_, ref info) if is_serialization_failure(info.message()) => {
                Error::Transient(info.message().to_owned())
            }
            other => Error::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_distinct() {
        let errors = vec![
            Error::not_found("group"),
            Error::conflict("dup"),
            Error::forbidden("nope"),
            Error::CapacityExceeded(500),
            Error::invalid_state("locked"),
            Error::validation("negative"),
            Error::Unauthenticated,
            Error::Transient("retry".to_owned()),
            Error::Store("broken".to_owned()),
            Error::Config("BAD".to_owned()),
        ];
        let mut categories = errors.iter().map(Error::category).collect::<Vec<_>>();
        categories.sort();
        categories.dedup();
        assert_eq!(categories.len(), errors.len());
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        assert_eq!(
            Error::from(DieselError::NotFound).category(),
            "not_found"
        );
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(Error::Transient("x".to_owned()).is_retryable());
        assert!(!Error::conflict("x").is_retryable());
    }

    #[test]
    fn capacity_message_names_the_limit() {
        assert_eq!(
            Error::CapacityExceeded(500).to_string(),
            "group has reached maximum capacity (500 members)"
        );
    }
}
