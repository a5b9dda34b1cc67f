use http::StatusCode;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// A conversion helper trait for errors that get shown to the user inline,
/// as a notice on the page they were already looking at.
pub trait IntoHandlerError {
    /// Borrow self and return an http::StatusCode and an owned String message.
    fn status_and_message(&self) -> (StatusCode, String);
}

/// Errors that are the user's fault (and which they therefore might be able
/// to do something about). These always get caught before we touch the db.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Enter a customer name to search for.")]
    BlankSearch,

    #[error("The price must be whole digits only, like 15000. Got: \"{price}\"")]
    BadPrice { price: String },

    #[error("That price is too large to store: {price}")]
    PriceTooLarge { price: String },

    #[error("The {field} selection was mangled: \"{value}\"")]
    BadSelection { field: &'static str, value: String },

    #[error("There's no customer with ID {custid}.")]
    UnknownCustomer { custid: i64 },

    #[error("Choose a customer first.")]
    NoCustomer,

    #[error("Choose a book for the order.")]
    NoBook,

    #[error("Enter the new customer's name.")]
    BlankCustomerName,

    #[error("Enter the new book's name.")]
    BlankBookName,

    #[error("Every field has to be filled in correctly. {}", join_problems(.0))]
    Incomplete(Vec<ValidationError>),
}

fn join_problems(problems: &[ValidationError]) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ValidationError {
    /// Blank searches are a nudge rather than a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationError::BlankSearch)
    }
}

impl IntoHandlerError for ValidationError {
    fn status_and_message(&self) -> (StatusCode, String) {
        (StatusCode::BAD_REQUEST, self.to_string())
    }
}

/// Failures from the storage gateway. Sqlite's complaint is kept intact,
/// since the message ends up in front of the user verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A duplicate primary key, a dangling reference, or some other rule the
    /// schema enforces.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(sqlx::Error),

    /// Anything else the engine threw at us: I/O, locking, corrupt file...
    #[error("Storage error: {0}")]
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let is_constraint = match &e {
            sqlx::Error::Database(dbe) => !matches!(dbe.kind(), ErrorKind::Other),
            _ => false,
        };
        if is_constraint {
            StoreError::ConstraintViolation(e)
        } else {
            StoreError::Storage(e)
        }
    }
}

impl StoreError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation(_))
    }
}

impl IntoHandlerError for StoreError {
    fn status_and_message(&self) -> (StatusCode, String) {
        let status = match self {
            StoreError::ConstraintViolation(_) => StatusCode::CONFLICT,
            StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_message_lists_everything() {
        let err = ValidationError::Incomplete(vec![
            ValidationError::BlankCustomerName,
            ValidationError::BadPrice {
                price: "12.5".to_string(),
            },
        ]);
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("customer's name"));
        assert!(message.contains("12.5"));
    }

    #[test]
    fn non_database_errors_are_storage_errors() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(!err.is_constraint_violation());
        assert_eq!(
            err.status_and_message().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
