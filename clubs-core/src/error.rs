//! Error taxonomy shared by the storage processors and the domain components.

/// Errors raised by a storage processor.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Serialization failure or deadlock. The operation may be retried.
    #[error("storage contention")]
    Contention,
    /// A row referenced a user or event that does not exist.
    #[error("referenced row does not exist")]
    DanglingReference,
}

impl StoreError {
    /// Classify a driver error by its SQLSTATE.
    pub fn classify(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());
        match code.as_deref() {
            // serialization_failure, deadlock_detected
            Some("40001") | Some("40P01") => StoreError::Contention,
            // foreign_key_violation
            Some("23503") => StoreError::DanglingReference,
            _ => StoreError::Database(err),
        }
    }
}

/// What a [`ClubError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Event,
    User,
    Registration,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Event => write!(f, "event"),
            Resource::User => write!(f, "user"),
            Resource::Registration => write!(f, "registration"),
        }
    }
}

/// Why a write was refused by a [`ClubError::Conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The user already holds a registration for the event.
    AlreadyRegistered,
    /// The event has no spot left.
    Full,
    /// The (user, event) unique constraint rejected a raw insert.
    Duplicate,
    /// Another account uses the email address.
    EmailTaken,
    /// The new capacity is lower than the number of registrations.
    CapacityBelowParticipants,
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictReason::AlreadyRegistered => "already-registered",
            ConflictReason::Full => "full",
            ConflictReason::Duplicate => "duplicate",
            ConflictReason::EmailTaken => "email-taken",
            ConflictReason::CapacityBelowParticipants => "capacity-below-participants",
        }
    }
}

/// Stable error kind reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidState => "invalid-state",
            ErrorKind::Validation => "validation",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Domain error returned by the catalog, ledger, arbiter and directory.
#[derive(Debug, thiserror::Error)]
pub enum ClubError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("conflict: {}", .0.as_str())]
    Conflict(ConflictReason),
    /// Registration was attempted for an event that already took place.
    #[error("event is finished")]
    Finished,
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Credential(#[from] crate::credentials::HashError),
}

impl ClubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClubError::NotFound(_) => ErrorKind::NotFound,
            ClubError::Conflict(_) => ErrorKind::Conflict,
            ClubError::Finished => ErrorKind::InvalidState,
            ClubError::Validation(_) => ErrorKind::Validation,
            ClubError::Store(_) | ClubError::Credential(_) => ErrorKind::Internal,
        }
    }

    /// Machine-readable detail for conflicts and invalid states.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ClubError::NotFound(Resource::Event) => Some("event"),
            ClubError::NotFound(Resource::User) => Some("user"),
            ClubError::NotFound(Resource::Registration) => Some("registration"),
            ClubError::Conflict(reason) => Some(reason.as_str()),
            ClubError::Finished => Some("finished"),
            ClubError::Validation(_) | ClubError::Store(_) | ClubError::Credential(_) => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ClubError::Validation(message.into())
    }
}

impl From<sqlx::Error> for ClubError {
    fn from(err: sqlx::Error) -> Self {
        ClubError::Store(StoreError::classify(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_reasons() {
        let err = ClubError::Conflict(ConflictReason::Full);
        assert_eq!(err.kind().as_str(), "conflict");
        assert_eq!(err.reason(), Some("full"));
        assert_eq!(err.to_string(), "conflict: full");

        let err = ClubError::Finished;
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.reason(), Some("finished"));

        let err = ClubError::NotFound(Resource::Registration);
        assert_eq!(err.kind().as_str(), "not-found");
        assert_eq!(err.to_string(), "registration not found");

        let err = ClubError::from(StoreError::Contention);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.reason(), None);
    }

    #[test]
    fn test_classify_non_database_error() {
        assert!(matches!(
            StoreError::classify(sqlx::Error::RowNotFound),
            StoreError::Database(sqlx::Error::RowNotFound)
        ));
    }
}
