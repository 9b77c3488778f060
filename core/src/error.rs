//! Error taxonomy for reservation operations.

use thiserror::Error;

/// Result type alias for reservation operations.
pub type Result<T> = std::result::Result<T, ReservationError>;

/// All the ways a reservation operation can fail.
///
/// Validation and not-found failures are detected before any mutation.
/// Business-rule failures are checked inside the transaction before any
/// write. A store failure mid-transaction rolls the whole operation back;
/// nothing is ever partially committed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of entity that was missing.
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The ticket was already cancelled.
    #[error("ticket {pnr} is already cancelled")]
    AlreadyCancelled {
        /// PNR of the ticket.
        pnr: String,
    },

    /// The journey has already departed; cancellation is no longer allowed.
    #[error("journey for ticket {pnr} has already departed")]
    JourneyDeparted {
        /// PNR of the ticket.
        pnr: String,
    },

    /// The journey's source and destination are the same station.
    #[error("source and destination stations are the same")]
    SourceEqualsDestination,

    /// Underlying storage failure (transaction, constraint, connectivity).
    #[error("store error: {0}")]
    Store(String),
}

impl ReservationError {
    /// Convenience constructor for [`ReservationError::NotFound`].
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// True for the business-rule rejections that callers should treat as
    /// client errors rather than server faults.
    #[must_use]
    pub const fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::AlreadyCancelled { .. }
                | Self::JourneyDeparted { .. }
                | Self::SourceEqualsDestination
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = ReservationError::not_found("journey", "abc");
        assert_eq!(err.to_string(), "journey abc not found");

        let err = ReservationError::AlreadyCancelled {
            pnr: "1234567890".to_string(),
        };
        assert_eq!(err.to_string(), "ticket 1234567890 is already cancelled");
        assert!(err.is_business_rule());

        assert!(!ReservationError::Store("boom".to_string()).is_business_rule());
    }
}
