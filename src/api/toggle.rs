//! Outcome classification for the attach/detach relationship endpoints
//! (favorite, shopping cart, follow). The composite primary key on the
//! relationship table is the duplicate guard, so the insert result alone
//! decides between created and already-present, and the deleted row count
//! decides between removed and not-present.

use diesel::result::{DatabaseErrorKind, Error};

#[derive(Debug)]
pub enum AttachOutcome {
    /// Row inserted, respond 201
    Created,
    /// Relationship already existed (first attempt or racing second
    /// attempt alike), respond 400
    AlreadyPresent,
    Failed(Error),
}

pub fn classify_attach(result: Result<usize, Error>) -> AttachOutcome {
    match result {
        Ok(_) => AttachOutcome::Created,
        Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            AttachOutcome::AlreadyPresent
        }
        Err(e) => AttachOutcome::Failed(e),
    }
}

#[derive(Debug)]
pub enum DetachOutcome {
    /// Row deleted, respond 204
    Removed,
    /// No relationship to remove, respond 400
    NotPresent,
    Failed(Error),
}

pub fn classify_detach(result: Result<usize, Error>) -> DetachOutcome {
    match result {
        Ok(0) => DetachOutcome::NotPresent,
        Ok(_) => DetachOutcome::Removed,
        Err(e) => DetachOutcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation() -> Error {
        Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        )
    }

    #[test]
    fn test_attach_succeeds_then_conflicts() {
        // First insert lands, the repeat trips the pk and maps to 400
        assert!(matches!(classify_attach(Ok(1)), AttachOutcome::Created));
        assert!(matches!(
            classify_attach(Err(unique_violation())),
            AttachOutcome::AlreadyPresent
        ));
    }

    #[test]
    fn test_attach_other_database_errors_are_failures() {
        assert!(matches!(
            classify_attach(Err(Error::NotFound)),
            AttachOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_detach_succeeds_then_reports_missing() {
        // First delete removes the row, the repeat deletes nothing
        assert!(matches!(classify_detach(Ok(1)), DetachOutcome::Removed));
        assert!(matches!(classify_detach(Ok(0)), DetachOutcome::NotPresent));
    }

    #[test]
    fn test_detach_errors_are_failures() {
        assert!(matches!(
            classify_detach(Err(Error::NotFound)),
            DetachOutcome::Failed(_)
        ));
    }
}
