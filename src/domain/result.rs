//! Result type alias for clubmigrate

use super::errors::MigrateError;

/// Result type alias for clubmigrate operations
///
/// # Examples
///
/// ```
/// use clubmigrate::domain::result::Result;
/// use clubmigrate::domain::errors::MigrateError;
///
/// fn load_mapping() -> Result<usize> {
///     Ok(12)
/// }
///
/// fn locked() -> Result<()> {
///     Err(MigrateError::BackupNotFound("matches-migration-x".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{MigrateError, StoreError};

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> std::result::Result<i32, StoreError> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_store_error_propagates() {
        fn inner() -> Result<()> {
            Err(StoreError::NotFound("m1".to_string()))?;
            Ok(())
        }

        assert!(matches!(inner(), Err(MigrateError::Store(_))));
    }
}
