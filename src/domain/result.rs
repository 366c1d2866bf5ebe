//! Result type alias for ExFig

use super::errors::ExfigError;

/// Result type alias for ExFig operations
///
/// # Examples
///
/// ```
/// use exfig::domain::result::Result;
/// use exfig::domain::errors::ExfigError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ExfigError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExfigError>;
