//! Credential handling and input validation.
//!
//! Space, asset and column names end up inside request URLs and OData
//! options, so they are validated before any remote call is made.

use crate::error::{ProbeError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Longest accepted catalog identifier.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Longest accepted `$filter` / `$orderby` expression.
pub const MAX_EXPRESSION_LENGTH: usize = 2000;

/// A secure string that automatically clears its contents when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Use carefully and avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to a regular string. The SecureString will be zeroized.
    pub fn into_string(mut self) -> String {
        let value = std::mem::take(&mut self.0);
        self.0.zeroize();
        value
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Validation of caller-supplied catalog names and query options.
pub struct InputSecurity;

impl InputSecurity {
    /// Validates a space, asset or column technical name.
    ///
    /// Accepts letters, digits, `_`, `.`, `-` and `:` and requires the first
    /// character to be a letter, digit or underscore. Quotes, slashes and
    /// parentheses are rejected because names are embedded in URL paths like
    /// `spaces('NAME')`.
    ///
    /// # Examples
    /// ```rust
    /// use catalog_probe::security::InputSecurity;
    ///
    /// assert!(InputSecurity::validate_identifier("SALES_ORDERS", "asset").is_ok());
    /// assert!(InputSecurity::validate_identifier("x')/../y", "asset").is_err());
    /// ```
    pub fn validate_identifier(identifier: &str, what: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(ProbeError::invalid_argument(format!(
                "{what} name cannot be empty"
            )));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(ProbeError::invalid_argument(format!(
                "{what} name too long (max {MAX_IDENTIFIER_LENGTH} characters)"
            )));
        }

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.:\-]*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(ProbeError::invalid_argument(format!(
                "Invalid {what} name '{identifier}': only letters, digits, '_', '.', '-' and ':' are allowed"
            )));
        }

        Ok(())
    }

    /// Validates a free-form OData expression such as `$filter` or `$orderby`.
    ///
    /// The expression is passed through to the server, so only transport-level
    /// hazards are rejected: oversized input and control characters.
    pub fn validate_expression(expression: &str, what: &str) -> Result<()> {
        if expression.len() > MAX_EXPRESSION_LENGTH {
            return Err(ProbeError::invalid_argument(format!(
                "{what} too long (max {MAX_EXPRESSION_LENGTH} characters)"
            )));
        }

        if expression.chars().any(|c| c.is_control()) {
            return Err(ProbeError::invalid_argument(format!(
                "{what} cannot contain control characters"
            )));
        }

        Ok(())
    }

    /// Escapes a value for use inside a single-quoted OData literal.
    pub fn escape_literal(value: &str) -> String {
        value.replace('\'', "''")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_debug_hides_value() {
        let secret = SecureString::new("super-secret");
        assert_eq!(format!("{secret:?}"), "SecureString(***)");
        assert_eq!(secret.expose(), "super-secret");
        assert_eq!(secret.into_string(), "super-secret");
    }

    #[test]
    fn test_valid_identifiers() {
        for name in ["SALES", "MOCK_SALES", "sap.crm:Orders", "V_2024-01", "_TMP"] {
            assert!(
                InputSecurity::validate_identifier(name, "asset").is_ok(),
                "{name} should be valid"
            );
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for name in ["", "  ", "a'b", "a/b", "x)", "-lead", "has space", "a\0b"] {
            assert!(
                matches!(
                    InputSecurity::validate_identifier(name, "space"),
                    Err(ProbeError::InvalidArgument(_))
                ),
                "{name:?} should be rejected"
            );
        }
        let long = "A".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(InputSecurity::validate_identifier(&long, "space").is_err());
    }

    #[test]
    fn test_expression_validation() {
        assert!(InputSecurity::validate_expression("STATUS eq 'OPEN'", "filter").is_ok());
        assert!(InputSecurity::validate_expression("a\nb", "filter").is_err());
        let long = "x".repeat(MAX_EXPRESSION_LENGTH + 1);
        assert!(InputSecurity::validate_expression(&long, "filter").is_err());
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(InputSecurity::escape_literal("O'Brien"), "O''Brien");
    }
}
