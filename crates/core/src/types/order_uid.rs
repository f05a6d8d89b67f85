//! Order identifier type.

use core::fmt;

/// Errors that can occur when parsing an [`OrderUid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderUidError {
    /// The input string is empty.
    #[error("order_uid cannot be empty")]
    Empty,
}

/// A validated order identifier.
///
/// The identifier is the single key relating an order to its delivery,
/// payment and item rows, and the key the cache is indexed by. An order
/// without one must never reach the store or the cache, so the only way to
/// obtain an `OrderUid` is through [`OrderUid::parse`].
///
/// ## Examples
///
/// ```
/// use order_hub_core::OrderUid;
///
/// assert!(OrderUid::parse("b563feb7b2b84b6test").is_ok());
/// assert!(OrderUid::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderUid(String);

impl OrderUid {
    /// Parse an `OrderUid` from a string.
    ///
    /// # Errors
    ///
    /// Returns `OrderUidError::Empty` if the input is empty.
    pub fn parse(s: &str) -> Result<Self, OrderUidError> {
        if s.is_empty() {
            return Err(OrderUidError::Empty);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `OrderUid` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderUid {
    type Err = OrderUidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OrderUid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let uid = OrderUid::parse("X1").unwrap();
        assert_eq!(uid.as_str(), "X1");
        assert_eq!(uid.to_string(), "X1");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(OrderUid::parse(""), Err(OrderUidError::Empty));
    }

    #[test]
    fn test_whitespace_is_not_empty() {
        // Only the empty string is rejected; producers own the rest of the format.
        assert!(OrderUid::parse(" ").is_ok());
    }

    #[test]
    fn test_from_str() {
        let uid: OrderUid = "abc".parse().unwrap();
        assert_eq!(uid.into_inner(), "abc");
    }
}
