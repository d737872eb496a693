//! Search configuration.

use crate::error::ValidationError;

/// Default page size for searches.
pub const DEFAULT_LIMIT: usize = 20;

/// Largest page size a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Default page size for free-text searches.
pub const DEFAULT_TEXT_LIMIT: usize = 10;

/// Fields free-text search looks in.
pub const DEFAULT_TEXT_FIELDS: &[&str] = &["firstName", "lastName", "school", "bio"];

/// Configuration for search execution.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Page size when the caller gives none.
    pub default_limit: usize,

    /// Largest accepted page size.
    pub max_limit: usize,

    /// Page size for free-text search when the caller gives none.
    pub default_text_limit: usize,

    /// Attributes searched by free-text search.
    pub text_fields: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            default_text_limit: DEFAULT_TEXT_LIMIT,
            text_fields: DEFAULT_TEXT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl SearchConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default page size.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the largest accepted page size.
    pub fn with_max_limit(mut self, limit: usize) -> Self {
        self.max_limit = limit;
        self
    }

    /// Set the free-text search fields.
    pub fn with_text_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve a requested search page size.
    pub fn search_limit(&self, requested: Option<usize>) -> Result<usize, ValidationError> {
        self.check(requested.unwrap_or(self.default_limit))
    }

    /// Resolve a requested text-search page size.
    pub fn text_limit(&self, requested: Option<usize>) -> Result<usize, ValidationError> {
        self.check(requested.unwrap_or(self.default_text_limit))
    }

    fn check(&self, limit: usize) -> Result<usize, ValidationError> {
        if limit == 0 || limit > self.max_limit {
            return Err(ValidationError::InvalidLimit {
                limit,
                max: self.max_limit,
            });
        }
        Ok(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_resolution() {
        let config = SearchConfig::default();
        assert_eq!(config.search_limit(None), Ok(20));
        assert_eq!(config.text_limit(None), Ok(10));
        assert_eq!(config.search_limit(Some(100)), Ok(100));
        assert_eq!(
            config.search_limit(Some(0)),
            Err(ValidationError::InvalidLimit { limit: 0, max: 100 })
        );
        assert!(config.text_limit(Some(101)).is_err());
    }

    #[test]
    fn test_builder() {
        let config = SearchConfig::new()
            .with_default_limit(5)
            .with_max_limit(50)
            .with_text_fields(["bio"]);
        assert_eq!(config.search_limit(None), Ok(5));
        assert!(config.search_limit(Some(51)).is_err());
        assert_eq!(config.text_fields, vec!["bio".to_string()]);
    }
}
