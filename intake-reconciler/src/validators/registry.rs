//! Format registry
//!
//! Maps filename patterns (or an explicit override) to the validator
//! responsible for a file type. The registry is built by the caller
//! and passed into the run; there is no global table.

use super::FormatValidator;
use std::sync::Arc;
use tracing::debug;

/// Explicit registry of format validators
#[derive(Default, Clone)]
pub struct FormatRegistry {
    formats: Vec<Arc<dyn FormatValidator>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator. Formats are consulted in registration
    /// order; the first match wins.
    pub fn register(&mut self, validator: Arc<dyn FormatValidator>) -> &mut Self {
        self.formats.push(validator);
        self
    }

    /// Number of registered formats
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Resolve the validator for a group of filenames.
    ///
    /// An explicit override names the file type directly and bypasses
    /// pattern matching. Returns None when nothing matches; the
    /// caller turns that into an explicit invalid outcome, not a
    /// fatal error.
    pub fn resolve(
        &self,
        filenames: &[String],
        center: &str,
        file_type_override: Option<&str>,
    ) -> Option<Arc<dyn FormatValidator>> {
        if let Some(file_type) = file_type_override {
            let resolved = self
                .formats
                .iter()
                .find(|v| v.file_type() == file_type)
                .cloned();
            if resolved.is_none() {
                debug!(file_type, "File type override did not match any registered format");
            }
            return resolved;
        }

        self.formats
            .iter()
            .find(|v| v.matches_filename(filenames, center))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{FormatCheck, ValidationContext};
    use async_trait::async_trait;
    use intake_common::Result;

    struct SuffixFormat {
        file_type: &'static str,
        suffix: &'static str,
    }

    #[async_trait]
    impl FormatValidator for SuffixFormat {
        fn file_type(&self) -> &'static str {
            self.file_type
        }

        fn matches_filename(&self, filenames: &[String], _center: &str) -> bool {
            filenames.len() == 1 && filenames[0].ends_with(self.suffix)
        }

        async fn validate(
            &self,
            _paths: &[String],
            _ctx: &ValidationContext,
        ) -> Result<FormatCheck> {
            Ok(FormatCheck::valid())
        }
    }

    fn registry() -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        registry.register(Arc::new(SuffixFormat {
            file_type: "seg",
            suffix: ".seg",
        }));
        registry.register(Arc::new(SuffixFormat {
            file_type: "maf",
            suffix: ".maf",
        }));
        registry
    }

    #[test]
    fn test_resolve_by_pattern() {
        let registry = registry();
        let resolved = registry.resolve(&["sage_data.seg".to_string()], "SAGE", None);
        assert_eq!(resolved.unwrap().file_type(), "seg");
    }

    #[test]
    fn test_resolve_unmatched_is_none() {
        let registry = registry();
        assert!(registry
            .resolve(&["wrong.txt".to_string()], "SAGE", None)
            .is_none());
    }

    #[test]
    fn test_resolve_by_override() {
        let registry = registry();
        let resolved = registry.resolve(&["wrong.txt".to_string()], "SAGE", Some("maf"));
        assert_eq!(resolved.unwrap().file_type(), "maf");
    }

    #[test]
    fn test_unknown_override_is_none() {
        let registry = registry();
        assert!(registry
            .resolve(&["wrong.txt".to_string()], "SAGE", Some("bed"))
            .is_none());
    }
}
