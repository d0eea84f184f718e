//! Format validator seam
//!
//! Content validation is type-specific and pluggable: each file
//! format implements [`FormatValidator`] and is resolved through an
//! explicit [`FormatRegistry`] passed into the run. The registry
//! resolves by filename pattern, or by an explicit override from the
//! run options. The reconciler core never parses file contents
//! itself.

mod registry;

pub use registry::FormatRegistry;

use crate::types::ProcessingMode;
use async_trait::async_trait;
use intake_common::Result;

/// Leading banner of a clean validation message
pub const VALIDATED_BANNER: &str = "YOUR FILE IS VALIDATED!\n";
/// Banner introducing collected errors
pub const ERRORS_BANNER: &str = "----------------ERRORS----------------\n";
/// Banner introducing collected warnings
pub const WARNINGS_BANNER: &str = "-------------WARNINGS-------------\n";

/// Error text when no format matches the uploaded filename
pub const FILENAME_INCORRECT_MESSAGE: &str =
    "Your filename is incorrect! Please change your filename before uploading again.";

/// Context handed to every validator invocation
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Center whose files are being validated
    pub center: String,
    /// Processing mode of the surrounding run
    pub processing: ProcessingMode,
    /// Opaque per-run validator options
    pub options: serde_json::Value,
}

/// Raw outcome of a format validator: the error and warning text it
/// collected, before collation into a user-facing message.
#[derive(Debug, Clone, Default)]
pub struct FormatCheck {
    pub valid: bool,
    pub errors: String,
    pub warnings: String,
}

impl FormatCheck {
    /// A clean result with no errors or warnings
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: String::new(),
            warnings: String::new(),
        }
    }

    /// An invalid result carrying the given error text
    pub fn invalid(errors: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: errors.into(),
            warnings: String::new(),
        }
    }
}

/// Type-specific content validator for one file format.
///
/// Implementations live outside this crate (or in test stubs); the
/// core only dispatches to them and collates their output.
#[async_trait]
pub trait FormatValidator: Send + Sync {
    /// File type tag recorded in both persisted tables
    fn file_type(&self) -> &'static str;

    /// Whether this format claims the given group of filenames.
    ///
    /// Patterns may be center-specific (for example the clinical pair
    /// embeds the center name).
    fn matches_filename(&self, filenames: &[String], center: &str) -> bool;

    /// Validate the group's content, given the paths in entity order
    async fn validate(&self, paths: &[String], ctx: &ValidationContext) -> Result<FormatCheck>;
}

/// Collate raw error and warning text into one user-facing message.
///
/// An empty error string means the file passed; warnings are appended
/// either way.
pub fn collate_errors_and_warnings(errors: &str, warnings: &str) -> String {
    let mut message = if errors.is_empty() {
        VALIDATED_BANNER.to_string()
    } else {
        format!("{}{}", ERRORS_BANNER, errors)
    };
    if !warnings.is_empty() {
        message.push_str(WARNINGS_BANNER);
        message.push_str(warnings);
    }
    message
}
