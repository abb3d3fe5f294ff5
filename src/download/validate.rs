//! Artifact acceptance rules.
//!
//! A downloaded byte stream qualifies as a document when the server did not
//! declare a non-PDF content type and the payload clears the configured
//! minimum size, both as declared by headers and as actually written.

use thiserror::Error;

/// Why an artifact was rejected. Checked in order; first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Declared content type does not indicate a PDF.
    #[error("wrong content type: {content_type}")]
    WrongContentType {
        /// The declared Content-Type value.
        content_type: String,
    },

    /// Declared Content-Length is below the minimum-size threshold.
    #[error("too small by header: {declared} bytes < {min} bytes")]
    TooSmallDeclared {
        /// Declared size in bytes.
        declared: u64,
        /// Configured minimum in bytes.
        min: u64,
    },

    /// Actual byte count after retrieval is below the minimum-size threshold.
    #[error("too small: {actual} bytes < {min} bytes")]
    TooSmallActual {
        /// Written size in bytes.
        actual: u64,
        /// Configured minimum in bytes.
        min: u64,
    },
}

/// Size/content-type validator with a configured minimum size.
///
/// The threshold comes from [`Config::min_size_bytes`](crate::Config); the
/// rules themselves carry no constants.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    min_size_bytes: u64,
}

impl Validator {
    /// Creates a validator with the given minimum artifact size in bytes.
    #[must_use]
    pub fn new(min_size_bytes: u64) -> Self {
        Self { min_size_bytes }
    }

    /// Checks declared response headers before any bytes are written.
    ///
    /// An absent content type or content length passes: plenty of servers
    /// omit them for valid documents.
    ///
    /// # Errors
    ///
    /// Returns the first matching [`Rejection`].
    pub fn check_headers(
        &self,
        content_type: Option<&str>,
        content_length: Option<u64>,
    ) -> Result<(), Rejection> {
        if let Some(content_type) = content_type
            && !content_type.to_lowercase().contains("pdf")
        {
            return Err(Rejection::WrongContentType {
                content_type: content_type.to_string(),
            });
        }

        if let Some(declared) = content_length
            && declared < self.min_size_bytes
        {
            return Err(Rejection::TooSmallDeclared {
                declared,
                min: self.min_size_bytes,
            });
        }

        Ok(())
    }

    /// Checks the actual byte count after full retrieval.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::TooSmallActual`] for undersized payloads.
    pub fn check_size(&self, actual: u64) -> Result<(), Rejection> {
        if actual < self.min_size_bytes {
            return Err(Rejection::TooSmallActual {
                actual,
                min: self.min_size_bytes,
            });
        }
        Ok(())
    }
}
