//! Error types for warmstart core values.

use thiserror::Error;

/// Errors raised while building or parsing core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A textual value could not be parsed.
    #[error("failed to parse {what} from '{input}': {reason}")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// The offending input.
        input: String,
        /// Why parsing failed.
        reason: &'static str,
    },
}
