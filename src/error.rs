use thiserror::Error;

/// Errors surfaced by the synthesis core and its front-ends.
///
/// Out-of-memory conditions are not represented here: allocation failure
/// aborts the process and no recovery is attempted.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Ill-formed construction: a handle from a foreign context, `PropNot`
    /// over a non-atom, a rewriter applied outside its input domain, or a
    /// formula atom missing from the variable partition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed formula or partition text.
    #[error("parse error: {0}")]
    Parse(String),

    /// The cooperative cancellation flag was observed set.
    #[error("synthesis was cancelled")]
    Cancelled,

    /// A broken internal invariant; always a bug.
    #[error("internal error: {0}")]
    Internal(String),
}
