use std::error::Error as StdError;
use std::io;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to the user.
    ///
    /// Internal is never a guarantee that the user did nothing wrong, only
    /// that the code cannot tell.
    Internal,

    /// The user provided invalid input (a missing file, a wrong passphrase,
    /// a file that is not in the salted format).
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The input file does not exist. Nothing was written.
    InputNotFound,
    /// Padding of the final decrypted block was invalid. Usually a wrong
    /// passphrase, but can also be corruption.
    BadDecrypt,
    /// Input ended inside the header or inside a ciphertext block.
    TruncatedInput,
    /// PBKDF2 rejected its parameters.
    KeyDerivation,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Reading the input or writing the output failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct SaltedError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Consumers MUST handle the absence
    /// of a kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl SaltedError {
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Wraps an I/O failure on one of the two streams.
    ///
    /// `NotFound` is attributed to the user, anything else is internal.
    pub fn io(msg: impl Into<String>, err: io::Error) -> Self {
        let category = if err.kind() == io::ErrorKind::NotFound {
            ErrorCategory::User
        } else {
            ErrorCategory::Internal
        };
        Self::with_kind_and_source(category, ErrorKind::Io, msg, err)
    }

    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns true if this error, or any error it wraps, carries `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        if self.kind == Some(kind) {
            return true;
        }
        let mut source = self.source.as_deref().map(|s| s as &(dyn StdError + 'static));
        while let Some(err) = source {
            if let Some(salted) = err.downcast_ref::<SaltedError>() {
                if salted.kind == Some(kind) {
                    return true;
                }
            }
            source = err.source();
        }
        false
    }

    /// Wraps the current error with a higher-level message while preserving
    /// the original as source. Category and kind carry over.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SaltedError>;
