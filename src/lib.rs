//! saltedecb - passphrase-based file encryption in the OpenSSL salted
//! AES-128-ECB format

#![forbid(unsafe_code)]

pub mod cipher;
pub mod codec;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod padding;
pub mod passphrase;

pub use cipher::{BlockCipher, CipherBackend, KeySchedule};
pub use codec::{FileCodec, Mode, Truncate};
pub use error::{ErrorCategory, ErrorKind, Result, SaltedError};
