//! Passphrase sources

use crate::error::{ErrorCategory, ErrorKind, Result, SaltedError};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// The result is wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// A passphrase given up front, e.g. on the command line.
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads the passphrase from any io::Read source until EOF.
///
/// A single trailing line ending (`\n` or `\r\n`) is dropped so that
/// `echo secret | saltedecb ...` behaves as expected. Everything else,
/// including non-UTF-8 bytes, is kept verbatim.
pub struct ReaderPassphraseReader<R> {
    reader: R,
}

impl<R: Read> ReaderPassphraseReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> PassphraseReader for ReaderPassphraseReader<R> {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            SaltedError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        if data.last() == Some(&b'\n') {
            data.pop();
            if data.last() == Some(&b'\r') {
                data.pop();
            }
        }
        Ok(data)
    }
}

/// Prompts on stderr and reads from the terminal with echo disabled.
#[derive(Default)]
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Terminal input is limited to UTF-8 (an rpassword constraint). Use
    /// `--passphrase-stdin` for arbitrary bytes.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(SaltedError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "no passphrase given and stdin is not a terminal; use --passphrase or --passphrase-stdin",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(b"Passphrase (saltedecb): ")
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                SaltedError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // rpassword hands back a plain String; move it straight into a
        // zeroizing buffer.
        let passphrase = rpassword::read_password().map_err(|e| {
            SaltedError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}
