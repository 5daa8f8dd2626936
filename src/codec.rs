//! Streaming encrypt/decrypt of the salted file format
//!
//! The format is:
//! - magic: 8 bytes, ASCII `Salted__`
//! - salt: 8 bytes
//! - body: AES-128-ECB blocks of 16 bytes, the last one PKCS#7 padded
//!
//! The key is PBKDF2-HMAC-SHA256 over the passphrase and salt. Output is
//! byte-compatible with `openssl enc -aes-128-ecb -pbkdf2 -iter 10000 -md sha256`.
//!
//! Both directions stream one block at a time. Decryption writes every
//! plaintext block as soon as it is produced and, once the input is
//! exhausted, cuts the padding off the sink through [`Truncate`].

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write};

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::cipher::{BLOCK_SIZE, Block, BlockCipher};
use crate::error::{ErrorCategory, ErrorKind, Result, SaltedError};
use crate::kdf::{self, DEFAULT_ITERATIONS, SALT_LEN, Salt};
use crate::padding;

/// Magic marker at the start of every encrypted file
pub const MAGIC: &[u8; 8] = b"Salted__";

/// Magic marker plus salt
pub const HEADER_LEN: usize = MAGIC.len() + SALT_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

/// Output sinks whose tail can be cut off after it has been written.
pub trait Truncate {
    /// Removes the last `n` bytes written and leaves the write position at
    /// the new end.
    fn truncate_by(&mut self, n: u64) -> io::Result<()>;
}

fn shorter_than(len: u64, n: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("cannot truncate {n} bytes from a {len}-byte sink"),
    )
}

impl Truncate for File {
    fn truncate_by(&mut self, n: u64) -> io::Result<()> {
        let end = self.stream_position()?;
        let new_end = end.checked_sub(n).ok_or_else(|| shorter_than(end, n))?;
        self.set_len(new_end)?;
        self.seek(SeekFrom::Start(new_end))?;
        Ok(())
    }
}

impl Truncate for Vec<u8> {
    fn truncate_by(&mut self, n: u64) -> io::Result<()> {
        let len = self.len() as u64;
        let new_len = len.checked_sub(n).ok_or_else(|| shorter_than(len, n))?;
        self.truncate(new_len as usize);
        Ok(())
    }
}

impl Truncate for Cursor<Vec<u8>> {
    fn truncate_by(&mut self, n: u64) -> io::Result<()> {
        let end = self.position();
        let new_end = end.checked_sub(n).ok_or_else(|| shorter_than(end, n))?;
        self.get_mut().truncate(new_end as usize);
        self.set_position(new_end);
        Ok(())
    }
}

impl<W: Write + Truncate> Truncate for BufWriter<W> {
    fn truncate_by(&mut self, n: u64) -> io::Result<()> {
        self.flush()?;
        self.get_mut().truncate_by(n)
    }
}

impl<T: Truncate + ?Sized> Truncate for &mut T {
    fn truncate_by(&mut self, n: u64) -> io::Result<()> {
        (**self).truncate_by(n)
    }
}

/// The encryption engine for one operation.
///
/// Holds the cipher implementation picked at startup and the PBKDF2
/// iteration count. It knows nothing about which cipher backend it drives.
#[derive(Clone, Copy)]
pub struct FileCodec<'a> {
    cipher: &'a dyn BlockCipher,
    iterations: u32,
}

impl<'a> FileCodec<'a> {
    pub fn new(cipher: &'a dyn BlockCipher) -> Self {
        Self {
            cipher,
            iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Overrides the PBKDF2 iteration count. Files written with a
    /// non-default count can only be read back with the same count.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Runs one operation in the given direction.
    ///
    /// Returns the number of plaintext bytes read (encrypt) or written
    /// (decrypt).
    pub fn run<R, W>(&self, mode: Mode, source: R, destination: W, passphrase: &[u8]) -> Result<u64>
    where
        R: Read,
        W: Write + Truncate,
    {
        match mode {
            Mode::Encrypt => self.encrypt(source, destination, passphrase),
            Mode::Decrypt => self.decrypt(source, destination, passphrase),
        }
    }

    /// Encrypts `source` into `destination` under a fresh random salt.
    pub fn encrypt<R, W>(&self, source: R, destination: W, passphrase: &[u8]) -> Result<u64>
    where
        R: Read,
        W: Write,
    {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        self.encrypt_with_salt(source, destination, passphrase, &salt)
    }

    /// Encrypts with a caller-provided salt.
    ///
    /// Only for reproducible output in tests. Reusing a salt across
    /// encryptions makes identical plaintext blocks visible across files.
    pub fn encrypt_with_salt<R, W>(
        &self,
        mut source: R,
        mut destination: W,
        passphrase: &[u8],
        salt: &Salt,
    ) -> Result<u64>
    where
        R: Read,
        W: Write,
    {
        let key = kdf::derive_key(passphrase, salt, self.iterations)?;
        let schedule = self.cipher.expand(&key);
        debug!(
            cipher = self.cipher.name(),
            iterations = self.iterations,
            "encrypting"
        );

        destination.write_all(MAGIC).map_err(write_error)?;
        destination.write_all(salt).map_err(write_error)?;

        let mut block: Zeroizing<Block> = Zeroizing::new([0u8; BLOCK_SIZE]);
        let mut plaintext_len: u64 = 0;
        let mut blocks: u64 = 0;
        loop {
            let n = read_block(&mut source, &mut block[..]).map_err(read_error)?;
            plaintext_len += n as u64;

            let is_final = padding::pad(&mut block, n);
            schedule.encrypt_block(&mut block);
            destination.write_all(&block[..]).map_err(write_error)?;
            blocks += 1;

            if is_final {
                break;
            }
        }
        destination.flush().map_err(write_error)?;

        debug!(blocks, plaintext_len, "encryption complete");
        Ok(plaintext_len)
    }

    /// Decrypts `source` into `destination`.
    ///
    /// On [`ErrorKind::BadDecrypt`] the destination keeps everything written
    /// so far, padding included. Callers should discard it.
    pub fn decrypt<R, W>(&self, mut source: R, mut destination: W, passphrase: &[u8]) -> Result<u64>
    where
        R: Read,
        W: Write + Truncate,
    {
        let salt = read_salt(&mut source)?;
        let key = kdf::derive_key(passphrase, &salt, self.iterations)?;
        let schedule = self.cipher.expand(&key);
        debug!(
            cipher = self.cipher.name(),
            iterations = self.iterations,
            "decrypting"
        );

        let mut ciphertext: Block = [0u8; BLOCK_SIZE];
        let mut last_block: Zeroizing<Block> = Zeroizing::new([0u8; BLOCK_SIZE]);
        let mut blocks: u64 = 0;
        loop {
            let n = read_block(&mut source, &mut ciphertext).map_err(read_error)?;
            if n == 0 {
                break;
            }
            if n < BLOCK_SIZE {
                return Err(SaltedError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::TruncatedInput,
                    "input ended inside a ciphertext block; likely truncated",
                ));
            }

            *last_block = ciphertext;
            schedule.decrypt_block(&mut last_block);
            destination.write_all(&last_block[..]).map_err(write_error)?;
            blocks += 1;
        }

        if blocks == 0 {
            return Err(SaltedError::with_kind(
                ErrorCategory::User,
                ErrorKind::BadDecrypt,
                "bad decrypt: input has a header but no ciphertext blocks",
            ));
        }

        match padding::validate_and_unpad(&last_block) {
            Ok(pad_len) => {
                destination
                    .truncate_by(pad_len as u64)
                    .map_err(|e| SaltedError::io("failed to strip padding from output", e))?;
                destination.flush().map_err(write_error)?;
                let plaintext_len = blocks * BLOCK_SIZE as u64 - pad_len as u64;
                debug!(blocks, plaintext_len, "decryption complete");
                Ok(plaintext_len)
            }
            Err(e) => {
                destination.flush().map_err(write_error)?;
                Err(SaltedError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::BadDecrypt,
                    "bad decrypt: wrong passphrase or corrupt input",
                    e,
                ))
            }
        }
    }
}

/// Reads the salt, with or without the magic marker in front of it.
///
/// Input that does not start with [`MAGIC`] is taken to be a bare
/// `salt || blocks` stream, so its first 8 bytes are the salt.
fn read_salt<R: Read + ?Sized>(source: &mut R) -> Result<Salt> {
    let mut first = [0u8; MAGIC.len()];
    read_header_field(source, &mut first, "magic marker")?;
    if &first == MAGIC {
        let mut salt = [0u8; SALT_LEN];
        read_header_field(source, &mut salt, "salt")?;
        debug!("found salted header");
        Ok(salt)
    } else {
        warn!("input does not start with the Salted__ marker; using its first 8 bytes as the salt");
        Ok(first)
    }
}

fn read_header_field<R: Read + ?Sized>(source: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    let n = read_block(source, buf).map_err(read_error)?;
    if n < buf.len() {
        return Err(SaltedError::with_kind(
            ErrorCategory::User,
            ErrorKind::TruncatedInput,
            format!("input likely truncated while reading {what}"),
        ));
    }
    Ok(())
}

/// Fills `buf` from `source`, stopping early only at end of input.
///
/// Returns how many bytes were read; less than `buf.len()` means the input
/// is exhausted.
fn read_block<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_error(err: io::Error) -> SaltedError {
    SaltedError::io("failed to read input", err)
}

fn write_error(err: io::Error) -> SaltedError {
    SaltedError::io("failed to write output", err)
}
