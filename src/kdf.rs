//! Passphrase to key derivation (PBKDF2-HMAC-SHA256)

use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::cipher::KEY_LEN;
use crate::error::{ErrorCategory, ErrorKind, Result, SaltedError};

/// Length of salt in bytes
pub const SALT_LEN: usize = 8;

/// PBKDF2 iteration count of the format (`openssl enc -pbkdf2` default)
pub const DEFAULT_ITERATIONS: u32 = 10_000;

pub type Salt = [u8; SALT_LEN];

/// Rejects iteration counts PBKDF2 cannot run with.
pub fn check_iterations(iterations: u32) -> Result<()> {
    if iterations == 0 {
        return Err(SaltedError::with_kind(
            ErrorCategory::User,
            ErrorKind::KeyDerivation,
            "PBKDF2 iteration count must be at least 1",
        ));
    }
    Ok(())
}

/// Derive a 16-byte key from a passphrase and salt.
///
/// Pure function of its inputs. The only error is an iteration count of
/// zero.
pub fn derive_key(
    passphrase: &[u8],
    salt: &Salt,
    iterations: u32,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    check_iterations(iterations)?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::<Hmac<Sha256>>(passphrase, salt, iterations, &mut key[..]).map_err(|e| {
        SaltedError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivation,
            format!("PBKDF2 key derivation failed: {e}"),
        )
    })?;

    Ok(key)
}
