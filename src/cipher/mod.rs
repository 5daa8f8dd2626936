//! Pluggable AES-128 block cipher
//!
//! The codec only ever talks to [`BlockCipher`] and [`KeySchedule`]. Which
//! implementation sits behind them is picked once at startup through
//! [`CipherBackend`]; every backend must produce bit-identical output and
//! they differ only in speed.

mod native;
mod reference;

use std::fmt;

pub use native::NativeAes;
pub use reference::ReferenceAes;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Cipher key size in bytes (AES-128).
pub const KEY_LEN: usize = 16;

pub type Block = [u8; BLOCK_SIZE];

/// Expanded key material for one key.
///
/// Created exactly once per operation by [`BlockCipher::expand`] and reused
/// for every block. Implementations must wipe their round keys on drop.
pub trait KeySchedule {
    fn encrypt_block(&self, block: &mut Block);
    fn decrypt_block(&self, block: &mut Block);
}

/// A block cipher implementation that can expand a key into a schedule.
pub trait BlockCipher {
    /// Short identifier, used in log output.
    fn name(&self) -> &'static str;

    fn expand(&self, key: &[u8; KEY_LEN]) -> Box<dyn KeySchedule>;
}

/// The fixed set of cipher implementations selectable at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CipherBackend {
    /// RustCrypto `aes`, using AES-NI / ARMv8 instructions when the CPU has them.
    #[default]
    Native,
    /// Portable byte-oriented implementation with an explicit 176-byte key schedule.
    Reference,
}

impl CipherBackend {
    pub fn cipher(self) -> &'static dyn BlockCipher {
        match self {
            CipherBackend::Native => &NativeAes,
            CipherBackend::Reference => &ReferenceAes,
        }
    }
}

impl fmt::Display for CipherBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cipher().name())
    }
}
