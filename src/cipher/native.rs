use aes::Aes128;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

use super::{Block, BlockCipher, KEY_LEN, KeySchedule};

/// AES-128 from the RustCrypto `aes` crate.
///
/// The crate picks hardware instructions at runtime and falls back to a
/// constant-time software implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAes;

struct NativeSchedule(Aes128);

impl KeySchedule for NativeSchedule {
    fn encrypt_block(&self, block: &mut Block) {
        self.0.encrypt_block(aes::Block::from_mut_slice(block));
    }

    fn decrypt_block(&self, block: &mut Block) {
        self.0.decrypt_block(aes::Block::from_mut_slice(block));
    }
}

impl BlockCipher for NativeAes {
    fn name(&self) -> &'static str {
        "native"
    }

    fn expand(&self, key: &[u8; KEY_LEN]) -> Box<dyn KeySchedule> {
        // Round keys are zeroized on drop via the `zeroize` feature of `aes`.
        Box::new(NativeSchedule(Aes128::new(key.into())))
    }
}
