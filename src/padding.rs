//! PKCS#7 padding for 16-byte blocks

use thiserror::Error;

use crate::cipher::{BLOCK_SIZE, Block};

/// The final block's padding is malformed.
///
/// This is a heuristic signal only. Decrypting with the wrong key yields
/// valid-looking padding roughly once in 256 attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid PKCS#7 padding (final byte {last_byte:#04x})")]
pub struct InvalidPadding {
    pub last_byte: u8,
}

/// Pads a block that was filled with `filled` bytes from the input.
///
/// A full block (`filled == BLOCK_SIZE`) is left untouched and is not final:
/// more input may follow. Anything shorter is the end of the input, so bytes
/// `filled..` are set to `BLOCK_SIZE - filled` and the block is final. An
/// empty read therefore produces a whole block of `0x10`.
///
/// Returns true if the block is the final one.
pub fn pad(block: &mut Block, filled: usize) -> bool {
    debug_assert!(filled <= BLOCK_SIZE);
    if filled >= BLOCK_SIZE {
        return false;
    }
    let pad_len = (BLOCK_SIZE - filled) as u8;
    block[filled..].fill(pad_len);
    true
}

/// Checks the padding of the last decrypted block and returns the number of
/// trailing bytes to discard (1 to 16).
pub fn validate_and_unpad(block: &Block) -> Result<usize, InvalidPadding> {
    let last_byte = block[BLOCK_SIZE - 1];
    let pad_len = usize::from(last_byte);
    if pad_len == 0 || pad_len > BLOCK_SIZE {
        return Err(InvalidPadding { last_byte });
    }
    if block[BLOCK_SIZE - pad_len..].iter().any(|&b| b != last_byte) {
        return Err(InvalidPadding { last_byte });
    }
    Ok(pad_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_block_not_padded() {
        let mut block = [0xAAu8; BLOCK_SIZE];
        assert!(!pad(&mut block, BLOCK_SIZE));
        assert_eq!(block, [0xAAu8; BLOCK_SIZE]);
    }

    #[test]
    fn test_empty_read_gives_full_pad_block() {
        let mut block = [0xAAu8; BLOCK_SIZE];
        assert!(pad(&mut block, 0));
        assert_eq!(block, [16u8; BLOCK_SIZE]);
    }

    #[test]
    fn test_partial_block() {
        let mut block = [0u8; BLOCK_SIZE];
        block[..5].copy_from_slice(b"hello");
        assert!(pad(&mut block, 5));
        assert_eq!(&block[..5], b"hello");
        assert!(block[5..].iter().all(|&b| b == 11));

        let mut block = [7u8; BLOCK_SIZE];
        assert!(pad(&mut block, 15));
        assert_eq!(block[15], 1);
    }

    #[test]
    fn test_unpad_inverts_pad() {
        for filled in 0..BLOCK_SIZE {
            let mut block = [0x42u8; BLOCK_SIZE];
            pad(&mut block, filled);
            assert_eq!(validate_and_unpad(&block), Ok(BLOCK_SIZE - filled));
        }
    }

    #[test]
    fn test_zero_pad_byte_rejected() {
        let block = [0u8; BLOCK_SIZE];
        assert_eq!(
            validate_and_unpad(&block),
            Err(InvalidPadding { last_byte: 0 })
        );
    }

    #[test]
    fn test_oversized_pad_byte_rejected() {
        let mut block = [17u8; BLOCK_SIZE];
        assert!(validate_and_unpad(&block).is_err());
        block[BLOCK_SIZE - 1] = 0xFF;
        assert!(validate_and_unpad(&block).is_err());
    }

    #[test]
    fn test_mismatched_pad_bytes_rejected() {
        let mut block = [0u8; BLOCK_SIZE];
        block[BLOCK_SIZE - 3..].copy_from_slice(&[3, 2, 3]);
        assert_eq!(
            validate_and_unpad(&block),
            Err(InvalidPadding { last_byte: 3 })
        );

        // Only the claimed number of bytes is checked.
        block[BLOCK_SIZE - 3..].copy_from_slice(&[9, 2, 2]);
        assert_eq!(validate_and_unpad(&block), Ok(2));
    }
}
