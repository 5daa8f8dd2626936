//! Property tests for the codec
//!
//! PBKDF2 runs with a single iteration here; the format logic under test
//! does not depend on the count.

use proptest::prelude::*;
use saltedecb::padding;
use saltedecb::{CipherBackend, ErrorKind, FileCodec};

fn fast_codec(backend: CipherBackend) -> FileCodec<'static> {
    FileCodec::new(backend.cipher()).with_iterations(1)
}

fn arb_backend() -> impl Strategy<Value = CipherBackend> {
    prop_oneof![Just(CipherBackend::Native), Just(CipherBackend::Reference)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// decrypt(encrypt(x)) == x, and the body length follows the PKCS#7 law.
    #[test]
    fn roundtrip_and_length_law(
        plaintext in proptest::collection::vec(any::<u8>(), 0..300),
        passphrase in proptest::collection::vec(any::<u8>(), 0..32),
        backend in arb_backend(),
    ) {
        let codec = fast_codec(backend);
        let mut ciphertext = Vec::new();
        let n = codec.encrypt(&plaintext[..], &mut ciphertext, &passphrase).unwrap();
        prop_assert_eq!(n, plaintext.len() as u64);
        prop_assert_eq!(&ciphertext[..8], b"Salted__");
        prop_assert_eq!(ciphertext.len() - 16, (plaintext.len() / 16 + 1) * 16);

        let mut decrypted = Vec::new();
        codec.decrypt(&ciphertext[..], &mut decrypted, &passphrase).unwrap();
        prop_assert_eq!(decrypted, plaintext);
    }

    /// Same salt, same input: all backends agree byte for byte.
    #[test]
    fn backends_agree(
        plaintext in proptest::collection::vec(any::<u8>(), 0..200),
        salt in any::<[u8; 8]>(),
    ) {
        let mut native = Vec::new();
        let mut reference = Vec::new();
        fast_codec(CipherBackend::Native)
            .encrypt_with_salt(&plaintext[..], &mut native, b"pw", &salt)
            .unwrap();
        fast_codec(CipherBackend::Reference)
            .encrypt_with_salt(&plaintext[..], &mut reference, b"pw", &salt)
            .unwrap();
        prop_assert_eq!(native, reference);
    }

    /// Decrypting under any passphrase either fails with BadDecrypt and
    /// leaves every block in the output, or strips 1..=16 bytes.
    #[test]
    fn wrong_passphrase_is_bad_decrypt_or_structurally_valid(
        plaintext in proptest::collection::vec(any::<u8>(), 0..100),
        wrong in "[a-z]{1,12}",
    ) {
        let codec = fast_codec(CipherBackend::Native);
        let mut ciphertext = Vec::new();
        codec.encrypt(&plaintext[..], &mut ciphertext, b"the right one").unwrap();
        let body_len = ciphertext.len() - 16;

        let mut out = Vec::new();
        match codec.decrypt(&ciphertext[..], &mut out, wrong.as_bytes()) {
            Ok(n) => {
                prop_assert_eq!(out.len() as u64, n);
                prop_assert!(out.len() < body_len && out.len() >= body_len - 16);
            }
            Err(e) => {
                prop_assert_eq!(e.kind, Some(ErrorKind::BadDecrypt));
                prop_assert_eq!(out.len(), body_len);
            }
        }
    }

    /// Any block whose last byte is outside 1..=16 is rejected.
    #[test]
    fn out_of_range_pad_byte_rejected(
        mut block in any::<[u8; 16]>(),
        last in prop_oneof![Just(0u8), 17u8..=255],
    ) {
        block[15] = last;
        prop_assert!(padding::validate_and_unpad(&block).is_err());
    }

    #[test]
    fn pad_then_unpad(mut block in any::<[u8; 16]>(), filled in 0usize..16) {
        prop_assert!(padding::pad(&mut block, filled));
        prop_assert_eq!(padding::validate_and_unpad(&block), Ok(16 - filled));
    }
}
