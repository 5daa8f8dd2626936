//! Golden test vector validation
//!
//! The vectors in testdata/golden-vectors.json were produced with
//! `openssl enc -aes-128-ecb -pbkdf2 -iter 10000 -md sha256 -S <salt>` and
//! the "Salted__" header prepended.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use saltedecb::{CipherBackend, FileCodec};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoldenVector {
    plaintext: String,
    ciphertext: String,
    passphrase: String,
    salt: String,
    comment: String,
}

struct Decoded {
    plaintext: Vec<u8>,
    ciphertext: Vec<u8>,
    passphrase: Vec<u8>,
    salt: [u8; 8],
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data).expect("failed to parse golden vectors")
}

fn decode(vector: &GoldenVector) -> Decoded {
    let b64 = |s: &str| BASE64_STANDARD.decode(s).expect("invalid base64 in vector");
    Decoded {
        plaintext: b64(&vector.plaintext),
        ciphertext: b64(&vector.ciphertext),
        passphrase: b64(&vector.passphrase),
        salt: b64(&vector.salt)
            .try_into()
            .expect("salt must be 8 bytes"),
    }
}

fn check_backend(backend: CipherBackend) {
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "No golden vectors were loaded");
    let codec = FileCodec::new(backend.cipher());

    for (i, vector) in vectors.iter().enumerate() {
        let v = decode(vector);

        let mut encrypted = Vec::new();
        codec
            .encrypt_with_salt(&v.plaintext[..], &mut encrypted, &v.passphrase, &v.salt)
            .unwrap_or_else(|e| panic!("vector {} ({}): encrypt failed: {}", i, vector.comment, e));
        assert_eq!(
            encrypted, v.ciphertext,
            "vector {} ({}): ciphertext mismatch with {}",
            i, vector.comment, backend
        );

        let mut decrypted = Vec::new();
        codec
            .decrypt(&v.ciphertext[..], &mut decrypted, &v.passphrase)
            .unwrap_or_else(|e| panic!("vector {} ({}): decrypt failed: {}", i, vector.comment, e));
        assert_eq!(
            decrypted, v.plaintext,
            "vector {} ({}): plaintext mismatch with {}",
            i, vector.comment, backend
        );
    }
}

#[test]
fn test_golden_vectors_native() {
    check_backend(CipherBackend::Native);
}

#[test]
fn test_golden_vectors_reference() {
    check_backend(CipherBackend::Reference);
}

#[test]
fn test_golden_vector_sizes() {
    for vector in load_golden_vectors() {
        let v = decode(&vector);
        let body = v.ciphertext.len() - 16;
        assert_eq!(body % 16, 0, "{}", vector.comment);
        assert_eq!(body, (v.plaintext.len() / 16 + 1) * 16, "{}", vector.comment);
        assert_eq!(&v.ciphertext[..8], b"Salted__");
        assert_eq!(&v.ciphertext[8..16], &v.salt);
    }
}
