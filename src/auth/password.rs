//! Salted password digests.
//!
//! Stored format: `<salt hex>$<blake3 hex>`, with a random 16-byte salt
//! per digest.

use rand::RngCore;

const SALT_LEN: usize = 16;

pub fn digest(plain: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    digest_with_salt(&salt, plain)
}

pub fn verify(stored: &str, plain: &str) -> bool {
    let Some((salt_hex, _)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = unhex(salt_hex) else {
        return false;
    };
    digest_with_salt(&salt, plain) == stored
}

fn digest_with_salt(salt: &[u8], plain: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(plain.as_bytes());
    format!("{}${}", hex(salt), hasher.finalize().to_hex())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
