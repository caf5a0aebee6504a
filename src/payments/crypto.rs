//! Keyed-hash signature primitives for gateway payloads
//!
//! Redsys signs the base64-encoded merchant parameters with HMAC-SHA256
//! under a per-order key derived by 3DES-encrypting the order id with the
//! merchant secret. The legacy scheme signs a flat field concatenation with
//! plain SHA1. Both directions (request and notification) share these
//! primitives.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use openssl::symm::{Cipher, Crypter, Mode};
use sha2::Sha256;

use crate::payments::error::{PaymentError, PaymentResult};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `message` under `key`, base64-encoded.
pub fn hmac_sha256_b64(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Derives the per-order Redsys signing key: 3DES-CBC of the order id under
/// the base64-decoded merchant secret, zero IV, zero padding.
pub fn derive_order_key(secret_b64: &str, order: &str) -> PaymentResult<Vec<u8>> {
    let key = BASE64.decode(secret_b64)?;
    // Key must be 24 bytes for 3DES
    if key.len() != 24 {
        return Err(PaymentError::encoding(format!(
            "Redsys secret must decode to 24 bytes, got {}",
            key.len()
        )));
    }

    let block_size = 8;
    let mut plaintext = order.as_bytes().to_vec();
    let partial = plaintext.len() % block_size;
    if partial != 0 {
        plaintext.extend(std::iter::repeat(0u8).take(block_size - partial));
    }

    let iv = [0u8; 8];
    let cipher = Cipher::des_ede3_cbc();
    let mut crypter = Crypter::new(cipher, Mode::Encrypt, &key, Some(&iv))?;
    crypter.pad(false);

    let mut encrypted = vec![0u8; plaintext.len() + cipher.block_size()];
    let mut written = crypter.update(&plaintext, &mut encrypted)?;
    written += crypter.finalize(&mut encrypted[written..])?;
    encrypted.truncate(written);
    Ok(encrypted)
}

/// Redsys HMAC-SHA256 signature over the encoded merchant parameters,
/// keyed per order.
pub fn redsys_signature(secret_b64: &str, order: &str, params_b64: &str) -> PaymentResult<String> {
    let order_key = derive_order_key(secret_b64, order)?;
    Ok(hmac_sha256_b64(&order_key, params_b64.as_bytes()))
}

/// Flat SHA1 digest as uppercase hex, the legacy Redsys signature form.
pub fn sha1_hex_upper(message: &str) -> String {
    hex::encode(openssl::sha::sha1(message.as_bytes())).to_ascii_uppercase()
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_eq(left: &str, right: &str) -> bool {
    if left.len() != right.len() {
        return false;
    }

    left.as_bytes()
        .iter()
        .zip(right.as_bytes().iter())
        .fold(0, |acc, (a, b)| acc | (a ^ b))
        == 0
}
