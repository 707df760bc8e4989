use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::KeyAgreement;
use crate::error::Error;
use crate::keys::{KeyPair, PublicKey};

/// DH output length in bytes (X25519 = 32).
pub const DH_LEN: usize = 32;

/// A shared secret resulting from a Diffie-Hellman operation.
///
/// Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; DH_LEN]);

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

impl SharedSecret {
    /// Access the raw 32-byte shared secret.
    pub fn as_bytes(&self) -> &[u8; DH_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for SharedSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// X25519 key agreement backed by `x25519-dalek`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct X25519;

impl KeyAgreement for X25519 {
    const DH_LEN: usize = DH_LEN;

    type KeyPair = KeyPair;
    type PublicKey = PublicKey;
    type SharedSecret = SharedSecret;

    fn generate_keypair(rng: &mut impl CryptoRngCore) -> KeyPair {
        KeyPair::generate(rng)
    }

    fn public_key(pair: &KeyPair) -> PublicKey {
        pair.public
    }

    fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey, Error> {
        PublicKey::from_slice(bytes)
    }

    fn dh(pair: &KeyPair, remote: &PublicKey) -> Result<SharedSecret, Error> {
        dh(pair, remote)
    }
}

/// Perform DH between a local key pair and a remote public key.
///
/// Returns `Error::BadKey` if the result is the all-zeros point
/// (low-order input), as required by RFC 7748 Section 6.1.
pub fn dh(local: &KeyPair, remote: &PublicKey) -> Result<SharedSecret, Error> {
    let shared = local.secret.inner().diffie_hellman(&remote.to_dalek());
    validate_shared_secret(shared.as_bytes())
}

/// Reject the all-zeros shared secret, which indicates a low-order public key.
fn validate_shared_secret(bytes: &[u8; DH_LEN]) -> Result<SharedSecret, Error> {
    let is_zero = bytes.ct_eq(&[0u8; DH_LEN]);
    if bool::from(is_zero) {
        Err(Error::BadKey)
    } else {
        Ok(SharedSecret(*bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn reject_zero_public_key() {
        let local = KeyPair::from_secret_bytes([1u8; 32]);
        let zero_pk = PublicKey::from_bytes([0u8; 32]);
        assert_eq!(dh(&local, &zero_pk).unwrap_err(), Error::BadKey);
    }

    #[test]
    fn reject_low_order_point() {
        let mut point = [0u8; 32];
        point[0] = 1;
        let local = KeyPair::from_secret_bytes([0x42u8; 32]);
        assert_eq!(
            dh(&local, &PublicKey::from_bytes(point)).unwrap_err(),
            Error::BadKey
        );
    }

    #[test]
    fn normal_dh_succeeds() {
        let a = X25519::generate_keypair(&mut OsRng);
        let b = X25519::generate_keypair(&mut OsRng);

        let shared1 = X25519::dh(&a, &X25519::public_key(&b)).unwrap();
        let shared2 = X25519::dh(&b, &X25519::public_key(&a)).unwrap();
        assert_eq!(shared1.as_bytes(), shared2.as_bytes());
    }

    #[test]
    fn public_key_from_bytes_checks_length() {
        assert_eq!(
            X25519::public_key_from_bytes(&[9u8; 16]).unwrap_err(),
            Error::BadKey
        );
        let pk = X25519::public_key_from_bytes(&[9u8; 32]).unwrap();
        assert_eq!(pk.as_bytes(), &[9u8; 32]);
    }
}
