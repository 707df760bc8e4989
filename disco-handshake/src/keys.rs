use rand_core::CryptoRngCore;
use x25519_dalek::{PublicKey as DalekPublicKey, StaticSecret as DalekStaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::x25519::DH_LEN;
use crate::error::Error;

/// An X25519 secret key, used for both static and ephemeral key pairs.
///
/// Zeroized from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StaticSecret(DalekStaticSecret);

impl StaticSecret {
    /// Create from raw 32-byte secret key material.
    pub fn from_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self(DalekStaticSecret::from(bytes))
    }

    /// Export the raw 32-byte secret key material.
    pub fn to_bytes(&self) -> [u8; DH_LEN] {
        self.0.to_bytes()
    }

    pub(crate) fn inner(&self) -> &DalekStaticSecret {
        &self.0
    }
}

/// An X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; DH_LEN]);

impl PublicKey {
    /// The length of a public key in bytes.
    pub const LEN: usize = DH_LEN;

    /// Create from raw 32-byte public key.
    pub fn from_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, failing with [`Error::BadKey`] unless it is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; DH_LEN] = bytes.try_into().map_err(|_| Error::BadKey)?;
        Ok(Self(bytes))
    }

    /// Access the raw bytes of this public key.
    pub fn as_bytes(&self) -> &[u8; DH_LEN] {
        &self.0
    }

    pub(crate) fn to_dalek(self) -> DalekPublicKey {
        DalekPublicKey::from(self.0)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PublicKey({:02x?})", &self.0[..4])
    }
}

/// A secret key and its corresponding public key.
///
/// Fills the local static and local ephemeral slots of a handshake.
#[derive(Clone)]
pub struct KeyPair {
    pub secret: StaticSecret,
    pub public: PublicKey,
}

impl KeyPair {
    /// Generate a new random keypair using the provided RNG.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        Self::from_secret(StaticSecret(DalekStaticSecret::random_from_rng(rng)))
    }

    /// Create a keypair from an existing secret.
    pub fn from_secret(secret: StaticSecret) -> Self {
        let public = DalekPublicKey::from(secret.inner());
        Self {
            secret,
            public: PublicKey(public.to_bytes()),
        }
    }

    /// Create a keypair from raw 32-byte secret key material.
    ///
    /// Derives the corresponding public key automatically.
    pub fn from_secret_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self::from_secret(StaticSecret::from_bytes(bytes))
    }

    /// Export the raw 32-byte secret key material.
    pub fn secret_bytes(&self) -> [u8; DH_LEN] {
        self.secret.to_bytes()
    }
}

impl core::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_secret_bytes_matches_dalek() {
        let bytes = [42u8; 32];
        let expected_public = DalekPublicKey::from(&DalekStaticSecret::from(bytes)).to_bytes();

        let kp = KeyPair::from_secret_bytes(bytes);

        assert_eq!(*kp.public.as_bytes(), expected_public);
    }

    #[test]
    fn secret_bytes_round_trips() {
        let bytes = [42u8; 32];
        let kp = KeyPair::from_secret_bytes(bytes);

        assert_eq!(kp.secret_bytes(), bytes);
    }

    #[test]
    fn public_key_from_slice_rejects_wrong_length() {
        assert_eq!(PublicKey::from_slice(&[1u8; 31]), Err(Error::BadKey));
        assert_eq!(PublicKey::from_slice(&[1u8; 33]), Err(Error::BadKey));
        assert!(PublicKey::from_slice(&[1u8; 32]).is_ok());
    }

    #[test]
    fn debug_does_not_print_secret() {
        let kp = KeyPair::from_secret_bytes([0xabu8; 32]);
        let rendered = format!("{kp:?}");
        assert!(rendered.starts_with("KeyPair { public: PublicKey("));
        assert!(!rendered.contains("secret"));
    }
}
