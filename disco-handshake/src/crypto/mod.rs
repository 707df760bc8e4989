//! Key agreement for the handshake.
//!
//! - [`KeyAgreement`]: the capability the handshake engine consumes
//! - [`x25519`]: X25519 Diffie-Hellman with low-order point rejection

use rand_core::CryptoRngCore;

use crate::error::Error;

pub mod x25519;

pub use x25519::X25519;

/// Key pair generation and Diffie-Hellman over a fixed curve.
///
/// The handshake engine only ever sees public keys as bytes on the wire;
/// `DH_LEN` is both the public key length and the shared secret length.
pub trait KeyAgreement {
    /// Length in bytes of an encoded public key and of a shared secret.
    const DH_LEN: usize;

    type KeyPair: Clone;
    type PublicKey: Copy + AsRef<[u8]>;
    type SharedSecret: AsRef<[u8]>;

    /// Generate a fresh key pair.
    fn generate_keypair(rng: &mut impl CryptoRngCore) -> Self::KeyPair;

    /// The public half of `pair`.
    fn public_key(pair: &Self::KeyPair) -> Self::PublicKey;

    /// Decode a public key received on the wire.
    fn public_key_from_bytes(bytes: &[u8]) -> Result<Self::PublicKey, Error>;

    /// Compute the shared secret between a local key pair and a remote public key.
    fn dh(pair: &Self::KeyPair, remote: &Self::PublicKey) -> Result<Self::SharedSecret, Error>;
}
