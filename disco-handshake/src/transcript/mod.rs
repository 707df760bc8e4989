//! The duplex transcript that carries every symmetric operation of the
//! handshake: hashing, keying, authenticated encryption and the final split.
//!
//! - [`Transcript`]: the capability the handshake engine drives
//! - [`strobe`]: STROBE-128 implementation (feature `strobe`)

use crate::error::Error;

#[cfg(feature = "strobe")]
pub mod strobe;

#[cfg(feature = "strobe")]
pub use strobe::StrobeTranscript;

/// A stateful duplex construction absorbing all handshake data.
///
/// Two transcripts initialized with the same label and fed the same
/// operations in lock-step (one side sending where the other receives)
/// stay in sync; any divergence surfaces as an authentication failure.
///
/// `Clone` must produce a fully independent copy: mutating the clone is
/// never observable through the original.
pub trait Transcript: Clone {
    /// Number of bytes the transcript destroys when ratcheting a split fork.
    const RATCHET_LEN: usize;

    /// Create a transcript domain-separated by `label`.
    fn new(label: &[u8]) -> Self;

    /// Set the length of authentication tags produced by [`Transcript::seal`].
    ///
    /// Fails with [`Error::UnsupportedTagLength`] if the implementation
    /// cannot produce tags of that length; the previous length is kept.
    fn set_auth_tag_length(&mut self, len: usize) -> Result<(), Error>;

    /// The current authentication tag length.
    fn tag_len(&self) -> usize;

    /// Absorb non-confidential associated data.
    fn mix_associated_data(&mut self, data: &[u8]);

    /// Absorb framing metadata, such as the labels separating split forks.
    fn mix_meta_data(&mut self, data: &[u8]) {
        self.mix_associated_data(data);
    }

    /// Absorb public data that travels in the clear from this side.
    fn send_cleartext(&mut self, data: &[u8]);

    /// Absorb public data received in the clear from the peer.
    fn receive_cleartext(&mut self, data: &[u8]);

    /// Encrypt and authenticate `plaintext`, appending
    /// `plaintext.len() + tag_len()` bytes to `out`.
    fn seal(&mut self, plaintext: &[u8], associated_data: &[u8], out: &mut Vec<u8>);

    /// Verify and decrypt `ciphertext`, appending the plaintext to `out`.
    ///
    /// Fails with [`Error::AuthenticationFailure`] for any bad input, whether
    /// it is too short to hold a tag or the tag does not verify. Nothing is
    /// appended to `out` on failure.
    fn open(
        &mut self,
        ciphertext: &[u8],
        associated_data: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), Error>;

    /// Absorb secret key material.
    fn mix_key(&mut self, secret: &[u8]);

    /// Irreversibly advance the state so earlier states cannot be recovered.
    fn ratchet(&mut self, len: usize);

    /// Squeeze pseudorandom output into `out`.
    fn prf(&mut self, out: &mut [u8]);
}
