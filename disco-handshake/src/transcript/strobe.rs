use strobe_rs::{SecParam, Strobe};
use zeroize::Zeroize;

use super::Transcript;
use crate::error::Error;

/// Default authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// The other supported tag length.
pub const LONG_TAG_LEN: usize = 32;

/// Sponge rate of STROBE-128 in bytes: `200 - 128 / 4 - 2`.
pub const STROBE_R: usize = 166;

/// [`Transcript`] backed by a STROBE-128 duplex over Keccak-f\[1600\].
///
/// AEAD is `send_ENC(plaintext)`, `AD(associated_data)`, `send_MAC(tag_len)`,
/// mirrored by the `recv_*` operations on the receiving side.
#[derive(Clone)]
pub struct StrobeTranscript {
    strobe: Strobe,
    tag_len: usize,
}

impl core::fmt::Debug for StrobeTranscript {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StrobeTranscript")
            .field("tag_len", &self.tag_len)
            .finish_non_exhaustive()
    }
}

impl Transcript for StrobeTranscript {
    const RATCHET_LEN: usize = STROBE_R;

    fn new(label: &[u8]) -> Self {
        Self {
            strobe: Strobe::new(label, SecParam::B128),
            tag_len: TAG_LEN,
        }
    }

    fn set_auth_tag_length(&mut self, len: usize) -> Result<(), Error> {
        match len {
            TAG_LEN | LONG_TAG_LEN => {
                self.tag_len = len;
                Ok(())
            }
            _ => Err(Error::UnsupportedTagLength),
        }
    }

    fn tag_len(&self) -> usize {
        self.tag_len
    }

    fn mix_associated_data(&mut self, data: &[u8]) {
        self.strobe.ad(data, false);
    }

    fn mix_meta_data(&mut self, data: &[u8]) {
        self.strobe.meta_ad(data, false);
    }

    fn send_cleartext(&mut self, data: &[u8]) {
        self.strobe.send_clr(data, false);
    }

    fn receive_cleartext(&mut self, data: &[u8]) {
        self.strobe.recv_clr(data, false);
    }

    fn seal(&mut self, plaintext: &[u8], associated_data: &[u8], out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(plaintext);
        self.strobe.send_enc(&mut out[start..], false);
        self.strobe.ad(associated_data, false);

        let tag_start = out.len();
        out.resize(tag_start + self.tag_len, 0);
        self.strobe.send_mac(&mut out[tag_start..], false);
    }

    fn open(
        &mut self,
        ciphertext: &[u8],
        associated_data: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let body_len = ciphertext
            .len()
            .checked_sub(self.tag_len)
            .ok_or(Error::AuthenticationFailure)?;
        let (body, tag) = ciphertext.split_at(body_len);

        let start = out.len();
        out.extend_from_slice(body);
        self.strobe.recv_enc(&mut out[start..], false);
        self.strobe.ad(associated_data, false);

        let verified = match self.tag_len {
            TAG_LEN => recv_tag::<TAG_LEN>(&mut self.strobe, tag),
            LONG_TAG_LEN => recv_tag::<LONG_TAG_LEN>(&mut self.strobe, tag),
            _ => Err(Error::UnsupportedTagLength),
        };
        if verified.is_err() {
            out[start..].zeroize();
            out.truncate(start);
            return Err(Error::AuthenticationFailure);
        }
        Ok(())
    }

    fn mix_key(&mut self, secret: &[u8]) {
        self.strobe.key(secret, false);
    }

    fn ratchet(&mut self, len: usize) {
        self.strobe.ratchet(len, false);
    }

    fn prf(&mut self, out: &mut [u8]) {
        self.strobe.prf(out, false);
    }
}

/// `recv_MAC` over a tag whose length is fixed at compile time.
fn recv_tag<const N: usize>(strobe: &mut Strobe, tag: &[u8]) -> Result<(), Error> {
    let tag = <&[u8; N]>::try_from(tag).map_err(|_| Error::AuthenticationFailure)?;
    strobe
        .recv_mac(tag)
        .map_err(|_| Error::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_pair() -> (StrobeTranscript, StrobeTranscript) {
        let mut a = StrobeTranscript::new(b"transcript test");
        let mut b = StrobeTranscript::new(b"transcript test");
        a.mix_key(&[0x42u8; 32]);
        b.mix_key(&[0x42u8; 32]);
        (a, b)
    }

    #[test]
    fn seal_open_round_trip() {
        let (mut tx, mut rx) = keyed_pair();

        let mut ct = Vec::new();
        tx.seal(b"strobe payload", b"ad", &mut ct);
        assert_eq!(ct.len(), b"strobe payload".len() + TAG_LEN);
        assert_ne!(&ct[..14], b"strobe payload");

        let mut pt = Vec::new();
        rx.open(&ct, b"ad", &mut pt).unwrap();
        assert_eq!(pt, b"strobe payload");
    }

    #[test]
    fn seal_appends_to_existing_buffer() {
        let (mut tx, mut rx) = keyed_pair();

        let mut buf = vec![7u8; 3];
        tx.seal(b"abc", &[], &mut buf);
        assert_eq!(&buf[..3], &[7, 7, 7]);

        let mut pt = vec![1u8];
        rx.open(&buf[3..], &[], &mut pt).unwrap();
        assert_eq!(pt, [1, b'a', b'b', b'c']);
    }

    #[test]
    fn open_rejects_modified_tag() {
        let (mut tx, mut rx) = keyed_pair();

        let mut ct = Vec::new();
        tx.seal(b"hello", &[], &mut ct);
        let last = ct.len() - 1;
        ct[last] ^= 0x01;

        let mut pt = vec![9u8];
        assert_eq!(rx.open(&ct, &[], &mut pt), Err(Error::AuthenticationFailure));
        assert_eq!(pt, [9u8]);
    }

    #[test]
    fn open_rejects_mismatched_associated_data() {
        let (mut tx, mut rx) = keyed_pair();

        let mut ct = Vec::new();
        tx.seal(b"hello", b"one", &mut ct);

        let mut pt = Vec::new();
        assert_eq!(
            rx.open(&ct, b"two", &mut pt),
            Err(Error::AuthenticationFailure)
        );
        assert!(pt.is_empty());
    }

    #[test]
    fn open_rejects_input_shorter_than_tag() {
        let (_, mut rx) = keyed_pair();
        let mut pt = Vec::new();
        assert_eq!(
            rx.open(&[0u8; TAG_LEN - 1], &[], &mut pt),
            Err(Error::AuthenticationFailure)
        );
    }

    #[test]
    fn custom_tag_length() {
        let (mut tx, mut rx) = keyed_pair();
        tx.set_auth_tag_length(LONG_TAG_LEN).unwrap();
        rx.set_auth_tag_length(LONG_TAG_LEN).unwrap();
        assert_eq!(tx.tag_len(), LONG_TAG_LEN);

        let mut ct = Vec::new();
        tx.seal(b"x", &[], &mut ct);
        assert_eq!(ct.len(), 33);

        let mut pt = Vec::new();
        rx.open(&ct, &[], &mut pt).unwrap();
        assert_eq!(pt, b"x");
    }

    #[test]
    fn unsupported_tag_length_is_rejected() {
        let (mut tx, _) = keyed_pair();
        assert_eq!(tx.set_auth_tag_length(20), Err(Error::UnsupportedTagLength));
        assert_eq!(tx.set_auth_tag_length(0), Err(Error::UnsupportedTagLength));
        assert_eq!(tx.tag_len(), TAG_LEN);
    }

    #[test]
    fn long_tag_rejects_short_tag() {
        let (mut tx, mut rx) = keyed_pair();
        rx.set_auth_tag_length(LONG_TAG_LEN).unwrap();

        let mut ct = Vec::new();
        tx.seal(b"sixteen-byte tag", &[], &mut ct);

        let mut pt = Vec::new();
        assert_eq!(rx.open(&ct, &[], &mut pt), Err(Error::AuthenticationFailure));
        assert!(pt.is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let mut original = StrobeTranscript::new(b"clone test");
        original.mix_associated_data(b"shared history");

        let mut clone = original.clone();
        clone.mix_associated_data(b"only in clone");

        let mut fresh = StrobeTranscript::new(b"clone test");
        fresh.mix_associated_data(b"shared history");

        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        original.prf(&mut a);
        fresh.prf(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn ratchet_changes_output() {
        let mut a = StrobeTranscript::new(b"ratchet test");
        let mut b = a.clone();
        a.ratchet(STROBE_R);

        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.prf(&mut out_a);
        b.prf(&mut out_b);
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn different_labels_diverge() {
        let mut a = StrobeTranscript::new(b"label one");
        let mut b = StrobeTranscript::new(b"label two");
        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.prf(&mut out_a);
        b.prf(&mut out_b);
        assert_ne!(out_a, out_b);
    }
}
