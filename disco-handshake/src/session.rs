use zeroize::Zeroizing;

use crate::handshake::Role;
use crate::transcript::Transcript;

/// Length of the channel-binding hash carried by a [`SessionPair`].
pub const HANDSHAKE_HASH_LEN: usize = 32;

/// Label absorbed into the initiator-to-responder fork.
pub(crate) const INITIATOR_LABEL: &[u8] = b"initiator";
/// Label absorbed into the responder-to-initiator fork.
pub(crate) const RESPONDER_LABEL: &[u8] = b"responder";

/// One direction of post-handshake traffic.
///
/// Owns an independent, ratcheted transcript; it shares nothing with the
/// handshake that produced it or with its sibling.
pub struct SessionState<T: Transcript> {
    transcript: T,
}

impl<T: Transcript> SessionState<T> {
    pub(crate) fn new(transcript: T) -> Self {
        Self { transcript }
    }

    /// The underlying transcript.
    pub fn transcript(&self) -> &T {
        &self.transcript
    }

    /// Mutable access to the underlying transcript, for sealing and opening.
    pub fn transcript_mut(&mut self) -> &mut T {
        &mut self.transcript
    }

    /// Unwrap into the underlying transcript.
    pub fn into_transcript(self) -> T {
        self.transcript
    }

    /// Squeeze pseudorandom output from this session's transcript.
    pub fn prf(&mut self, out: &mut [u8]) {
        self.transcript.prf(out);
    }
}

impl<T: Transcript + core::fmt::Debug> core::fmt::Debug for SessionState<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionState")
            .field("transcript", &self.transcript)
            .finish()
    }
}

/// The two session states produced by a completed handshake.
///
/// The assignment is the same on both peers:
/// - `initiator_to_responder`: initiator writes, responder reads
/// - `responder_to_initiator`: responder writes, initiator reads
pub struct SessionPair<T: Transcript> {
    pub initiator_to_responder: SessionState<T>,
    pub responder_to_initiator: SessionState<T>,
    handshake_hash: Zeroizing<[u8; HANDSHAKE_HASH_LEN]>,
}

impl<T: Transcript> SessionPair<T> {
    /// Fork a finished handshake transcript into both directions.
    ///
    /// The channel-binding hash is squeezed from a clone taken before
    /// forking, so it never touches either session state.
    pub(crate) fn split(transcript: T) -> Self {
        let mut handshake_hash = Zeroizing::new([0u8; HANDSHAKE_HASH_LEN]);
        transcript.clone().prf(&mut *handshake_hash);

        let mut initiator = transcript.clone();
        initiator.mix_meta_data(INITIATOR_LABEL);
        initiator.ratchet(T::RATCHET_LEN);

        let mut responder = transcript;
        responder.mix_meta_data(RESPONDER_LABEL);
        responder.ratchet(T::RATCHET_LEN);

        Self {
            initiator_to_responder: SessionState::new(initiator),
            responder_to_initiator: SessionState::new(responder),
            handshake_hash,
        }
    }

    /// A value both peers share after a successful handshake.
    ///
    /// Usable for channel binding or out-of-band confirmation.
    pub fn handshake_hash(&self) -> &[u8; HANDSHAKE_HASH_LEN] {
        &self.handshake_hash
    }

    /// Hand out `(send, recv)` for the given local role.
    ///
    /// Initiator: send = initiator_to_responder, recv = responder_to_initiator.
    /// Responder: the reverse.
    pub fn into_directional(self, role: Role) -> (SessionState<T>, SessionState<T>) {
        let (i2r, r2i) = (self.initiator_to_responder, self.responder_to_initiator);
        match role {
            Role::Initiator => (i2r, r2i),
            Role::Responder => (r2i, i2r),
        }
    }
}

impl<T: Transcript + core::fmt::Debug> core::fmt::Debug for SessionPair<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionPair")
            .field("initiator_to_responder", &self.initiator_to_responder)
            .field("responder_to_initiator", &self.responder_to_initiator)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "strobe"))]
mod tests {
    use super::*;
    use crate::transcript::StrobeTranscript;

    fn finished_transcript() -> StrobeTranscript {
        let mut t = StrobeTranscript::new(b"DISCOv0.1.0_XX");
        t.mix_associated_data(b"prologue");
        t.mix_key(&[7u8; 32]);
        t
    }

    fn squeeze(state: &mut SessionState<StrobeTranscript>) -> [u8; 32] {
        let mut out = [0u8; 32];
        state.prf(&mut out);
        out
    }

    #[test]
    fn split_is_deterministic() {
        let mut a = SessionPair::split(finished_transcript());
        let mut b = SessionPair::split(finished_transcript());

        assert_eq!(a.handshake_hash(), b.handshake_hash());
        assert_eq!(
            squeeze(&mut a.initiator_to_responder),
            squeeze(&mut b.initiator_to_responder)
        );
        assert_eq!(
            squeeze(&mut a.responder_to_initiator),
            squeeze(&mut b.responder_to_initiator)
        );
    }

    #[test]
    fn forks_are_domain_separated() {
        let mut pair = SessionPair::split(finished_transcript());
        let i2r = squeeze(&mut pair.initiator_to_responder);
        let r2i = squeeze(&mut pair.responder_to_initiator);
        assert_ne!(i2r, r2i);
        assert_ne!(&i2r, pair.handshake_hash());
    }

    #[test]
    fn forks_do_not_alias() {
        let mut a = SessionPair::split(finished_transcript());
        let mut b = SessionPair::split(finished_transcript());

        // Advancing one fork of `a` must not move its sibling.
        a.initiator_to_responder
            .transcript_mut()
            .mix_associated_data(b"traffic");
        assert_eq!(
            squeeze(&mut a.responder_to_initiator),
            squeeze(&mut b.responder_to_initiator)
        );
    }

    #[test]
    fn debug_omits_handshake_hash() {
        let pair = SessionPair::split(finished_transcript());
        let rendered = format!("{pair:?}");
        assert!(rendered.starts_with("SessionPair"));
        assert!(!rendered.contains("handshake_hash"));
        assert!(rendered.ends_with(".. }"));
    }

    #[test]
    fn transcript_accessors_expose_the_same_state() {
        let pair = SessionPair::split(finished_transcript());
        let (send, _) = pair.into_directional(Role::Initiator);
        assert_eq!(send.transcript().tag_len(), crate::transcript::strobe::TAG_LEN);

        let mut borrowed = send.transcript().clone();
        let mut owned = send.into_transcript();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        borrowed.prf(&mut a);
        owned.prf(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn directional_assignment() {
        let reference = {
            let mut pair = SessionPair::split(finished_transcript());
            (
                squeeze(&mut pair.initiator_to_responder),
                squeeze(&mut pair.responder_to_initiator),
            )
        };

        let (mut send, mut recv) =
            SessionPair::split(finished_transcript()).into_directional(Role::Initiator);
        assert_eq!((squeeze(&mut send), squeeze(&mut recv)), reference);

        let (mut send, mut recv) =
            SessionPair::split(finished_transcript()).into_directional(Role::Responder);
        assert_eq!((squeeze(&mut recv), squeeze(&mut send)), reference);
    }
}
