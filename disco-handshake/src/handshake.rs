use std::sync::Arc;

use rand_core::{CryptoRngCore, OsRng};
use zeroize::Zeroizing;

use crate::crypto::{KeyAgreement, X25519};
use crate::error::Error;
use crate::pattern::{HandshakePattern, MessageStep, PatternRegistry, Token};
use crate::session::SessionPair;
use crate::transcript::Transcript;

/// Prefix of the label every handshake transcript is initialized with.
///
/// The full label is this prefix followed by the pattern name, e.g.
/// `"DISCOv0.1.0_XX"`.
pub const PROTOCOL_LABEL: &str = "DISCOv0.1.0_";

/// Authentication tag length configured on every handshake transcript.
pub const TAG_LEN: usize = 16;

/// Which side of the handshake this state drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub fn is_initiator(self) -> bool {
        self == Self::Initiator
    }
}

/// The current action the caller must take to advance the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Call `write_message()` to produce the next handshake message.
    WriteMessage,
    /// Call `read_message()` with the peer's handshake message.
    ReadMessage,
    /// The handshake is complete; the session pair has been handed out.
    Complete,
}

/// Progress through the pattern's message steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// No message has been written or read yet.
    Initialized,
    /// At least one step is done and at least one remains.
    InProgress,
    /// Every step is done.
    Complete,
}

/// Key material known before the handshake starts.
///
/// Absent slots stay absent until a token fills them; a token that needs an
/// absent slot fails with [`Error::MissingKeyMaterial`].
pub struct InitialKeys<K: KeyAgreement = X25519> {
    pub local_static: Option<K::KeyPair>,
    pub local_ephemeral: Option<K::KeyPair>,
    pub remote_static: Option<K::PublicKey>,
    pub remote_ephemeral: Option<K::PublicKey>,
}

impl<K: KeyAgreement> Default for InitialKeys<K> {
    fn default() -> Self {
        Self {
            local_static: None,
            local_ephemeral: None,
            remote_static: None,
            remote_ephemeral: None,
        }
    }
}

/// The four key slots of a handshake.
struct KeySlots<K: KeyAgreement> {
    s: Option<K::KeyPair>,
    e: Option<K::KeyPair>,
    rs: Option<K::PublicKey>,
    re: Option<K::PublicKey>,
}

impl<K: KeyAgreement> KeySlots<K> {
    /// DH for one of `ee`, `es`, `se`, `ss`.
    ///
    /// `es` is always DH(initiator ephemeral, responder static) and `se` is
    /// always DH(initiator static, responder ephemeral), so which local and
    /// remote slot is used depends on the role.
    fn dh(&self, token: Token, role: Role) -> Result<K::SharedSecret, Error> {
        let initiator = role.is_initiator();
        let (local, remote) = match token {
            Token::EE => (&self.e, &self.re),
            Token::ES if initiator => (&self.e, &self.rs),
            Token::ES => (&self.s, &self.re),
            Token::SE if initiator => (&self.s, &self.re),
            Token::SE => (&self.e, &self.rs),
            Token::SS => (&self.s, &self.rs),
            Token::E | Token::S => return Err(Error::InvalidToken),
        };
        let local = local.as_ref().ok_or(Error::MissingKeyMaterial)?;
        let remote = remote.as_ref().ok_or(Error::MissingKeyMaterial)?;
        K::dh(local, remote)
    }

    fn static_public(&self, role: Role, owner: Role) -> Result<K::PublicKey, Error> {
        if role == owner {
            self.s
                .as_ref()
                .map(K::public_key)
                .ok_or(Error::MissingKeyMaterial)
        } else {
            self.rs.ok_or(Error::MissingKeyMaterial)
        }
    }
}

/// A handshake in progress, driven one message at a time.
///
/// Generic over the transcript (`T`) and the key agreement (`K`). The
/// transcript is owned exclusively until the last step, where it is split
/// into a [`SessionPair`].
///
/// Any error aborts the handshake. Tokens processed before the failing one
/// have already been absorbed by the transcript, so retrying the same step
/// on the same state can never succeed.
pub struct HandshakeState<T: Transcript, K: KeyAgreement = X25519> {
    /// `None` once the final step has split it.
    transcript: Option<T>,
    pattern: Arc<HandshakePattern>,
    /// Index of the next step; `pattern.steps()[next_step..]` remain.
    next_step: usize,
    role: Role,
    keys: KeySlots<K>,
}

impl<T: Transcript, K: KeyAgreement> HandshakeState<T, K> {
    /// Start a handshake for the named pattern.
    ///
    /// The transcript is labelled with [`PROTOCOL_LABEL`] and the pattern
    /// name, then absorbs the prologue and any pre-message static keys (the
    /// initiator's before the responder's, whichever side is local). Both
    /// peers must use the same prologue for the handshake to succeed.
    pub fn initialize(
        registry: &PatternRegistry,
        pattern_name: &str,
        role: Role,
        prologue: &[u8],
        keys: InitialKeys<K>,
    ) -> Result<Self, Error> {
        let pattern = registry.lookup(pattern_name)?;

        let label = format!("{PROTOCOL_LABEL}{}", pattern.name());
        let mut transcript = T::new(label.as_bytes());
        transcript.set_auth_tag_length(TAG_LEN)?;
        transcript.mix_associated_data(prologue);

        let keys = KeySlots::<K> {
            s: keys.local_static,
            e: keys.local_ephemeral,
            rs: keys.remote_static,
            re: keys.remote_ephemeral,
        };

        for (pre, owner) in [
            (pattern.initiator_pre_message(), Role::Initiator),
            (pattern.responder_pre_message(), Role::Responder),
        ] {
            for token in pre {
                match token {
                    Token::S => {
                        let public = keys.static_public(role, owner)?;
                        transcript.mix_associated_data(public.as_ref());
                    }
                    _ => return Err(Error::InvalidToken),
                }
            }
        }

        tracing::debug!(pattern = pattern.name(), ?role, "handshake initialized");

        Ok(Self {
            transcript: Some(transcript),
            pattern,
            next_step: 0,
            role,
            keys,
        })
    }

    /// What action the caller should take next.
    pub fn next_action(&self) -> HandshakeAction {
        match self.pattern.steps().get(self.next_step) {
            None => HandshakeAction::Complete,
            Some(step) if step.direction.is_written_by(self.role.is_initiator()) => {
                HandshakeAction::WriteMessage
            }
            Some(_) => HandshakeAction::ReadMessage,
        }
    }

    /// Where the handshake stands in its pattern.
    pub fn phase(&self) -> HandshakePhase {
        if self.next_step >= self.pattern.steps().len() {
            HandshakePhase::Complete
        } else if self.next_step == 0 {
            HandshakePhase::Initialized
        } else {
            HandshakePhase::InProgress
        }
    }

    /// Whether every step of the pattern has been processed.
    pub fn is_complete(&self) -> bool {
        self.phase() == HandshakePhase::Complete
    }

    /// The role this state was initialized with.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this side is the initiator.
    pub fn is_initiator(&self) -> bool {
        self.role.is_initiator()
    }

    /// Name of the pattern being run.
    pub fn pattern_name(&self) -> &str {
        self.pattern.name()
    }

    /// The remote peer's static public key, if known.
    pub fn remote_static(&self) -> Option<&K::PublicKey> {
        self.keys.rs.as_ref()
    }

    /// The remote peer's ephemeral public key, if known.
    pub fn remote_ephemeral(&self) -> Option<&K::PublicKey> {
        self.keys.re.as_ref()
    }

    /// Exact length of the next message when it carries `payload_len` bytes.
    pub fn message_len(&self, payload_len: usize) -> Result<usize, Error> {
        let step = self.current_step()?;
        Ok(self.step_overhead(step) + payload_len)
    }

    /// Write the next handshake message, appending it to `out`.
    ///
    /// Returns the session pair when this was the final step. On error,
    /// `out` is left as it was.
    pub fn write_message(
        &mut self,
        payload: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<Option<SessionPair<T>>, Error> {
        self.write_message_with_rng(payload, out, &mut OsRng)
    }

    /// Write the next handshake message with a specific RNG (useful for testing).
    pub fn write_message_with_rng(
        &mut self,
        payload: &[u8],
        out: &mut Vec<u8>,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Option<SessionPair<T>>, Error> {
        let pattern = Arc::clone(&self.pattern);
        let step = self.current_step_in(&pattern)?;

        let start = out.len();
        out.reserve(self.step_overhead(step) + payload.len());
        if let Err(err) = self.write_tokens(step, payload, out, rng) {
            out.truncate(start);
            return Err(err);
        }

        tracing::trace!(
            step = self.next_step,
            tokens = step.tokens.len(),
            len = out.len() - start,
            "wrote handshake message"
        );
        self.advance()
    }

    /// Read a handshake message from the peer, appending the decrypted
    /// payload to `payload`.
    ///
    /// Returns the session pair when this was the final step.
    pub fn read_message(
        &mut self,
        message: &[u8],
        payload: &mut Vec<u8>,
    ) -> Result<Option<SessionPair<T>>, Error> {
        let pattern = Arc::clone(&self.pattern);
        let step = self.current_step_in(&pattern)?;

        // A short payload tag is an authentication failure, not a framing one.
        if message.len() < self.token_len(step) {
            return Err(Error::MalformedMessage);
        }
        self.read_tokens(step, message, payload)?;

        tracing::trace!(
            step = self.next_step,
            tokens = step.tokens.len(),
            len = message.len(),
            "read handshake message"
        );
        self.advance()
    }

    fn current_step(&self) -> Result<&MessageStep, Error> {
        self.current_step_in(&self.pattern)
    }

    fn current_step_in<'p>(&self, pattern: &'p HandshakePattern) -> Result<&'p MessageStep, Error> {
        pattern
            .steps()
            .get(self.next_step)
            .ok_or(Error::ProtocolAlreadyComplete)
    }

    /// Bytes a step adds beyond its payload: the token bytes plus the
    /// payload tag.
    fn step_overhead(&self, step: &MessageStep) -> usize {
        self.token_len(step) + self.tag_len()
    }

    /// Bytes carried by a step's tokens: `e` is `DH_LEN`, `s` is
    /// `DH_LEN + tag`, DH tokens add nothing.
    fn token_len(&self, step: &MessageStep) -> usize {
        let tag_len = self.tag_len();
        step.tokens
            .iter()
            .map(|token| match token {
                Token::E => K::DH_LEN,
                Token::S => K::DH_LEN + tag_len,
                Token::EE | Token::ES | Token::SE | Token::SS => 0,
            })
            .sum()
    }

    fn tag_len(&self) -> usize {
        self.transcript.as_ref().map_or(TAG_LEN, T::tag_len)
    }

    fn write_tokens(
        &mut self,
        step: &MessageStep,
        payload: &[u8],
        out: &mut Vec<u8>,
        rng: &mut impl CryptoRngCore,
    ) -> Result<(), Error> {
        let transcript = self
            .transcript
            .as_mut()
            .ok_or(Error::ProtocolAlreadyComplete)?;

        for &token in &step.tokens {
            match token {
                Token::E => {
                    let pair = K::generate_keypair(rng);
                    let public = K::public_key(&pair);
                    out.extend_from_slice(public.as_ref());
                    transcript.send_cleartext(public.as_ref());
                    self.keys.e = Some(pair);
                }
                Token::S => {
                    let pair = self.keys.s.as_ref().ok_or(Error::MissingKeyMaterial)?;
                    transcript.seal(K::public_key(pair).as_ref(), &[], out);
                }
                Token::EE | Token::ES | Token::SE | Token::SS => {
                    let shared = self.keys.dh(token, self.role)?;
                    transcript.mix_key(shared.as_ref());
                }
            }
        }

        transcript.seal(payload, &[], out);
        Ok(())
    }

    fn read_tokens(
        &mut self,
        step: &MessageStep,
        message: &[u8],
        payload: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let transcript = self
            .transcript
            .as_mut()
            .ok_or(Error::ProtocolAlreadyComplete)?;
        let tag_len = transcript.tag_len();

        let mut offset = 0;
        for &token in &step.tokens {
            match token {
                Token::E => {
                    let bytes = message
                        .get(offset..offset + K::DH_LEN)
                        .ok_or(Error::MalformedMessage)?;
                    let re = K::public_key_from_bytes(bytes)?;
                    transcript.receive_cleartext(bytes);
                    self.keys.re = Some(re);
                    offset += K::DH_LEN;
                }
                Token::S => {
                    let len = K::DH_LEN + tag_len;
                    let sealed = message
                        .get(offset..offset + len)
                        .ok_or(Error::MalformedMessage)?;
                    let mut rs = Zeroizing::new(Vec::with_capacity(K::DH_LEN));
                    transcript.open(sealed, &[], &mut rs).inspect_err(|_| {
                        tracing::warn!("remote static key failed authentication");
                    })?;
                    self.keys.rs = Some(K::public_key_from_bytes(&rs)?);
                    offset += len;
                }
                Token::EE | Token::ES | Token::SE | Token::SS => {
                    let shared = self.keys.dh(token, self.role)?;
                    transcript.mix_key(shared.as_ref());
                }
            }
        }

        transcript
            .open(&message[offset..], &[], payload)
            .inspect_err(|_| tracing::warn!("handshake payload failed authentication"))
    }

    /// Consume the current step, splitting the transcript after the last one.
    fn advance(&mut self) -> Result<Option<SessionPair<T>>, Error> {
        self.next_step += 1;
        if self.next_step < self.pattern.steps().len() {
            return Ok(None);
        }

        let transcript = self
            .transcript
            .take()
            .ok_or(Error::ProtocolAlreadyComplete)?;
        tracing::debug!(
            pattern = self.pattern.name(),
            role = ?self.role,
            "handshake complete, splitting transcript"
        );
        Ok(Some(SessionPair::split(transcript)))
    }
}

impl<T: Transcript, K: KeyAgreement> core::fmt::Debug for HandshakeState<T, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandshakeState")
            .field("pattern", &self.pattern.name())
            .field("role", &self.role)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
