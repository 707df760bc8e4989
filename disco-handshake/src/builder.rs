use crate::crypto::{KeyAgreement, X25519};
use crate::error::Error;
use crate::handshake::{HandshakeState, InitialKeys, Role};
use crate::pattern::PatternRegistry;
use crate::transcript::Transcript;

/// Builder for a [`HandshakeState`].
///
/// Collects the pattern name, prologue and whatever key material is already
/// known, then starts the handshake for one role.
///
/// ```rust
/// use disco_handshake::{Builder, KeyPair, PatternRegistry, StrobeTranscript};
/// use rand_core::OsRng;
///
/// let registry = PatternRegistry::with_builtin();
/// let initiator = Builder::new(&registry, "XX")
///     .prologue(b"my app v1")
///     .local_static(KeyPair::generate(&mut OsRng))
///     .build_initiator::<StrobeTranscript>()
///     .unwrap();
/// assert!(initiator.is_initiator());
/// ```
pub struct Builder<'a, K: KeyAgreement = X25519> {
    registry: &'a PatternRegistry,
    pattern: &'a str,
    prologue: Vec<u8>,
    keys: InitialKeys<K>,
}

impl<'a> Builder<'a> {
    /// Start building an X25519 handshake for the named pattern.
    pub fn new(registry: &'a PatternRegistry, pattern: &'a str) -> Self {
        Self::with_key_agreement(registry, pattern)
    }
}

impl<'a, K: KeyAgreement> Builder<'a, K> {
    /// Start building a handshake over a custom key agreement.
    pub fn with_key_agreement(registry: &'a PatternRegistry, pattern: &'a str) -> Self {
        Self {
            registry,
            pattern,
            prologue: Vec::new(),
            keys: InitialKeys::default(),
        }
    }

    /// Data both sides agree on before the handshake; mixed in, never sent.
    pub fn prologue(mut self, prologue: &[u8]) -> Self {
        self.prologue = prologue.to_vec();
        self
    }

    pub fn local_static(mut self, pair: K::KeyPair) -> Self {
        self.keys.local_static = Some(pair);
        self
    }

    pub fn local_ephemeral(mut self, pair: K::KeyPair) -> Self {
        self.keys.local_ephemeral = Some(pair);
        self
    }

    pub fn remote_static(mut self, public: K::PublicKey) -> Self {
        self.keys.remote_static = Some(public);
        self
    }

    pub fn remote_ephemeral(mut self, public: K::PublicKey) -> Self {
        self.keys.remote_ephemeral = Some(public);
        self
    }

    pub fn build_initiator<T: Transcript>(self) -> Result<HandshakeState<T, K>, Error> {
        self.build(Role::Initiator)
    }

    pub fn build_responder<T: Transcript>(self) -> Result<HandshakeState<T, K>, Error> {
        self.build(Role::Responder)
    }

    fn build<T: Transcript>(self, role: Role) -> Result<HandshakeState<T, K>, Error> {
        HandshakeState::initialize(self.registry, self.pattern, role, &self.prologue, self.keys)
    }
}
