use thiserror::Error;

/// Errors that can occur while registering patterns or driving a handshake.
///
/// Every failure aborts the handshake: a `HandshakeState` that returned an
/// error from `write_message` or `read_message` must not be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested handshake pattern is not registered.
    #[error("unknown handshake pattern")]
    UnknownHandshakePattern,
    /// A message was read or written after the handshake finished.
    #[error("handshake protocol already complete")]
    ProtocolAlreadyComplete,
    /// A pattern contains a token outside `e, s, ee, es, se, ss`.
    #[error("invalid handshake token")]
    InvalidToken,
    /// A token needs a key pair slot that has not been filled.
    #[error("missing key material for handshake token")]
    MissingKeyMaterial,
    /// Authenticated decryption of a static key or payload failed.
    #[error("authentication failure")]
    AuthenticationFailure,
    /// The incoming message is shorter than its token sequence requires.
    #[error("malformed handshake message")]
    MalformedMessage,
    /// A public key is invalid (low-order point, wrong length).
    #[error("invalid public key")]
    BadKey,
    /// Pattern text does not follow the handshake pattern grammar.
    #[error("invalid handshake pattern definition")]
    InvalidPattern,
    /// A pattern with the same name is already registered.
    #[error("handshake pattern already registered")]
    DuplicatePattern,
    /// The transcript cannot produce tags of the requested length.
    #[error("unsupported authentication tag length")]
    UnsupportedTagLength,
}
