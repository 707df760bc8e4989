#![deny(unsafe_code)]

//! # disco-handshake
//!
//! A pure, sans-IO handshake engine for Noise-style patterns where every
//! symmetric operation runs through a single duplex transcript instead of
//! separate hash, KDF and cipher primitives.
//!
//! The built-in ciphersuite is X25519 with a STROBE-128 transcript; only
//! the `XX` pattern ships registered:
//!
//! ```text
//! XX:
//!   -> e
//!   <- e, ee, s, es
//!   -> s, se
//! ```
//!
//! ## Example
//!
//! ```rust
//! use disco_handshake::{Builder, KeyPair, PatternRegistry, StrobeTranscript};
//! use rand_core::OsRng;
//!
//! let registry = PatternRegistry::with_builtin();
//! let mut alice = Builder::new(&registry, "XX")
//!     .local_static(KeyPair::generate(&mut OsRng))
//!     .build_initiator::<StrobeTranscript>()?;
//! let mut bob = Builder::new(&registry, "XX")
//!     .local_static(KeyPair::generate(&mut OsRng))
//!     .build_responder::<StrobeTranscript>()?;
//!
//! let (mut msg, mut payload) = (Vec::new(), Vec::new());
//! alice.write_message(b"", &mut msg)?;
//! bob.read_message(&msg, &mut payload)?;
//!
//! msg.clear();
//! bob.write_message(b"", &mut msg)?;
//! alice.read_message(&msg, &mut payload)?;
//!
//! msg.clear();
//! let alice_sessions = alice.write_message(b"", &mut msg)?.unwrap();
//! let bob_sessions = bob.read_message(&msg, &mut payload)?.unwrap();
//! assert_eq!(alice_sessions.handshake_hash(), bob_sessions.handshake_hash());
//! # Ok::<(), disco_handshake::Error>(())
//! ```
//!
//! ## Security Properties
//!
//! - X25519 low-order point rejection
//! - Secret keys zeroized on drop
//! - Uniform authentication failures, no panics on network input
//! - Only registered patterns can be run

pub mod crypto;
pub mod error;
pub mod keys;
pub mod pattern;
pub mod transcript;

mod builder;
mod handshake;
mod session;

// Re-export the primary public API
pub use builder::Builder;
pub use crypto::{KeyAgreement, X25519};
pub use error::Error;
pub use handshake::{
    HandshakeAction, HandshakePhase, HandshakeState, InitialKeys, PROTOCOL_LABEL, Role, TAG_LEN,
};
pub use keys::{KeyPair, PublicKey, StaticSecret};
pub use pattern::{Direction, HandshakePattern, MessageStep, PatternRegistry, Token};
pub use session::{HANDSHAKE_HASH_LEN, SessionPair, SessionState};
pub use transcript::Transcript;

#[cfg(feature = "strobe")]
pub use transcript::StrobeTranscript;

/// The X25519 + STROBE-128 handshake.
#[cfg(feature = "strobe")]
pub type DiscoHandshake = HandshakeState<StrobeTranscript, X25519>;
