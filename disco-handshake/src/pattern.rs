//! Handshake patterns, their text grammar, and the registry that names them.
//!
//! ```text
//! XX:
//!   -> e
//!   <- e, ee, s, es
//!   -> s, se
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;

/// Name of the only pattern registered by [`PatternRegistry::with_builtin`].
pub const XX: &str = "XX";

/// An atomic handshake operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Send or receive an ephemeral public key in the clear.
    E,
    /// Send or receive the static public key, encrypted.
    S,
    EE,
    ES,
    SE,
    SS,
}

impl Token {
    /// The token as written in pattern text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E => "e",
            Self::S => "s",
            Self::EE => "ee",
            Self::ES => "es",
            Self::SE => "se",
            Self::SS => "ss",
        }
    }
}

impl core::str::FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "e" => Ok(Self::E),
            "s" => Ok(Self::S),
            "ee" => Ok(Self::EE),
            "es" => Ok(Self::ES),
            "se" => Ok(Self::SE),
            "ss" => Ok(Self::SS),
            _ => Err(Error::InvalidToken),
        }
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which party writes a message step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `->`
    InitiatorToResponder,
    /// `<-`
    ResponderToInitiator,
}

impl Direction {
    /// Whether the party with the given role writes this step.
    pub fn is_written_by(self, initiator: bool) -> bool {
        (self == Self::InitiatorToResponder) == initiator
    }
}

/// One handshake message: who writes it and the tokens it carries, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStep {
    pub direction: Direction,
    pub tokens: Vec<Token>,
}

impl MessageStep {
    pub fn new(direction: Direction, tokens: &[Token]) -> Self {
        Self {
            direction,
            tokens: tokens.to_vec(),
        }
    }

    /// Parse one step line such as `"<- e, ee, s, es"`.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let line = line.trim();
        let (direction, rest) = if let Some(rest) = line.strip_prefix("->") {
            (Direction::InitiatorToResponder, rest)
        } else if let Some(rest) = line.strip_prefix("<-") {
            (Direction::ResponderToInitiator, rest)
        } else {
            return Err(Error::InvalidPattern);
        };

        if rest.trim().is_empty() {
            return Err(Error::InvalidPattern);
        }
        let tokens = rest
            .split(',')
            .map(|t| t.trim().parse())
            .collect::<Result<Vec<Token>, Error>>()?;

        Ok(Self { direction, tokens })
    }
}

impl core::fmt::Display for MessageStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let arrow = match self.direction {
            Direction::InitiatorToResponder => "->",
            Direction::ResponderToInitiator => "<-",
        };
        write!(f, "{arrow} ")?;
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// An immutable, named handshake pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakePattern {
    name: String,
    initiator_pre: Vec<Token>,
    responder_pre: Vec<Token>,
    steps: Vec<MessageStep>,
}

impl HandshakePattern {
    /// Build a pattern from already-typed parts.
    ///
    /// Pre-messages may only carry static keys (`s`), and every pattern
    /// needs at least one message step.
    pub fn new(
        name: impl Into<String>,
        initiator_pre: &[Token],
        responder_pre: &[Token],
        steps: Vec<MessageStep>,
    ) -> Result<Self, Error> {
        let pre_ok = |pre: &[Token]| pre.iter().all(|t| *t == Token::S);
        if !pre_ok(initiator_pre) || !pre_ok(responder_pre) {
            return Err(Error::InvalidPattern);
        }
        if steps.is_empty() || steps.iter().any(|s| s.tokens.is_empty()) {
            return Err(Error::InvalidPattern);
        }
        Ok(Self {
            name: name.into(),
            initiator_pre: initiator_pre.to_vec(),
            responder_pre: responder_pre.to_vec(),
            steps,
        })
    }

    /// Parse a pattern from its text form.
    ///
    /// Pre-message lines are comma-separated token lists (empty for none);
    /// each step line starts with `->` or `<-`.
    ///
    /// ```
    /// # use disco_handshake::HandshakePattern;
    /// let kk = HandshakePattern::parse("KK", "s", "s", &["-> e, es, ss", "<- e, ee, se"]).unwrap();
    /// assert_eq!(kk.steps().len(), 2);
    /// ```
    pub fn parse(
        name: &str,
        initiator_pre: &str,
        responder_pre: &str,
        steps: &[&str],
    ) -> Result<Self, Error> {
        let steps = steps
            .iter()
            .map(|line| MessageStep::parse(line))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(
            name,
            &parse_pre_message(initiator_pre)?,
            &parse_pre_message(responder_pre)?,
            steps,
        )
    }

    /// The `XX` pattern: mutual authentication, static keys sent encrypted.
    pub fn xx() -> Self {
        use Token::*;
        Self {
            name: XX.to_owned(),
            initiator_pre: Vec::new(),
            responder_pre: Vec::new(),
            steps: vec![
                MessageStep::new(Direction::InitiatorToResponder, &[E]),
                MessageStep::new(Direction::ResponderToInitiator, &[E, EE, S, ES]),
                MessageStep::new(Direction::InitiatorToResponder, &[S, SE]),
            ],
        }
    }

    /// Name the pattern is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tokens the initiator is assumed to have shared before the handshake.
    pub fn initiator_pre_message(&self) -> &[Token] {
        &self.initiator_pre
    }

    /// Tokens the responder is assumed to have shared before the handshake.
    pub fn responder_pre_message(&self) -> &[Token] {
        &self.responder_pre
    }

    /// The message steps, in order.
    pub fn steps(&self) -> &[MessageStep] {
        &self.steps
    }
}

fn parse_pre_message(text: &str) -> Result<Vec<Token>, Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|t| match t.trim().parse()? {
            Token::S => Ok(Token::S),
            _ => Err(Error::InvalidPattern),
        })
        .collect()
}

/// Named handshake patterns available to [`crate::HandshakeState::initialize`].
///
/// Constructed once and passed by reference to every handshake; adding a
/// pattern never requires touching the engine.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: HashMap<String, Arc<HandshakePattern>>,
}

impl PatternRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `XX` pattern.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .patterns
            .insert(XX.to_owned(), Arc::new(HandshakePattern::xx()));
        registry
    }

    /// Add a pattern under its own name.
    pub fn register(&mut self, pattern: HandshakePattern) -> Result<(), Error> {
        if self.patterns.contains_key(pattern.name()) {
            return Err(Error::DuplicatePattern);
        }
        tracing::debug!(pattern = pattern.name(), "registered handshake pattern");
        self.patterns
            .insert(pattern.name().to_owned(), Arc::new(pattern));
        Ok(())
    }

    /// Resolve a pattern by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<HandshakePattern>, Error> {
        self.patterns
            .get(name)
            .cloned()
            .ok_or(Error::UnknownHandshakePattern)
    }

    /// Names of all registered patterns, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
