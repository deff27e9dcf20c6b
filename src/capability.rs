//! Capability tokens: minting, per-agent capability sets, and validation.
//!
//! A [`Capability`] is a sealed handle. Its field is private and the only
//! constructor lives on [`CapabilityMinter`], so code outside this module can
//! hold, copy and compare capabilities but never fabricate one.

use std::fmt;
use std::num::NonZeroU64;

use serde::Serialize;

use crate::error::{Error, Result};

/// Maximum capabilities a single agent may accept.
pub const MAX_CAPABILITIES: usize = 4;

/// An unforgeable admission token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Capability(NonZeroU64);

impl Capability {
    /// Raw token value, for diagnostics.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues capabilities. Tokens start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct CapabilityMinter {
    last: u64,
}

impl CapabilityMinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh capability. Fails once the token space is used up
    /// rather than wrapping around to a token already handed out.
    pub fn mint(&mut self) -> Result<Capability> {
        let token = self
            .last
            .checked_add(1)
            .and_then(NonZeroU64::new)
            .ok_or(Error::CapabilitiesExhausted)?;
        self.last = token.get();
        tracing::debug!(capability = token.get(), "Minted capability");
        Ok(Capability(token))
    }

    /// Look up a capability this minter has already issued.
    ///
    /// External input names capabilities by number; this is the only way such
    /// a number becomes a [`Capability`], and it never yields an unissued one.
    pub fn issued(&self, raw: u64) -> Option<Capability> {
        if raw > self.last {
            return None;
        }
        NonZeroU64::new(raw).map(Capability)
    }

    /// Number of capabilities minted so far.
    pub fn minted(&self) -> u64 {
        self.last
    }
}

/// The bounded set of capabilities an agent accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    allowed: Vec<Capability>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self {
            allowed: Vec::with_capacity(MAX_CAPABILITIES),
        }
    }

    /// Add a capability. Already-held capabilities are accepted as a no-op;
    /// a full set hands the capability back.
    pub fn insert(&mut self, capability: Capability) -> std::result::Result<(), Capability> {
        if self.allowed.contains(&capability) {
            return Ok(());
        }
        if self.allowed.len() >= MAX_CAPABILITIES {
            return Err(capability);
        }
        self.allowed.push(capability);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.allowed.iter()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cap) in self.allowed.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", cap)?;
        }
        write!(f, "}}")
    }
}

/// Check whether `capability` admits a message into an agent holding `set`.
///
/// Pure linear membership test. Runs before any enqueue attempt and has no
/// accounting side effects.
pub fn validate(capability: Capability, set: &CapabilitySet) -> bool {
    set.allowed.iter().any(|allowed| *allowed == capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_is_monotonic_from_one() {
        let mut minter = CapabilityMinter::new();
        let a = minter.mint().unwrap();
        let b = minter.mint().unwrap();
        let c = minter.mint().unwrap();

        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(c.get(), 3);
        assert_eq!(minter.minted(), 3);
    }

    #[test]
    fn test_exhausted_minter_never_wraps() {
        let mut minter = CapabilityMinter { last: u64::MAX - 1 };
        assert_eq!(minter.mint().unwrap().get(), u64::MAX);

        assert!(matches!(minter.mint(), Err(Error::CapabilitiesExhausted)));
        assert!(matches!(minter.mint(), Err(Error::CapabilitiesExhausted)));
        assert_eq!(minter.minted(), u64::MAX);
    }

    #[test]
    fn test_issued_only_returns_minted_tokens() {
        let mut minter = CapabilityMinter::new();
        assert!(minter.issued(1).is_none());

        let first = minter.mint().unwrap();
        assert_eq!(minter.issued(1), Some(first));
        assert!(minter.issued(0).is_none());
        assert!(minter.issued(2).is_none());
    }

    #[test]
    fn test_validate_membership() {
        let mut minter = CapabilityMinter::new();
        let one = minter.mint().unwrap();
        let two = minter.mint().unwrap();

        let mut set = CapabilitySet::new();
        set.insert(one).unwrap();

        assert!(validate(one, &set));
        assert!(!validate(two, &set));
        assert!(!validate(one, &CapabilitySet::new()));
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let mut minter = CapabilityMinter::new();
        let one = minter.mint().unwrap();
        let mut set = CapabilitySet::new();
        set.insert(one).unwrap();
        let before = set.clone();

        for _ in 0..3 {
            validate(one, &set);
            validate(minter.mint().unwrap(), &set);
        }

        assert_eq!(set, before);
    }

    #[test]
    fn test_set_is_bounded() {
        let mut minter = CapabilityMinter::new();
        let mut set = CapabilitySet::new();
        for _ in 0..MAX_CAPABILITIES {
            set.insert(minter.mint().unwrap()).unwrap();
        }

        let extra = minter.mint().unwrap();
        assert_eq!(set.insert(extra), Err(extra));
        assert_eq!(set.len(), MAX_CAPABILITIES);
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let mut minter = CapabilityMinter::new();
        let one = minter.mint().unwrap();
        let mut set = CapabilitySet::new();

        set.insert(one).unwrap();
        set.insert(one).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.to_string(), "{1}");
    }
}
