//! Command registry
//!
//! Maps opcode prefixes of one or two bytes to handler identifiers. Each
//! prefix byte is matched under a mask, so a single entry can cover a
//! family of opcodes (e.g. `0xB0..=0xBF` page address commands on a
//! display controller).
//!
//! Resolution is most-specific-first: longer patterns are tried before
//! shorter ones, and among patterns of the same length the one registered
//! first wins. A frame that matches nothing is unknown to the device.

use heapless::Vec;

/// Longest opcode prefix a pattern can describe
pub const MAX_PATTERN_LEN: usize = 2;

/// Errors from building a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Pattern is byte-for-byte identical to one already registered
    Duplicate,
    /// Registry has no room left
    Full,
    /// Pattern has no bytes
    EmptyPattern,
    /// Pattern is longer than [`MAX_PATTERN_LEN`]
    PatternTooLong,
}

/// Masked single-byte matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Matcher {
    mask: u8,
    value: u8,
}

impl Matcher {
    /// Match exactly one byte value
    pub const fn exact(value: u8) -> Self {
        Self { mask: 0xFF, value }
    }

    /// Match the bits of `value` selected by `mask`
    pub const fn masked(value: u8, mask: u8) -> Self {
        Self {
            mask,
            value: value & mask,
        }
    }

    /// Match any byte
    pub const fn any() -> Self {
        Self { mask: 0, value: 0 }
    }

    /// Check a byte against this matcher
    pub const fn matches(&self, byte: u8) -> bool {
        byte & self.mask == self.value
    }
}

/// Opcode prefix of one or two matchers
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pattern {
    matchers: [Matcher; MAX_PATTERN_LEN],
    len: usize,
}

impl Pattern {
    /// One-byte pattern
    pub const fn one(first: Matcher) -> Self {
        Self {
            matchers: [first, Matcher::any()],
            len: 1,
        }
    }

    /// Two-byte pattern
    pub const fn two(first: Matcher, second: Matcher) -> Self {
        Self {
            matchers: [first, second],
            len: 2,
        }
    }

    /// Build a pattern from a list of matchers
    pub fn new(matchers: &[Matcher]) -> Result<Self, RegistryError> {
        match matchers {
            [] => Err(RegistryError::EmptyPattern),
            [first] => Ok(Self::one(*first)),
            [first, second] => Ok(Self::two(*first, *second)),
            _ => Err(RegistryError::PatternTooLong),
        }
    }

    /// Build an exact-match pattern from opcode bytes
    pub fn exact(bytes: &[u8]) -> Result<Self, RegistryError> {
        match bytes {
            [] => Err(RegistryError::EmptyPattern),
            [first] => Ok(Self::one(Matcher::exact(*first))),
            [first, second] => Ok(Self::two(Matcher::exact(*first), Matcher::exact(*second))),
            _ => Err(RegistryError::PatternTooLong),
        }
    }

    /// Number of prefix bytes this pattern inspects
    pub fn prefix_len(&self) -> usize {
        self.len
    }

    /// The active matchers
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers[..self.len]
    }

    /// Check if `frame` starts with this pattern
    pub fn matches(&self, frame: &[u8]) -> bool {
        frame.len() >= self.len
            && self
                .matchers()
                .iter()
                .zip(frame)
                .all(|(matcher, &byte)| matcher.matches(byte))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.matchers() == other.matchers()
    }
}

impl Eq for Pattern {}

/// Declarative table of (pattern, handler) pairs
///
/// `H` is whatever the device uses to name its commands, usually a small
/// `Copy` enum.
#[derive(Debug, Clone)]
pub struct CommandRegistry<H: Copy, const N: usize> {
    entries: Vec<(Pattern, H), N>,
}

impl<H: Copy, const N: usize> CommandRegistry<H, N> {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a registry from a static command table
    pub fn from_table(table: &[(Pattern, H)]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for &(pattern, handler) in table {
            registry.register(pattern, handler)?;
        }
        Ok(registry)
    }

    /// Add a pattern
    ///
    /// Exact duplicates are rejected. Patterns of different lengths may
    /// share leading bytes; lookup prefers the longer one.
    pub fn register(&mut self, pattern: Pattern, handler: H) -> Result<(), RegistryError> {
        if self.entries.iter().any(|(existing, _)| *existing == pattern) {
            return Err(RegistryError::Duplicate);
        }
        self.entries
            .push((pattern, handler))
            .map_err(|_| RegistryError::Full)
    }

    /// Number of registered patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a frame to its handler
    pub fn lookup(&self, frame: &[u8]) -> Option<H> {
        (1..=MAX_PATTERN_LEN).rev().find_map(|len| {
            self.entries
                .iter()
                .find(|(pattern, _)| pattern.prefix_len() == len && pattern.matches(frame))
                .map(|(_, handler)| *handler)
        })
    }
}

impl<H: Copy, const N: usize> Default for CommandRegistry<H, N> {
    fn default() -> Self {
        Self::new()
    }
}
