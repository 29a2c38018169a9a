//! Random password and keycode generation under a character-class policy

use crate::error::{CryptoError, Result};
use bitflags::bitflags;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Character classes a password may draw from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CharacterClasses: u32 {
        /// `A-Z`
        const UPPER = 1;
        /// `a-z`
        const LOWER = 2;
        /// `0-9`
        const NUMERICS = 4;
        /// Printable ASCII punctuation
        const SPECIAL = 8;
        /// Latin-1 supplement, U+00A1 to U+00FF
        const BINARY = 16;
    }
}

impl Default for CharacterClasses {
    fn default() -> Self {
        CharacterClasses::UPPER | CharacterClasses::LOWER | CharacterClasses::NUMERICS
    }
}

const SPECIAL_CHARS: &str = "!@#$%&*()-_=+[]{};:,.<>?/";
const AMBIGUOUS_CHARS: &[char] = &['0', 'O', '1', 'l', 'I'];

/// Default generated length in characters.
pub const DEFAULT_LENGTH: usize = 16;

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Enabled classes
    pub classes: CharacterClasses,
    /// Output length in characters
    pub length: usize,
    /// Drop `0 O 1 l I` from the pool
    pub avoid_ambiguous: bool,
    /// Never emit the same character twice in a row
    pub avoid_adjacent_duplicates: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            classes: CharacterClasses::default(),
            length: DEFAULT_LENGTH,
            avoid_ambiguous: false,
            avoid_adjacent_duplicates: false,
        }
    }
}

impl PasswordPolicy {
    /// Policy over `classes` with the default length.
    pub fn new(classes: CharacterClasses) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }

    /// Set the output length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Toggle ambiguous-character removal.
    pub fn avoid_ambiguous(mut self, on: bool) -> Self {
        self.avoid_ambiguous = on;
        self
    }

    /// Toggle adjacent-duplicate avoidance.
    pub fn avoid_adjacent_duplicates(mut self, on: bool) -> Self {
        self.avoid_adjacent_duplicates = on;
        self
    }

    /// The candidate pool this policy samples from.
    pub fn pool(&self) -> Vec<char> {
        let mut pool = Vec::new();
        if self.classes.contains(CharacterClasses::UPPER) {
            pool.extend('A'..='Z');
        }
        if self.classes.contains(CharacterClasses::LOWER) {
            pool.extend('a'..='z');
        }
        if self.classes.contains(CharacterClasses::NUMERICS) {
            pool.extend('0'..='9');
        }
        if self.classes.contains(CharacterClasses::SPECIAL) {
            pool.extend(SPECIAL_CHARS.chars());
        }
        if self.classes.contains(CharacterClasses::BINARY) {
            pool.extend('\u{a1}'..='\u{ff}');
        }
        if self.avoid_ambiguous {
            pool.retain(|c| !AMBIGUOUS_CHARS.contains(c));
        }
        pool
    }
}

/// Stateless password generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordGenerator;

impl PasswordGenerator {
    /// Generate with the thread-local RNG.
    pub fn generate(&self, policy: &PasswordPolicy) -> Result<String> {
        self.generate_with_rng(policy, &mut rand::thread_rng())
    }

    /// Generate with a caller-supplied RNG.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        policy: &PasswordPolicy,
        rng: &mut R,
    ) -> Result<String> {
        let pool = policy.pool();
        if pool.is_empty() {
            return Err(CryptoError::PolicyUnsatisfiable(
                "no character classes left in the pool".to_string(),
            ));
        }
        if policy.avoid_adjacent_duplicates && pool.len() < 2 && policy.length > 1 {
            return Err(CryptoError::PolicyUnsatisfiable(
                "a single-character pool cannot avoid adjacent duplicates".to_string(),
            ));
        }

        let mut out = String::with_capacity(policy.length * 2);
        let mut prev: Option<char> = None;
        let mut produced = 0;
        while produced < policy.length {
            let Some(&c) = pool.choose(rng) else {
                break;
            };
            if policy.avoid_adjacent_duplicates && prev == Some(c) {
                continue;
            }
            out.push(c);
            prev = Some(c);
            produced += 1;
        }
        Ok(out)
    }
}
