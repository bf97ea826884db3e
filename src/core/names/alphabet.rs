//! Bijective base-N numbering over a configurable alphabet.
//!
//! Counting follows spreadsheet columns rather than positional base-N: there
//! is no zero digit, so every string over the alphabet maps to exactly one
//! index and back. With the lowercase alphabet `0 → a`, `25 → z`,
//! `26 → aa`, `701 → zz`, `702 → aaa`.

use crate::core::error::NameGenError;
use crate::core::names::options::DEFAULT_ALPHABET;

/// Ordered, duplicate-free set of identifier characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet
{
    chars: Vec<char>,
}

impl Alphabet
{
    /// Build an alphabet from its characters in counting order.
    ///
    /// Characters must be unique and drawn from `[A-Za-z0-9_-]`.
    pub fn new(symbols: &str) -> Result<Self, NameGenError>
    {
        let mut chars: Vec<char> = Vec::with_capacity(symbols.len());

        for c in symbols.chars()
        {
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(NameGenError::generation(format!(
                    "alphabet character {c:?} is not allowed in CSS identifiers"
                )));
            }

            if chars.contains(&c)
            {
                return Err(NameGenError::generation(format!(
                    "alphabet contains duplicate character {c:?}"
                )));
            }

            chars.push(c);
        }

        if chars.is_empty()
        {
            return Err(NameGenError::generation("alphabet must not be empty"));
        }

        Ok(Self { chars })
    }

    /// The default `a..z` alphabet
    pub fn lowercase() -> Self
    {
        Self {
            chars: DEFAULT_ALPHABET
                .chars()
                .collect(),
        }
    }

    pub fn len(&self) -> usize
    {
        self.chars
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.chars
            .is_empty()
    }

    pub fn chars(&self) -> &[char]
    {
        &self.chars
    }

    pub fn position(
        &self,
        c: char,
    ) -> Option<usize>
    {
        self.chars
            .iter()
            .position(|&x| x == c)
    }

    /// Encode a non-negative index as a bijective base-N string
    pub fn encode(
        &self,
        index: u64,
    ) -> String
    {
        let base = self.chars.len() as u128;
        let mut digits: Vec<char> = Vec::new();

        // u128 so that index + 1 never overflows
        let mut m = index as u128 + 1;
        while m > 0
        {
            m -= 1;
            digits.push(self.chars[(m % base) as usize]);
            m /= base;
        }

        digits
            .into_iter()
            .rev()
            .collect()
    }

    /// Signed entry point; negative indices are rejected
    pub fn encode_signed(
        &self,
        index: i64,
    ) -> Result<String, NameGenError>
    {
        let index = u64::try_from(index)
            .map_err(|_| NameGenError::generation(format!("negative index {index}")))?;

        Ok(self.encode(index))
    }

    /// Decode a bijective base-N string back into its index
    pub fn decode(
        &self,
        s: &str,
    ) -> Result<u64, NameGenError>
    {
        if s.is_empty()
        {
            return Err(NameGenError::generation("cannot decode an empty identifier"));
        }

        let base = self.chars.len() as u64;
        let mut acc: u64 = 0;

        for c in s.chars()
        {
            let digit = self
                .position(c)
                .ok_or_else(|| {
                    NameGenError::generation(format!("character {c:?} is not in the alphabet"))
                })? as u64;

            acc = acc
                .checked_mul(base)
                .and_then(|v| v.checked_add(digit + 1))
                .ok_or_else(|| NameGenError::generation(format!("identifier '{s}' overflows")))?;
        }

        // acc >= 1 for any non-empty input
        Ok(acc - 1)
    }

    /// Number of distinct identifiers of exactly `len` characters
    pub fn capacity_at(
        &self,
        len: u32,
    ) -> u64
    {
        (self.chars.len() as u64).saturating_pow(len)
    }

    /// Number of repetition-free identifiers of length `1..=max_len`
    pub fn permutation_capacity(
        &self,
        max_len: usize,
    ) -> u64
    {
        let n = self.chars.len() as u64;
        let mut total: u64 = 0;
        let mut tier: u64 = 1;

        for k in 0..max_len.min(self.chars.len()) as u64
        {
            tier = tier.saturating_mul(n - k);
            total = total.saturating_add(tier);
        }

        total
    }
}

impl Default for Alphabet
{
    fn default() -> Self
    {
        Self::lowercase()
    }
}

/// Encode with the lowercase alphabet
pub fn to_base26(n: u64) -> String
{
    Alphabet::lowercase().encode(n)
}

/// Decode with the lowercase alphabet
pub fn from_base26(s: &str) -> Result<u64, NameGenError>
{
    Alphabet::lowercase().decode(s)
}
