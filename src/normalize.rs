//! Value normalization.
//!
//! Converts raw incoming tokens (numeric literals or symbols from a
//! bounded alphabet) into real numbers suitable for histogramming.
//! Symbols are assigned integer codes in arrival order; the table is
//! owned by the [`Normalizer`] instance so independent pipelines do not
//! share state.

use std::collections::HashMap;

/// Tagged parse result for one raw ingestion token.
#[derive(Debug, Clone, PartialEq)]
pub enum RawToken {
    /// A finite floating-point literal.
    Number(f64),
    /// A symbol from a bounded alphabet.
    Symbol(String),
    /// Unparseable input; dropped rather than fatal.
    Malformed,
}

impl RawToken {
    /// Parse one textual token. NaN/Inf literals and empty or
    /// whitespace-containing tokens are malformed.
    pub fn parse(text: &str) -> Self {
        let token = text.trim();
        if token.is_empty() {
            return RawToken::Malformed;
        }
        if let Ok(value) = token.parse::<f64>() {
            return if value.is_finite() {
                RawToken::Number(value)
            } else {
                RawToken::Malformed
            };
        }
        if token.chars().any(char::is_whitespace) {
            return RawToken::Malformed;
        }
        RawToken::Symbol(token.to_string())
    }
}

/// Maps raw tokens to bounded real values.
#[derive(Debug, Default)]
pub struct Normalizer {
    /// Symbol -> code table, assigned in arrival order.
    codes: HashMap<String, u32>,
    next_code: u32,
    dropped: u64,
}

impl Normalizer {
    /// Create an empty normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a parsed token. Returns `None` for malformed input
    /// (counted, not fatal).
    pub fn normalize(&mut self, token: &RawToken) -> Option<f64> {
        match token {
            RawToken::Number(value) => Some(*value),
            RawToken::Symbol(symbol) => Some(f64::from(self.code_for(symbol))),
            RawToken::Malformed => {
                self.dropped += 1;
                None
            }
        }
    }

    /// Parse and normalize one textual token.
    pub fn normalize_text(&mut self, text: &str) -> Option<f64> {
        let token = RawToken::parse(text);
        self.normalize(&token)
    }

    /// Count a drop decided outside the parse path (e.g. a non-finite
    /// value delivered on a numeric feed).
    pub fn record_drop(&mut self) {
        self.dropped += 1;
    }

    fn code_for(&mut self, symbol: &str) -> u32 {
        if let Some(&code) = self.codes.get(symbol) {
            return code;
        }
        let code = self.next_code;
        self.codes.insert(symbol.to_string(), code);
        self.next_code += 1;
        code
    }

    /// Number of distinct symbols seen so far.
    pub fn symbol_count(&self) -> usize {
        self.codes.len()
    }

    /// Number of malformed tokens dropped.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Clear the symbol table and counters.
    pub fn reset(&mut self) {
        self.codes.clear();
        self.next_code = 0;
        self.dropped = 0;
    }
}
