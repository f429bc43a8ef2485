// ============================================================
// Layer 3 — Token Vocabulary
// ============================================================
// Digits occupy ids 0..base. Four reserved tokens sit directly
// above them, so no reserved id can ever be read as a digit:
//
//   base + 0  end        (after the second operand)
//   base + 1  separator  (between the operands)
//   base + 2  padding    (unused positions, moved to the tail)
//   base + 3  eos        (after the sum)
//
// Example for base 10, 7 + 3 = 10:
//   7 <sep> 3 <end> 1 0 <eos> <pad> <pad>
//   7  11   3  10   1 0  13    12    12

use serde::{Deserialize, Serialize};

/// Token ids for a given base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVocab {
    pub base:      u32,
    pub end:       u32,
    pub separator: u32,
    pub padding:   u32,
    pub eos:       u32,
}

impl TokenVocab {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            end:       base,
            separator: base + 1,
            padding:   base + 2,
            eos:       base + 3,
        }
    }

    /// Number of distinct ids the model must embed.
    pub fn size(&self) -> usize {
        self.base as usize + 4
    }

    pub fn is_digit(&self, token: u32) -> bool {
        token < self.base
    }

    /// Human readable form of one token, used by the diagnostics printers.
    pub fn render(&self, token: u32) -> String {
        match token {
            t if self.is_digit(t) => render_digit(t),
            t if t == self.end       => "=".to_string(),
            t if t == self.separator => "+".to_string(),
            t if t == self.padding   => "_".to_string(),
            t if t == self.eos       => "$".to_string(),
            t => format!("<{t}?>"),
        }
    }
}

// Bases above 10 print as letters, and anything past 36 falls back to
// bracketed decimal so the output stays unambiguous.
fn render_digit(d: u32) -> String {
    char::from_digit(d, 36)
        .map(|c| c.to_string())
        .unwrap_or_else(|| format!("[{d}]"))
}
