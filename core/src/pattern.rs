//! `TextPattern` — compiled, case-insensitive text pattern.
//!
//! Text conditions compile their parameter once, at build time, and keep the
//! compiled regex in the condition. Nothing is recompiled per record.

use crate::{RuleError, MAX_PATTERN_LENGTH};
use std::fmt;

/// A case-insensitive regular expression over record text.
///
/// Uses Rust's `regex` crate (RE2 semantics), so matching is linear in the
/// input length no matter what the pattern looks like.
///
/// # Example
///
/// ```
/// use mailsift::TextPattern;
///
/// let p = TextPattern::compile(r"@example\.com$").unwrap();
/// assert!(p.is_match("Alice@EXAMPLE.com"));
/// assert!(!p.is_match("alice@example.org"));
/// ```
#[derive(Debug, Clone)]
pub struct TextPattern {
    regex: regex::Regex,
}

impl TextPattern {
    /// Compile `pattern` case-insensitively.
    ///
    /// # Errors
    ///
    /// - [`RuleError::PatternTooLong`] past [`MAX_PATTERN_LENGTH`] bytes
    /// - [`RuleError::InvalidPattern`] if the regex does not compile
    pub fn compile(pattern: &str) -> Result<Self, RuleError> {
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(RuleError::PatternTooLong {
                len: pattern.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }
        regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(|regex| Self { regex })
            .map_err(|e| RuleError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the pattern matches anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
