//! Parameter constraint evaluation.
//!
//! The router knows nothing about regex syntax. It anchors a constraint
//! pattern and hands it, together with the request segment, to a
//! [`ConstraintMatcher`]. The default matcher is backed by the [`regex`]
//! crate.
//!
//! When the matcher cannot evaluate a pattern (it does not compile, or a
//! custom matcher reports a failure), the router degrades to [`fallback`]:
//! a tiny classifier for the handful of patterns people actually write in
//! routes. Anything it does not recognise matches. A broken constraint
//! therefore widens a route instead of taking it down.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use regex::Regex;
use thiserror::Error;

/// A constraint pattern could not be evaluated.
#[derive(Debug, Error)]
pub enum RegexError {
    #[error("constraint `{pattern}` does not compile: {source}")]
    Compile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("constraint `{pattern}` could not be evaluated: {reason}")]
    Evaluation { pattern: String, reason: String },
}

/// "Does this pattern match this string."
///
/// `pattern` arrives already anchored (see [`anchor`]). Implementations must
/// be shareable across the threads serving requests.
pub trait ConstraintMatcher: Send + Sync + 'static {
    fn is_match(&self, pattern: &str, value: &str) -> Result<bool, RegexError>;
}

/// The default [`ConstraintMatcher`], built on the `regex` crate.
///
/// Compiled patterns, and compile failures, are cached per pattern string, so
/// each constraint is compiled once no matter how many requests test it.
#[derive(Debug, Default)]
pub struct RegexMatcher {
    cache: RwLock<HashMap<String, Result<Regex, regex::Error>>>,
}

impl RegexMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn compiled(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(hit) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(pattern) {
            return hit.clone();
        }
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(pattern.to_owned())
            .or_insert_with(|| Regex::new(pattern))
            .clone()
    }
}

impl ConstraintMatcher for RegexMatcher {
    fn is_match(&self, pattern: &str, value: &str) -> Result<bool, RegexError> {
        self.compiled(pattern)
            .map(|re| re.is_match(value))
            .map_err(|source| RegexError::Compile { pattern: pattern.to_owned(), source })
    }
}

/// Anchors `pattern` so it must match a whole segment: prepends `^` and
/// appends `$` unless already present. The pattern is otherwise untouched.
///
/// A trailing `\$` is a literal dollar sign, not an anchor, so it still gets
/// a `$` appended.
pub fn anchor(pattern: &str) -> String {
    let mut anchored = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(pattern);
    if !ends_with_anchor(pattern) {
        anchored.push('$');
    }
    anchored
}

// An unescaped trailing `$`: preceded by an even number of backslashes.
fn ends_with_anchor(pattern: &str) -> bool {
    pattern.strip_suffix('$').is_some_and(|rest| {
        let backslashes = rest.bytes().rev().take_while(|&b| b == b'\\').count();
        backslashes % 2 == 0
    })
}

/// Character classes the degraded path understands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Class {
    Digits,
    Letters,
    Alphanumeric,
    Word,
    Anything,
}

impl Class {
    fn of(pattern: &str) -> Option<Self> {
        let core = pattern.strip_prefix('^').unwrap_or(pattern);
        let core = core.strip_suffix('$').unwrap_or(core);
        match core {
            "[0-9]+" | r"\d+" => Some(Self::Digits),
            "[a-zA-Z]+" | "[A-Za-z]+" => Some(Self::Letters),
            "[a-zA-Z0-9]+" | "[A-Za-z0-9]+" => Some(Self::Alphanumeric),
            r"\w+" => Some(Self::Word),
            ".*" | ".+" => Some(Self::Anything),
            _ => None,
        }
    }

    fn accepts(self, value: &str) -> bool {
        let nonempty = !value.is_empty();
        match self {
            Self::Digits => nonempty && value.bytes().all(|b| b.is_ascii_digit()),
            Self::Letters => nonempty && value.bytes().all(|b| b.is_ascii_alphabetic()),
            Self::Alphanumeric => nonempty && value.bytes().all(|b| b.is_ascii_alphanumeric()),
            Self::Word => nonempty && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_'),
            Self::Anything => true,
        }
    }
}

/// Best-effort verdict used when the matcher fails on `pattern`.
///
/// Recognises digit, letter, alphanumeric and `\w` runs and the `.*` / `.+`
/// wildcards, anchored or not. Every other pattern matches.
pub fn fallback(pattern: &str, value: &str) -> bool {
    Class::of(pattern).is_none_or(|class| class.accepts(value))
}
