//! Path template compilation.
//!
//! A template is split on `/` and every non-empty token becomes one
//! [`PathSegment`]:
//!
//! ```text
//! /users/:id([0-9]+)/posts/:postId
//!  ^^^^^ ^^^^^^^^^^^ ^^^^^ ^^^^^^^
//!  Static Param(id,   Static Param(postId, None)
//!         Some("[0-9]+"))
//! ```
//!
//! Leading, trailing and repeated slashes are insignificant. Compilation
//! happens once, when the route is registered; the segments are reused for
//! every request afterwards.

use crate::error::Error;

/// One compiled token of a path template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathSegment {
    /// Must equal the request segment byte for byte.
    Static(String),
    /// Binds the request segment under `name`, optionally validated against
    /// a constraint pattern.
    Param { name: String, pattern: Option<String> },
}

impl PathSegment {
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

/// Compiles a path template into its segments.
///
/// Fails with [`Error::InvalidPathPattern`] when a constraint's parentheses
/// do not balance, when text follows the closing `)`, or when a parameter
/// has an empty name or an empty constraint.
pub fn compile(template: &str) -> Result<Vec<PathSegment>, Error> {
    split(template)
        .map(|token| match token.strip_prefix(':') {
            Some(param) => compile_param(template, param),
            None => Ok(PathSegment::Static(token.to_owned())),
        })
        .collect()
}

/// Splits a path into its non-empty `/`-delimited tokens.
pub(crate) fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn compile_param(template: &str, param: &str) -> Result<PathSegment, Error> {
    let Some(open) = param.find('(') else {
        if param.contains(')') {
            return Err(Error::invalid_pattern(template, "`)` without matching `(`"));
        }
        if param.is_empty() {
            return Err(Error::invalid_pattern(template, "empty parameter name"));
        }
        return Ok(PathSegment::Param { name: param.to_owned(), pattern: None });
    };

    let name = &param[..open];
    if name.is_empty() {
        return Err(Error::invalid_pattern(template, "empty parameter name"));
    }
    if name.contains(')') {
        return Err(Error::invalid_pattern(template, "`)` without matching `(`"));
    }

    let close = matching_paren(param, open)
        .ok_or_else(|| Error::invalid_pattern(template, "unterminated `(` in parameter constraint"))?;
    if close != param.len() - 1 {
        return Err(Error::invalid_pattern(template, "unexpected text after parameter constraint"));
    }

    let pattern = &param[open + 1..close];
    if pattern.is_empty() {
        return Err(Error::invalid_pattern(template, "empty parameter constraint"));
    }

    Ok(PathSegment::Param { name: name.to_owned(), pattern: Some(pattern.to_owned()) })
}

/// Byte offset of the `)` closing the `(` at `open`, skipping escaped
/// characters. `None` when the parentheses never balance.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in s[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
