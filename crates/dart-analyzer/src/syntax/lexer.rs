use std::ops::Range;

use logos::Logos;

use crate::syntax::kind::{SyntaxKind, TokenKind};

/// A lexer that wraps `logos::Lexer` to produce `SyntaxKind` tokens.
///
/// Offsets reported by [`Lexer::span`] are relative to the full buffer even
/// when lexing starts part-way through it.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    base: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::starting_at(input, 0)
    }

    /// Lexes `source[start..]`. `start` must be a char boundary.
    pub fn starting_at(
        source: &'a str,
        start: usize,
    ) -> Self {
        Self {
            inner: TokenKind::lexer(&source[start..]),
            base: start,
        }
    }

    /// Span of the token most recently returned by `next`.
    pub fn span(&self) -> Range<usize> {
        let span = self.inner.span();
        span.start + self.base..span.end + self.base
    }

    /// Like `next`, but skips whitespace and yields absolute spans.
    pub fn next_significant(&mut self) -> Option<(SyntaxKind, Range<usize>)> {
        loop {
            let (kind, _) = self.next()?;
            if kind != SyntaxKind::Whitespace {
                return Some((kind, self.span()));
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = (SyntaxKind, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let token_result = self.inner.next()?;
        let text = self.inner.slice();

        let kind = match token_result {
            Ok(token) => token.into(),
            Err(_) => SyntaxKind::Error,
        };

        Some((kind, text))
    }
}

#[cfg(test)]
#[path = "../../tests/src/syntax/lexer_tests.rs"]
mod tests;
