use std::{ops::Range, sync::Arc};

use tracing::debug;

use crate::{
    error::ScanError,
    syntax::{SyntaxKind, Token, TokenId, TokenStream, lexer::Lexer},
};

/// Maximum number of characters the lexer inspects past the end of a token
/// before committing to it. Tokens ending at least this far before an edit
/// cannot be affected by it.
pub const SCAN_LOOKAHEAD: usize = 4;

/// One contiguous replacement: `removed_len` bytes at `start` in the old
/// text became `inserted_len` bytes in the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start: usize,
    pub removed_len: usize,
    pub inserted_len: usize,
}

impl Edit {
    pub fn new(
        start: usize,
        removed_len: usize,
        inserted_len: usize,
    ) -> Self {
        Self {
            start,
            removed_len,
            inserted_len,
        }
    }

    /// Smallest edit turning `old` into `new`, found by trimming the common
    /// prefix and suffix on char boundaries.
    pub fn between(
        old: &str,
        new: &str,
    ) -> Self {
        let (old_bytes, new_bytes) = (old.as_bytes(), new.as_bytes());
        let mut prefix = old_bytes.iter().zip(new_bytes).take_while(|(a, b)| a == b).count();
        while !(old.is_char_boundary(prefix) && new.is_char_boundary(prefix)) {
            prefix -= 1;
        }
        let max_suffix = old.len().min(new.len()) - prefix;
        let mut suffix = old_bytes
            .iter()
            .rev()
            .zip(new_bytes.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        while !(old.is_char_boundary(old.len() - suffix) && new.is_char_boundary(new.len() - suffix)) {
            suffix -= 1;
        }
        Self {
            start: prefix,
            removed_len: old.len() - prefix - suffix,
            inserted_len: new.len() - prefix - suffix,
        }
    }

    pub fn delta(&self) -> isize {
        self.inserted_len as isize - self.removed_len as isize
    }

    pub fn is_empty(&self) -> bool {
        self.removed_len == 0 && self.inserted_len == 0
    }

    fn malformed(
        &self,
        reason: &'static str,
    ) -> ScanError {
        ScanError::MalformedEdit {
            start: self.start,
            removed: self.removed_len,
            inserted: self.inserted_len,
            reason,
        }
    }
}

/// Outcome of [`rescan`]. `first_changed..=last_changed` is the run of new
/// tokens with no lexically equal counterpart in the old stream; both are
/// `None` when the edit introduced no token.
#[derive(Debug, Clone)]
pub struct RescanResult {
    pub stream: TokenStream,
    pub first_changed: Option<TokenId>,
    pub last_changed: Option<TokenId>,
    /// Old tokens dropped without a replacement.
    pub removed_tokens: usize,
    /// Tokens produced by re-lexing, including those matched back to old ones.
    pub relexed: usize,
}

impl RescanResult {
    pub fn has_changes(&self) -> bool {
        self.first_changed.is_some() || self.removed_tokens > 0
    }

    pub fn changed_tokens(&self) -> Vec<TokenId> {
        let (Some(first), Some(last)) = (self.first_changed, self.last_changed) else {
            return Vec::new();
        };
        let mut ids = vec![first];
        let mut cursor = first;
        while cursor != last {
            let Some(next) = self.stream.next(cursor) else {
                break;
            };
            ids.push(next);
            cursor = next;
        }
        ids
    }
}

/// Re-lexes only the region of `old` affected by `edit` and splices the
/// result between the untouched leading and trailing runs. The returned
/// stream is token-for-token identical to a full scan of `new_source`;
/// leading and resynchronized trailing tokens keep their ids.
pub fn rescan(
    old: &TokenStream,
    new_source: impl Into<Arc<str>>,
    edit: Edit,
) -> Result<RescanResult, ScanError> {
    let new_source: Arc<str> = new_source.into();
    let old_source = old.source();
    let old_end = edit.start.checked_add(edit.removed_len).ok_or_else(|| edit.malformed("edit overflows"))?;
    if old_end > old_source.len() {
        return Err(edit.malformed("edit extends past the end of the old source"));
    }
    if old_source.len() - edit.removed_len + edit.inserted_len != new_source.len() {
        return Err(edit.malformed("new source length disagrees with the edit"));
    }
    let new_end = edit.start + edit.inserted_len;
    if !old_source.is_char_boundary(edit.start)
        || !old_source.is_char_boundary(old_end)
        || !new_source.is_char_boundary(new_end)
    {
        return Err(edit.malformed("edit does not fall on char boundaries"));
    }
    let delta = edit.delta();
    let shifted = |token: &Token| (token.offset() as isize + delta) as usize;

    // Leading tokens the edit cannot reach stay untouched.
    let mut anchor: Option<TokenId> = None;
    let mut cursor = Some(old.first());
    while let Some(id) = cursor {
        let Some(token) = old.get(id) else {
            break;
        };
        if token.kind() == SyntaxKind::Eof || token.end() + SCAN_LOOKAHEAD > edit.start {
            break;
        }
        anchor = Some(id);
        cursor = token.next();
    }
    let mut tail: Vec<TokenId> = Vec::new();
    while let Some(id) = cursor {
        tail.push(id);
        cursor = old.next(id);
    }
    let restart = anchor.and_then(|id| old.get(id)).map_or(0, Token::end);

    // Re-lex until a fresh token starts exactly where an old token past the
    // edit now starts; everything from there on is unchanged.
    let mut fresh: Vec<(SyntaxKind, Range<usize>)> = Vec::new();
    let mut lexer = Lexer::starting_at(&new_source, restart);
    let mut j = 0usize;
    let resync = loop {
        let next = lexer.next_significant();
        let position = next.as_ref().map_or(new_source.len(), |(_, span)| span.start);
        while let Some(token) = tail.get(j).and_then(|id| old.get(*id)) {
            if token.offset() < old_end || shifted(token) < position {
                j += 1;
            } else {
                break;
            }
        }
        if tail.get(j).and_then(|id| old.get(*id)).is_some_and(|token| shifted(token) == position) {
            break j;
        }
        match next {
            Some(token) => fresh.push(token),
            None => break tail.len().saturating_sub(1),
        }
    };

    let replaced = &tail[..resync];
    let same = |old_id: TokenId, (kind, span): &(SyntaxKind, Range<usize>)| {
        old.kind(old_id) == *kind && old.lexeme(old_id) == &new_source[span.clone()]
    };
    let mut front = 0;
    while front < replaced.len() && front < fresh.len() && same(replaced[front], &fresh[front]) {
        front += 1;
    }
    let mut back = 0;
    while back < replaced.len() - front
        && back < fresh.len() - front
        && same(replaced[replaced.len() - 1 - back], &fresh[fresh.len() - 1 - back])
    {
        back += 1;
    }

    let mut stream = old.with_source(new_source.clone());
    let mut run: Vec<TokenId> = Vec::with_capacity(fresh.len() + tail.len() - resync);
    for (id, (_, span)) in replaced[..front].iter().zip(&fresh[..front]) {
        stream.relocate(*id, span.start);
        run.push(*id);
    }
    let dropped = &replaced[front..replaced.len() - back];
    for id in dropped {
        stream.release(*id);
    }
    let mut changed: Vec<TokenId> = Vec::new();
    for (kind, span) in &fresh[front..fresh.len() - back] {
        let id = stream.alloc_token(*kind, span.start, span.len());
        changed.push(id);
        run.push(id);
    }
    for (id, (_, span)) in replaced[replaced.len() - back..].iter().zip(&fresh[fresh.len() - back..]) {
        stream.relocate(*id, span.start);
        run.push(*id);
    }
    for id in &tail[resync..] {
        if let Some(token) = old.get(*id) {
            stream.relocate(*id, shifted(token));
        }
        run.push(*id);
    }
    stream.link(anchor, &run);

    debug!(
        "[rescan] restart {} relexed {} tokens, {} changed, {} dropped",
        restart,
        fresh.len(),
        changed.len(),
        dropped.len().saturating_sub(changed.len())
    );

    Ok(RescanResult {
        stream,
        first_changed: changed.first().copied(),
        last_changed: changed.last().copied(),
        removed_tokens: dropped.len().saturating_sub(changed.len()),
        relexed: fresh.len(),
    })
}

#[cfg(test)]
#[path = "../../tests/src/syntax/incremental_tests.rs"]
mod tests;
