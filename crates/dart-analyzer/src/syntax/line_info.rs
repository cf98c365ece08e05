use serde::Serialize;

/// 1-based line and column (in chars) of an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

/// Line start table for converting byte offsets to line/column pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    line_starts: Vec<usize>,
}

impl LineInfo {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn location(
        &self,
        text: &str,
        offset: usize,
    ) -> LineColumn {
        let offset = offset.min(text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(ins) => ins.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        let column = text.get(line_start..offset).map_or(offset - line_start, |prefix| prefix.chars().count());
        LineColumn {
            line: line + 1,
            column: column + 1,
        }
    }

    /// Byte offset of a 1-based line/column pair.
    pub fn offset_of(
        &self,
        text: &str,
        position: LineColumn,
    ) -> Option<usize> {
        let line_start = *self.line_starts.get(position.line.checked_sub(1)?)?;
        let line_end = self.line_starts.get(position.line).copied().unwrap_or(text.len());
        let line_text = text.get(line_start..line_end)?;
        let wanted = position.column.checked_sub(1)?;
        if wanted == 0 {
            return Some(line_start);
        }
        line_text.char_indices().nth(wanted).map(|(i, _)| line_start + i).or_else(|| {
            (line_text.chars().count() == wanted).then_some(line_end)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/src/syntax/line_info_tests.rs"]
mod tests;
