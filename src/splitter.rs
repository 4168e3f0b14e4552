use std::collections::VecDeque;

/// Recursive character splitter: tries coarse separators first and only falls
/// back to finer ones for pieces that are still too long. Lengths are counted
/// in characters.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let idx = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep.as_str()))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(idx).map(String::as_str).unwrap_or("");
        let rest = separators.get(idx + 1..).unwrap_or(&[]);

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(std::mem::take(&mut pending), separator));
            }
            if rest.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, rest));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(pending, separator));
        }
        chunks
    }

    /// Greedily pack small pieces into chunks of at most `chunk_size`.
    fn merge(&self, pieces: Vec<String>, separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<String> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);
            let joined_len = if current.is_empty() { 0 } else { sep_len };
            if total + len + joined_len > self.chunk_size && !current.is_empty() {
                if let Some(chunk) = join(&current, separator) {
                    chunks.push(chunk);
                }
                loop {
                    let joined_len = if current.is_empty() { 0 } else { sep_len };
                    let overflows = total + len + joined_len > self.chunk_size && total > 0;
                    if total <= self.chunk_overlap && !overflows {
                        break;
                    }
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let removed = char_len(&first) + if current.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(removed);
                }
            }
            current.push_back(piece);
            if current.len() > 1 {
                total += sep_len;
            }
            total += len;
        }
        if let Some(chunk) = join(&current, separator) {
            chunks.push(chunk);
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(pieces: &VecDeque<String>, separator: &str) -> Option<String> {
    let joined = pieces
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
