//! Recursive text splitter for document ingestion.
//!
//! Splits raw text into chunks of at most `max_chars` characters, preferring
//! natural boundaries in order: paragraph, line, sentence (Devanagari danda
//! and Latin full stop), word. Only when no boundary fits does it fall back to
//! a hard character cut. Chunks are disjoint and keep their separators, so
//! concatenating them reproduces the input exactly.

/// Boundary separators, coarsest first.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", "\u{0964} ", ". ", " "];

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Empty input yields no chunks; callers reject empty uploads before
/// reaching the chunker.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    split_with(text, max_chars.max(1), &SEPARATORS)
}

fn split_with(text: &str, max_chars: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let Some((separator, rest)) = separators.split_first() else {
        return hard_split(text, max_chars);
    };

    let pieces = split_keeping_separator(text, separator);
    if pieces.len() <= 1 {
        return split_with(text, max_chars, rest);
    }

    merge_pieces(pieces, max_chars, rest)
}

/// Greedily packs pieces into chunks up to `max_chars`; a single piece that
/// is still too long recurses with the finer separators.
fn merge_pieces(pieces: Vec<String>, max_chars: usize, rest: &[&str]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for piece in pieces {
        let piece_len = char_len(&piece);

        if piece_len > max_chars {
            if !buffer.is_empty() {
                chunks.push(std::mem::take(&mut buffer));
                buffer_len = 0;
            }
            chunks.extend(split_with(&piece, max_chars, rest));
            continue;
        }

        if buffer_len + piece_len > max_chars && !buffer.is_empty() {
            chunks.push(std::mem::take(&mut buffer));
            buffer_len = 0;
        }

        buffer.push_str(&piece);
        buffer_len += piece_len;
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}

/// Splits after each separator occurrence, keeping the separator attached to
/// the preceding piece so no characters are lost.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut remaining = text;

    while let Some(idx) = remaining.find(separator) {
        let end = idx + separator.len();
        pieces.push(remaining[..end].to_string());
        remaining = &remaining[end..];
    }
    if !remaining.is_empty() {
        pieces.push(remaining.to_string());
    }

    pieces
}

fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect())
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
