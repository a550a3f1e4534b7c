//! Paragraph-boundary chunking and clause counting.
//!
//! Documents are never retrieved chunk by chunk (the whole corpus goes into
//! every prompt), but the store reports how many chunks and clauses each
//! document contains. Both counts are derived from the text so that the same
//! upload always reports the same numbers.

/// Approximate chars-per-token ratio.
const CHARS_PER_TOKEN: usize = 4;

/// Split text into chunks on paragraph boundaries, respecting `max_tokens`.
///
/// Paragraphs (`\n\n`-separated) are packed greedily; a paragraph longer than
/// the budget is hard-split at the last newline or space before the limit.
/// Always returns at least one chunk.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens.max(1) * CHARS_PER_TOKEN;

    let mut chunks = Vec::new();
    let mut current_buf = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            chunks.push(std::mem::take(&mut current_buf));
        }

        if trimmed.len() > max_chars {
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let split_at = floor_char_boundary(remaining, max_chars);
                let actual_split = if split_at < remaining.len() {
                    remaining[..split_at]
                        .rfind('\n')
                        .or_else(|| remaining[..split_at].rfind(' '))
                        .map(|pos| pos + 1)
                        .unwrap_or(split_at)
                } else {
                    split_at
                };
                let piece = remaining[..actual_split].trim();
                if !piece.is_empty() {
                    chunks.push(piece.to_string());
                }
                remaining = &remaining[actual_split..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        chunks.push(current_buf);
    }

    if chunks.is_empty() {
        chunks.push(text.trim().to_string());
    }

    chunks
}

/// Count clause-like units: sentences ending in `.`, `;`, `?` or `!`, plus
/// any trailing non-empty line without a terminator (list items, headings).
pub fn count_clauses(text: &str) -> usize {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut count = 0;
            let mut pending = false;
            for c in line.chars() {
                if matches!(c, '.' | ';' | '?' | '!') {
                    if pending {
                        count += 1;
                        pending = false;
                    }
                } else if !c.is_whitespace() {
                    pending = true;
                }
            }
            if pending {
                count += 1;
            }
            count
        })
        .sum()
}

/// Largest index `<= max` that lies on a char boundary, but at least one char
/// so the split loop always makes progress.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        s.chars().next().map_or(s.len(), char::len_utf8)
    } else {
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 700);
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let chunks = chunk_text("", 700);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_multiple_paragraphs_under_limit() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_text(text, 700);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("First paragraph."));
        assert!(chunks[0].contains("Third paragraph."));
    }

    #[test]
    fn test_multiple_paragraphs_exceed_limit() {
        // max_tokens=5 => max_chars=20
        let text = "This is paragraph one.\n\nThis is paragraph two.\n\nThis is paragraph three.";
        let chunks = chunk_text(text, 5);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(!c.is_empty());
        }
    }

    #[test]
    fn test_multibyte_hard_split() {
        let text = "é".repeat(50);
        let chunks = chunk_text(&text, 1);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        assert_eq!(chunk_text(text, 2), chunk_text(text, 2));
    }

    #[test]
    fn test_count_clauses() {
        assert_eq!(count_clauses(""), 0);
        assert_eq!(count_clauses("Knee surgery covered after 2 years."), 1);
        assert_eq!(
            count_clauses("Section 1\nCataract is covered. Dental is excluded; see annex.\n\n- item"),
            5
        );
        assert_eq!(count_clauses("..."), 0);
    }
}
