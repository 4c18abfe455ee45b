//! Outbound text helpers.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Breaks on line boundaries where possible; a single line longer than the
/// limit is cut at character boundaries. Always returns at least one chunk.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut chunk = String::new();
    let mut chunk_chars = 0usize;

    for line in text.split('\n') {
        let line_chars = line.chars().count();
        let sep = usize::from(chunk_chars > 0);
        if chunk_chars + sep + line_chars <= max_chars {
            if sep == 1 {
                chunk.push('\n');
            }
            chunk.push_str(line);
            chunk_chars += sep + line_chars;
            continue;
        }

        if chunk_chars > 0 {
            out.push(std::mem::take(&mut chunk));
        }

        let mut rest = line;
        while rest.chars().count() > max_chars {
            let cut = rest
                .char_indices()
                .nth(max_chars)
                .map_or(rest.len(), |(i, _)| i);
            out.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        chunk = rest.to_string();
        chunk_chars = rest.chars().count();
    }

    if chunk_chars > 0 || out.is_empty() {
        out.push(chunk);
    }
    out
}
