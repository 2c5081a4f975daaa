/// Default word budget per chunk.
pub const DEFAULT_CHUNK_WORDS: usize = 200;

/// Split a note body into bounded-size, header-aware segments.
///
/// Header lines (levels 1-3) start a new chunk. Paragraphs accumulate until
/// appending the next block would exceed `max_words`; the accumulated chunk
/// is then emitted and a new one starts at the overflowing block. The word
/// budget is a heuristic, not a hard bound: a single paragraph longer than
/// `max_words` is emitted as one oversized chunk rather than split
/// mid-sentence.
pub fn split_chunks(text: &str, max_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    let flush = |current: &mut String, current_words: &mut usize, chunks: &mut Vec<String>| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        current.clear();
        *current_words = 0;
    };

    for block in blocks(text) {
        let words = block.text.split_whitespace().count();
        if words == 0 {
            continue;
        }
        if block.is_header {
            flush(&mut current, &mut current_words, &mut chunks);
        } else if current_words > 0 && current_words + words > max_words {
            flush(&mut current, &mut current_words, &mut chunks);
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(block.text.trim_end());
        current_words += words;
    }
    flush(&mut current, &mut current_words, &mut chunks);

    chunks
}

struct Block {
    text: String,
    is_header: bool,
}

fn is_header_line(line: &str) -> bool {
    let hashes = line.len() - line.trim_start_matches('#').len();
    (1..=3).contains(&hashes) && line.as_bytes().get(hashes) == Some(&b' ')
}

/// Break text into header lines and blank-line-separated paragraphs.
fn blocks(text: &str) -> Vec<Block> {
    let mut out = Vec::new();
    let mut paragraph = String::new();

    let end_paragraph = |paragraph: &mut String, out: &mut Vec<Block>| {
        if !paragraph.trim().is_empty() {
            out.push(Block {
                text: std::mem::take(paragraph),
                is_header: false,
            });
        } else {
            paragraph.clear();
        }
    };

    for line in text.lines() {
        if is_header_line(line) {
            end_paragraph(&mut paragraph, &mut out);
            out.push(Block {
                text: line.to_string(),
                is_header: true,
            });
        } else if line.trim().is_empty() {
            end_paragraph(&mut paragraph, &mut out);
        } else {
            if !paragraph.is_empty() {
                paragraph.push('\n');
            }
            paragraph.push_str(line);
        }
    }
    end_paragraph(&mut paragraph, &mut out);

    out
}
