/// Splits text into overlapping character windows. Chunks are trimmed and
/// empty chunks dropped; the final window always reaches the end of the text.
pub fn split_into_chunks(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars = text.chars().collect::<Vec<_>>();
    let len = chars.len();
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size.saturating_sub(1));

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < len {
        let end = (start + chunk_size).min(len);
        let slice = chars[start..end].iter().collect::<String>();
        let trimmed = slice.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == len {
            break;
        }
        start = end - overlap;
    }
    chunks
}
