use super::ChunkerError;
use tracing::debug;

const TOKEN_WINDOW_DEFAULT_SIZE: usize = 250;
const TOKEN_WINDOW_DEFAULT_OVERLAP: usize = 50;

/// A whitespace-token-counting sibling of [SlidingWindow][super::SlidingWindow].
///
/// `size` and `overlap` are counted in whitespace-delimited tokens instead
/// of bytes, which keeps chunk boundaries stable across inputs with very
/// different average word lengths.
#[derive(Debug, Clone)]
pub struct TokenWindow {
    pub size: usize,
    pub overlap: usize,
}

impl TokenWindow {
    /// Create a new `TokenWindow` chunker.
    /// Errors if `overlap` is greater than `size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkerError> {
        if overlap > size {
            return Err(ChunkerError::Config(
                "overlap must be less than size".to_string(),
            ));
        }
        Ok(Self { size, overlap })
    }
}

impl Default for TokenWindow {
    fn default() -> Self {
        Self::new(TOKEN_WINDOW_DEFAULT_SIZE, TOKEN_WINDOW_DEFAULT_OVERLAP)
            .expect("overlap is greater than size")
    }
}

impl TokenWindow {
    pub fn chunk<'a>(&self, input: &'a str) -> Result<Vec<&'a str>, ChunkerError> {
        let TokenWindow { size, overlap } = self;

        let input = input.trim();

        if input.is_empty() {
            return Ok(vec![]);
        }

        // Token boundaries as byte offsets into `input`, one past the end
        // of each whitespace-delimited token.
        let tokens: Vec<(usize, usize)> = {
            let mut spans = vec![];
            let mut start = None;
            for (i, c) in input.char_indices() {
                if c.is_whitespace() {
                    if let Some(s) = start.take() {
                        spans.push((s, i));
                    }
                } else if start.is_none() {
                    start = Some(i);
                }
            }
            if let Some(s) = start {
                spans.push((s, input.len()));
            }
            spans
        };

        if tokens.len() <= size + overlap {
            return Ok(vec![input]);
        }

        let mut chunks = vec![];
        let mut start = 0usize;

        while start < tokens.len() {
            let end = (start + size).min(tokens.len());

            let chunk_start_tok = start.saturating_sub(*overlap);
            let chunk_end_tok = (end + overlap).min(tokens.len());

            let byte_start = tokens[chunk_start_tok].0;
            let byte_end = tokens[chunk_end_tok - 1].1;

            chunks.push(&input[byte_start..byte_end]);

            if end == tokens.len() {
                break;
            }

            start = end;
        }

        debug!(
            "Chunked {} chunks from {} tokens",
            chunks.len(),
            tokens.len()
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_window_works() {
        let input = "one two three four five six seven eight nine ten";
        let window = TokenWindow::new(4, 1).unwrap();
        let chunks = window.chunk(input).unwrap();

        assert_eq!(chunks[0], "one two three four five");
        assert!(chunks.len() > 1);
    }

    #[tokio::test]
    async fn token_window_empty() {
        let window = TokenWindow::new(4, 1).unwrap();
        let chunks = window.chunk("   ").unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn token_window_small_input() {
        let input = "just a few words";
        let window = TokenWindow::new(30, 5).unwrap();
        let chunks = window.chunk(input).unwrap();
        assert_eq!(chunks, vec![input]);
    }
}
