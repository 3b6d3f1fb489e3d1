//! Incremental line framing for raw serial chunks.
//!
//! Serial drains hand back whatever happens to be buffered, so a record can
//! arrive split across several reads (or several records can arrive in
//! one). The framer stitches chunks back into `\n`-terminated lines and
//! carries the unterminated tail over to the next feed.

/// Reassembles newline-terminated records from arbitrarily chunked input.
#[derive(Debug, Default)]
pub struct LineFramer {
    fragment: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk; returns every line completed by it, oldest first.
    ///
    /// Emitted lines have their terminator stripped. Whatever follows the
    /// last `\n` (possibly nothing) is retained as the new fragment and is
    /// only emitted once a later chunk completes it.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.fragment.push_str(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.fragment.find('\n') {
            let mut line: String = self.fragment.drain(..=pos).collect();
            line.pop(); // terminator
            lines.push(line);
        }
        lines
    }

    /// The retained unterminated tail.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}
