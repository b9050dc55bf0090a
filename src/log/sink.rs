//! Output destinations for rendered lines.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// A shared, serialized writer.
///
/// Each call to [`Sink::write_line`] holds the lock for exactly one line, so
/// concurrent loggers never interleave output.
pub struct Sink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    pub fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(line)?;
        writer.flush()
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

/// In-memory sink whose contents can be read back, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// Captured text split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_buffer_shares_contents_across_clones() {
        let buffer = SharedBuffer::new();
        let sink = Sink::new(buffer.clone());
        sink.write_line(b"hello\n").unwrap();
        assert_eq!(buffer.contents(), "hello\n");

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let buffer = SharedBuffer::new();
        let sink = Arc::new(Sink::new(buffer.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    let line = format!("{}\n", i.to_string().repeat(256));
                    for _ in 0..50 {
                        sink.write_line(line.as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = buffer.lines();
        assert_eq!(lines.len(), 400);
        for line in lines {
            let first = line.chars().next().unwrap();
            assert!(line.chars().all(|c| c == first));
            assert_eq!(line.len(), 256);
        }
    }
}
