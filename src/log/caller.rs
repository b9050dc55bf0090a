//! Caller frame capture.
//!
//! Frame 0 comes from `#[track_caller]`, so it points at the site of the
//! terminal logging call regardless of inlining. Deeper frames are found by
//! locating that site in a resolved backtrace and walking outward from it.
//! Their paths are made relative to the same root as frame 0.

use std::fmt;
use std::panic::Location;
use std::path::Path;

use backtrace::Backtrace;

/// Upper bound on frames recorded for a single line.
pub const MAX_DEPTH: usize = 32;

/// A captured stack location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: String,
    pub line: u32,
    pub function: Option<String>,
}

impl Frame {
    fn matches(&self, anchor: &Frame) -> bool {
        self.line == anchor.line && Path::new(&self.file).ends_with(&anchor.file)
    }
}

impl From<&Location<'_>> for Frame {
    fn from(loc: &Location<'_>) -> Self {
        Self {
            file: loc.file().to_string(),
            line: loc.line(),
            function: None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Captures up to `depth` frames, starting `skip` frames above the caller.
///
/// With `skip == 0` the first frame is always the caller's own location.
/// If the caller cannot be found in the backtrace (stripped binaries), only
/// that location is returned, or nothing when `skip > 0`.
#[track_caller]
pub fn capture_frames(skip: usize, depth: usize) -> Vec<Frame> {
    let anchor = Frame::from(Location::caller());
    let depth = depth.min(MAX_DEPTH);
    if depth == 0 {
        return Vec::new();
    }
    if skip == 0 && depth == 1 {
        return vec![anchor];
    }

    let resolved = resolve_backtrace();
    match resolved.iter().position(|f| f.matches(&anchor)) {
        Some(start) => {
            let root = resolved[start]
                .file
                .strip_suffix(anchor.file.as_str())
                .map(str::to_owned);
            let mut frames: Vec<Frame> = resolved.into_iter().skip(start + skip).take(depth).collect();
            if let Some(root) = root {
                strip_root(&mut frames, &root);
            }
            if skip == 0 {
                if let Some(first) = frames.first_mut() {
                    first.file = anchor.file;
                }
            }
            frames
        }
        None if skip == 0 => vec![anchor],
        None => Vec::new(),
    }
}

/// Rewrites frames under `root` to the same relative form `Location` uses.
fn strip_root(frames: &mut [Frame], root: &str) {
    if root.is_empty() {
        return;
    }
    for frame in frames {
        if let Some(relative) = frame.file.strip_prefix(root) {
            frame.file = relative.to_string();
        }
    }
}

fn resolve_backtrace() -> Vec<Frame> {
    let trace = Backtrace::new();
    let mut frames = Vec::new();
    for frame in trace.frames() {
        // Inlined calls show up as several symbols on one frame.
        for symbol in frame.symbols() {
            let (Some(file), Some(line)) = (symbol.filename(), symbol.lineno()) else {
                continue;
            };
            frames.push(Frame {
                file: file.display().to_string(),
                line,
                function: symbol.name().map(|n| n.to_string()),
            });
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_call_site() {
        let line = line!() + 1;
        let frames = capture_frames(0, 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].line, line);
        assert!(frames[0].file.ends_with("caller.rs"));
    }

    #[track_caller]
    fn wrapper() -> Vec<Frame> {
        capture_frames(0, 1)
    }

    #[test]
    fn test_track_caller_propagates() {
        let line = line!() + 1;
        let frames = wrapper();
        assert_eq!(frames[0].line, line);
    }

    #[test]
    fn test_zero_depth() {
        assert!(capture_frames(0, 0).is_empty());
    }

    #[test]
    fn test_deep_capture_starts_at_call_site() {
        let line = line!() + 1;
        let frames = capture_frames(0, 3);
        assert!(!frames.is_empty());
        assert!(frames.len() <= 3);
        assert_eq!(frames[0].line, line);
    }

    #[inline(never)]
    fn nested() -> Vec<Frame> {
        capture_frames(0, 2)
    }

    #[test]
    fn test_deeper_frames_are_relative() {
        let line = line!() + 1;
        let frames = nested();
        let root = env!("CARGO_MANIFEST_DIR");
        for frame in &frames {
            assert!(!frame.file.starts_with(root), "{frame}");
        }
        if let Some(outer) = frames.get(1).filter(|f| f.line == line) {
            assert_eq!(outer.file, frames[0].file);
        }
    }

    #[test]
    fn test_strip_root() {
        let mut frames = vec![
            Frame {
                file: "/work/app/src/db.rs".into(),
                line: 4,
                function: None,
            },
            Frame {
                file: "/rustc/abc/library/core/src/ops.rs".into(),
                line: 9,
                function: None,
            },
        ];
        strip_root(&mut frames, "/work/app/");
        assert_eq!(frames[0].file, "src/db.rs");
        assert_eq!(frames[1].file, "/rustc/abc/library/core/src/ops.rs");

        strip_root(&mut frames, "");
        assert_eq!(frames[0].file, "src/db.rs");
    }

    #[test]
    fn test_display() {
        let frame = Frame {
            file: "src/main.rs".into(),
            line: 12,
            function: None,
        };
        assert_eq!(frame.to_string(), "src/main.rs:12");
    }
}
