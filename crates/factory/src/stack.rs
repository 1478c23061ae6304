//! Stack capture and cleanup.
//!
//! A stack string has the shape
//!
//! ```text
//! Name: rendered message
//!     at <innermost frame>
//!     at <caller>
//!     ...
//! ```
//!
//! Captures always start at the factory's own construction site, which is of
//! no interest to whoever raised the error. [`clean`] drops that line.

use regex::Regex;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(FRAME_REGEX, r"^\s*\d+: (.+)$");
regex!(LOCATION_REGEX, r"^\s+at (.+)$");
regex!(INTERNAL_REGEX, r"^<?(std::backtrace|errgen_factory::(descriptor|instance|stack)::)");

/// Frame reported when no backtrace could be captured.
const CONSTRUCTION_FRAME: &str = "errgen_factory::construct";

/// Source of call stack frames for newly constructed errors.
pub trait StackCapture: Send + Sync {
    /// Returns the current call stack, innermost frame first. The first frame
    /// is the factory's own construction site.
    fn capture(&self) -> Vec<String>;
}

/// Captures frames with [`std::backtrace::Backtrace`].
///
/// Honours `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`: when capturing is disabled
/// only the construction frame is reported, which [`clean`] then removes,
/// leaving a stack that is just the header line.
#[derive(Clone, Copy, Debug, Default)]
pub struct BacktraceCapture;
impl StackCapture for BacktraceCapture {
    fn capture(&self) -> Vec<String> {
        let backtrace = Backtrace::capture();
        if backtrace.status() != BacktraceStatus::Captured {
            return vec![CONSTRUCTION_FRAME.to_string()];
        }
        external_frames(parse(&backtrace.to_string()))
    }
}

/// Collapses the leading capture and construction frames into a single
/// [`CONSTRUCTION_FRAME`], so the caller's frame comes right after it.
fn external_frames(frames: Vec<String>) -> Vec<String> {
    let skip = frames.iter().take_while(|frame| is_internal(frame)).count();
    std::iter::once(CONSTRUCTION_FRAME.to_string()).chain(frames.into_iter().skip(skip)).collect()
}

fn is_internal(frame: &str) -> bool {
    INTERNAL_REGEX.is_match(frame) && !frame.contains("::tests::")
}

/// Reports the same frames every time. Intended for tests.
#[derive(Clone, Debug, Default)]
pub struct FixedCapture {
    frames: Vec<String>,
}
impl FixedCapture {
    pub fn new(frames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
        }
    }
}
impl StackCapture for FixedCapture {
    fn capture(&self) -> Vec<String> {
        self.frames.clone()
    }
}

/// Parses the `Display` output of a captured [`Backtrace`] into
/// `symbol (location)` frames.
fn parse(backtrace: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    for line in backtrace.lines() {
        if let Some(captures) = FRAME_REGEX.captures(line) {
            frames.push(captures[1].trim().to_string());
        } else if let Some(captures) = LOCATION_REGEX.captures(line)
            && let Some(frame) = frames.last_mut()
        {
            frame.push_str(&format!(" ({})", captures[1].trim()));
        }
    }
    frames
}

/// Renders a stack string from a header line and frames.
pub fn assemble(header: &str, frames: &[String]) -> String {
    let mut stack = header.to_string();
    for frame in frames {
        stack.push_str("\n    at ");
        stack.push_str(frame);
    }
    stack
}

/// Removes the second line (the construction frame) from a stack string.
///
/// ```
/// use errgen_factory::stack::clean;
/// assert_eq!(clean("E: msg\n    at eval\n    at main"), "E: msg\n    at main");
/// assert_eq!(clean("E: msg"), "E: msg");
/// ```
pub fn clean(stack: &str) -> String {
    let mut lines: Vec<&str> = stack.split('\n').collect();
    if lines.len() > 1 {
        lines.remove(1);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::create
             at /rustc/abc/library/std/src/backtrace.rs:331:13
   2: <errgen_factory::stack::BacktraceCapture as errgen_factory::stack::StackCapture>::capture
             at ./src/stack.rs:48:25
   3: app::main
   4: <unknown>";

    #[test]
    fn test_parse_frames() {
        let frames = parse(SAMPLE);
        assert_eq!(frames.len(), 5);
        assert_eq!(
            frames[1],
            "std::backtrace::Backtrace::create (/rustc/abc/library/std/src/backtrace.rs:331:13)"
        );
        assert_eq!(frames[3], "app::main");
        assert_eq!(frames[4], "<unknown>");
    }

    #[test]
    fn test_external_frames_collapse_factory_internals() {
        let mut frames = parse(SAMPLE);
        frames.splice(
            3..3,
            [
                "errgen_factory::instance::ErrorInstance::capture_stack (./src/instance.rs:259:46)",
                "errgen_factory::descriptor::ErrorType::initialize (./src/descriptor.rs:213:21)",
                "errgen_factory::descriptor::ErrorType::initialize (./src/descriptor.rs:211:17)",
                "errgen_factory::descriptor::ErrorType::construct (./src/descriptor.rs:177:9)",
                "errgen_factory::descriptor::ErrorType::constructor::{{closure}} (./src/descriptor.rs:190:31)",
            ]
            .map(String::from),
        );
        let frames = external_frames(frames);
        assert_eq!(frames, vec![CONSTRUCTION_FRAME, "app::main", "<unknown>"]);

        let stack = clean(&assemble("E: m", &frames));
        assert_eq!(stack.lines().nth(1), Some("    at app::main"));
    }

    #[test]
    fn test_external_frames_keeps_callers() {
        let frames = external_frames(vec![
            "errgen_factory::stack::tests::caller".to_string(),
            "errgen_factory_app::main".to_string(),
        ]);
        assert_eq!(frames, vec![CONSTRUCTION_FRAME, "errgen_factory::stack::tests::caller", "errgen_factory_app::main"]);
    }

    #[test]
    fn test_assemble() {
        let frames = vec!["a".to_string(), "b".to_string()];
        assert_eq!(assemble("E: m", &frames), "E: m\n    at a\n    at b");
        assert_eq!(assemble("E: m", &[]), "E: m");
    }

    #[test]
    fn test_clean_removes_construction_frame() {
        let frames = FixedCapture::new(["eval at <anonymous>", "app::handler", "app::main"]).capture();
        let cleaned = clean(&assemble("TestCleanStackTrace: TestCleanStackTrace", &frames));
        assert_eq!(
            cleaned,
            "TestCleanStackTrace: TestCleanStackTrace\n    at app::handler\n    at app::main"
        );
        assert!(!cleaned.contains("eval"));
    }

    #[test]
    fn test_clean_single_line() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("Only: header"), "Only: header");
    }

    #[test]
    fn test_backtrace_capture_keeps_header() {
        let stack = clean(&assemble("E: m", &BacktraceCapture.capture()));
        assert!(stack.starts_with("E: m"));
        assert!(!stack.contains(CONSTRUCTION_FRAME));
        assert!(stack.lines().nth(1).is_none_or(|line| !line.contains("BacktraceCapture")));
    }
}
