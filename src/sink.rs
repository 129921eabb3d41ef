//! Text sink for comparison messages.
//!
//! Every reporting function writes into a [`TextSink`] passed by the
//! caller, so messages can go to a `String`, a test runner's buffer or a
//! terminal. The sink decides whether highlights are emitted as ANSI
//! escape sequences or dropped.
//!
//! ```
//! use zencompare::{ColorMode, TextSink};
//!
//! let mut message = String::new();
//! let sink = TextSink::new(&mut message).with_color_mode(ColorMode::Never);
//! assert!(!sink.colors());
//! ```

use core::fmt;
use std::io::IsTerminal;

/// When to emit ANSI colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorMode {
    /// Plain text only.
    #[default]
    Never,
    /// Always emit escape sequences.
    Always,
    /// Colors if standard error is a terminal and `NO_COLOR` is not set.
    Auto,
}

impl ColorMode {
    /// Whether this mode results in colored output.
    pub fn enabled(self) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
            }
        }
    }
}

/// Highlight color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Highlight {
    Red,
    Yellow,
}

impl Highlight {
    const fn escape(self) -> &'static str {
        match self {
            Self::Red => "\x1b[1;31m",
            Self::Yellow => "\x1b[1;33m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Destination for human-readable comparison output.
///
/// Wraps any [`fmt::Write`]. Colors are off unless enabled with
/// [`with_colors`](Self::with_colors) or
/// [`with_color_mode`](Self::with_color_mode).
pub struct TextSink<'a> {
    out: &'a mut dyn fmt::Write,
    colors: bool,
}

impl<'a> TextSink<'a> {
    /// Sink writing plain text into `out`.
    pub fn new(out: &'a mut dyn fmt::Write) -> Self {
        Self { out, colors: false }
    }

    /// Enable or disable ANSI colors.
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Resolve colors from a [`ColorMode`].
    pub fn with_color_mode(self, mode: ColorMode) -> Self {
        self.with_colors(mode.enabled())
    }

    /// Whether ANSI colors are emitted.
    #[inline]
    pub fn colors(&self) -> bool {
        self.colors
    }

    /// Write `args`, highlighted if colors are enabled.
    pub(crate) fn write_highlighted(
        &mut self,
        highlight: Option<Highlight>,
        args: fmt::Arguments<'_>,
    ) -> fmt::Result {
        match highlight {
            Some(highlight) if self.colors => {
                self.out.write_str(highlight.escape())?;
                self.out.write_fmt(args)?;
                self.out.write_str(RESET)
            }
            _ => self.out.write_fmt(args),
        }
    }
}

impl fmt::Write for TextSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.write_str(s)
    }
}

impl fmt::Debug for TextSink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSink")
            .field("colors", &self.colors)
            .finish_non_exhaustive()
    }
}
