//! Verbosity levels for exploration logging.

use core::fmt;

/// How much the exploration engine reports while it runs.
///
/// Levels are ordered from least to most verbose, so filtering is a
/// comparison: `verbosity >= Verbosity::Steps`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Verbosity {
    /// Nothing beyond the final summary.
    #[default]
    Quiet = 0,
    /// Found bugs and iteration outcomes.
    Bugs = 1,
    /// Every scheduling decision and actor lifecycle change.
    Steps = 2,
    /// Every send, dequeue and state transition.
    Full = 3,
}

impl Verbosity {
    /// Maps a configuration integer to a level; anything above 3 is `Full`.
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Quiet,
            1 => Self::Bugs,
            2 => Self::Steps,
            _ => Self::Full,
        }
    }

    /// Returns the level name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Bugs => "bugs",
            Self::Steps => "steps",
            Self::Full => "full",
        }
    }

    /// Returns true if this level includes `other`.
    #[must_use]
    pub const fn is_at_least(self, other: Self) -> bool {
        self as u8 >= other as u8
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
