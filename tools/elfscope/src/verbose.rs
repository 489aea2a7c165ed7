//! Diagnostic output levels.
//!
//! `-q` silences decode warnings, `-v` adds per-section decode statistics.
//! Everything here writes to stderr; stdout carries only the report.

use std::sync::atomic::{AtomicU8, Ordering};

/// How much diagnostic output to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// Report only.
    Quiet = 0,
    /// Report plus warnings.
    Warnings = 1,
    /// Warnings plus decode statistics.
    Verbose = 2,
}

impl Verbosity {
    fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Warnings,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(Verbosity::Warnings as u8);

/// Set the process-wide level from the `-q`/`-v` flags.
pub fn init(quiet: bool, verbose: bool) {
    LEVEL.store(Verbosity::from_flags(quiet, verbose) as u8, Ordering::Relaxed);
}

fn level() -> Verbosity {
    match LEVEL.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Warnings,
    }
}

pub fn is_verbose() -> bool {
    level() == Verbosity::Verbose
}

pub fn is_quiet() -> bool {
    level() == Verbosity::Quiet
}

/// `eprintln!` that only fires under `-v`.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `eprintln!` that is silenced by `-q`.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if !$crate::verbose::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Warnings);
    }
}
