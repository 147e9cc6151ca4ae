//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range | Domain    | Description                              |
//! |-------|-----------|------------------------------------------|
//! | 0     | Universal | Success                                  |
//! | 1     | Universal | General error (unspecified)              |
//! | 2     | Universal | CLI usage error (bad args, missing file) |
//! | 3-9   | run       | Reconciliation run codes                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-9)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_RUN_INVALID_CONFIG: u8 = 3;

/// An input file could not be read or parsed (CSV columns, dates, amounts,
/// report JSON).
pub const EXIT_RUN_INPUT: u8 = 4;

/// The run completed but in fallback mode — the analysis report was too
/// malformed for per-field proposals.
pub const EXIT_RUN_DEGRADED: u8 = 5;

/// The run completed but some proposals were skipped during application.
pub const EXIT_RUN_PARTIAL: u8 = 6;

/// An output file could not be written.
pub const EXIT_RUN_OUTPUT: u8 = 7;
