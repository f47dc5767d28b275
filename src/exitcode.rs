//! Standard exit codes (BSD sysexits.h compatible where applicable)

/// Successful termination
pub const OK: i32 = 0;

/// Launcher failure: missing script, no interpreter, environment or install failure
pub const FAILURE: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
