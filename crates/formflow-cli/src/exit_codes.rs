//! Exit codes for the formflow CLI.
//! These codes are part of the public contract; scripts branch on them.

pub const OK: i32 = 0;
pub const VALIDATION_FAILED: i32 = 1; // One or more fields invalid
pub const CONFIG_ERROR: i32 = 2; // Bad flags, config, schema or answers file
pub const NETWORK_ERROR: i32 = 3; // Form server unreachable or misbehaving
