//! Process exit codes
//!
//! Scripts driving `crdform` branch on these, so they stay stable.

/// Operation completed
pub const SUCCESS: i32 = 0;

/// Unclassified failure
pub const ERROR: i32 = 1;

/// Configuration rejected by the resource schema
pub const VALIDATION_ERROR: i32 = 2;

/// Manifest could not be decoded or marshalled
pub const RENDER_ERROR: i32 = 3;

/// Resource definition or CRD could not be loaded, or the type is unknown
pub const DEFINITION_ERROR: i32 = 4;

/// File not found, permission denied, ...
pub const IO_ERROR: i32 = 5;
