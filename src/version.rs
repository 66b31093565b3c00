//! Version information for the dispatcher crate.

/// Version string for the dispatcher crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
