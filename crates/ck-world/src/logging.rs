//! Ambient logging init for embedders that want one, grounded on
//! `jobweaver`'s `main.rs`: an `EnvFilter` defaulting to this crate's info
//! level, `fmt` output with targets suppressed.
//!
//! `World` never calls this itself, since a library shouldn't install a
//! global subscriber behind its caller's back. A host binary calls it once
//! at startup.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global `tracing` subscriber filtered to `ck_world=info` (or
/// `ck_world=debug,info` when `verbose` is set), unless `RUST_LOG` is
/// already set in the environment.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("ck_world=debug,info")
        } else {
            EnvFilter::new("ck_world=info")
        }
    });

    fmt().with_env_filter(filter).with_target(false).init();
}
