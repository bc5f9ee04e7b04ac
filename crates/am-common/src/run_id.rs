//! ULID identifiers for generation runs.
//!
//! Every strict generation stamps the rows it writes with a fresh run id, so
//! re-running for the same user shows which run last refreshed a match. The
//! process id is logged at startup to correlate runs with a deployment.
//!
//! ```
//! use am_common::run_id;
//!
//! let process = run_id::process();
//! let run = run_id::next_run();
//! assert_ne!(process, run);
//! ```

use once_cell::sync::Lazy;
use ulid::Ulid;

static PROCESS_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Stable for the lifetime of the process.
#[inline]
pub fn process() -> &'static str {
    &PROCESS_ID
}

/// A new id for one generation run. Later runs sort after earlier ones.
#[inline]
pub fn next_run() -> String {
    Ulid::new().to_string()
}
