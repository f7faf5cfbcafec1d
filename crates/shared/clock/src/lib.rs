//! Brokerage Clock Infrastructure
//!
//! Time sources for the engine:
//!
//! - [`SystemClock`]: wall-clock time, for production use
//! - [`ManualClock`]: frozen time that only moves when told to, for
//!   deterministic tests of time priority
//!
//! ## Usage
//!
//! ```ignore
//! use brokerage_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(None);
//! let t0 = clock.now();
//! clock.advance(Duration::seconds(1));
//! assert!(clock.now() > t0);
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use brokerage_ports::Clock;
