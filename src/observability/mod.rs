//! Observability subsystem for insightdb
//!
//! - Structured JSON logging
//! - Typed events
//! - Monotonic counters
//! - Elapsed-time fields
//!
//! Observability is read-only: nothing here affects query results.
//!
//! ```ignore
//! use insightdb::observability::{Event, MetricsRegistry, Timer};
//!
//! let timer = Timer::new();
//! Event::QueryComplete.log(&[("rows", "42"), ("elapsed_ms", &timer.elapsed_ms())]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_query(42);
//! ```

mod events;
mod logger;
mod metrics;
mod timer;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use timer::Timer;
