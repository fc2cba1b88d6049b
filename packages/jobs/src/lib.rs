// ABOUTME: Job submission layer for Inkline
// ABOUTME: Named job kinds and the event-bus client used by the pipeline engine

pub mod bus;
pub mod error;
pub mod types;

pub use bus::{HttpJobBus, JobBus, MemoryJobBus, RecordedJob};
pub use error::{JobError, Result};
pub use types::{JobAck, JobKind};
