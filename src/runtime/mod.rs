//! Runtime support: recorded samples, the stall watchdog and the threaded
//! host link

pub mod sample;
pub mod service;
pub mod watchdog;

pub use sample::Sample;
pub use service::{BridgeService, HostMessage, ServiceReport};
pub use watchdog::{StallPolicy, StallWatchdog};
