pub mod events;
pub mod logging;
pub mod metrics;
pub mod replay;
pub mod runner;
pub mod session;

pub use runner::{run_session, RunOutcome, StopReason, TickSnapshot};
pub use session::{Allocation, SessionError, SimSession, TickReport};
