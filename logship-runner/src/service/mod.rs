//! Service layer
//!
//! Services contain the business logic of the runner. They sequence the
//! repositories and decide which side effects a run performs.
//!
//! The orchestrator works against repository traits to enable testing and
//! dependency injection.

pub mod invocation;
pub mod sync;

pub use invocation::{ProcessState, invoke};
pub use sync::SyncOrchestrator;
