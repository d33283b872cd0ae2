//! Repository layer
//!
//! Repositories are the seams between the sync logic and the external
//! systems. Each trait is implemented directly by the matching protocol
//! client from `logship-client`; no business logic lives here.
//!
//! All repositories are trait-based to enable testing and mocking.

mod collector;
mod secrets;
mod snapshots;
mod source;

// Re-export traits
pub use collector::CollectorRepository;
pub use secrets::SecretRepository;
pub use snapshots::SnapshotRepository;
pub use source::LogSourceRepository;

// Re-export implementations
pub use secrets::PlaintextSecrets;
