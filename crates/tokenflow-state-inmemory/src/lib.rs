//!
//! Tokenflow In-Memory State - non-persistent instance data for tokenflow
//!
//! [`InMemoryInstanceData`] implements the core's instance-data contract for a
//! single process instance. [`InMemoryInstanceStore`] keeps many instances
//! side by side and serializes activations per instance.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Instance data of one process instance
pub mod instance_data;

/// Multi-instance store
pub mod store;

pub use instance_data::InMemoryInstanceData;
pub use store::{InMemoryInstanceStore, InstanceId};
