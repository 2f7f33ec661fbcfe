//! Service adapters.
//!
//! Each adapter turns validated tool arguments into calls against one AWS
//! API and reshapes the responses. Backends sit behind narrow traits
//! ([`ObjectStore`], [`DataApi`], [`PlaceService`]) held in an
//! [`AdapterSession`]; every remote call goes through
//! [`AdapterSession::call`], which applies the [`RetryPolicy`] and classifies
//! failures.

pub mod aurora;
pub mod aws;
pub mod failure;
pub mod location;
pub mod retry;
pub mod s3;
pub mod session;

pub use aurora::{AuroraAdapter, DataApi};
pub use failure::{BackendFailure, FailureClass};
pub use location::{LocationAdapter, PlaceService};
pub use retry::RetryPolicy;
pub use s3::{ObjectStore, S3Adapter};
pub use session::{AdapterSession, Connector};
