//! Proxy-facing pieces of the rotation engine
//!
//! - Candidate ordering strategies
//! - The connectivity prober boundary and its HTTP implementation

pub mod http_probe;
pub mod probe;
pub mod rotation;

pub use http_probe::HttpProber;
pub use probe::{ConnectivityProber, ProbeResult, TimeoutProber};
pub use rotation::{create_ordering, CandidateOrdering, RotationStrategy};
