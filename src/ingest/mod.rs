//! Frame ingestion sources.
//!
//! The ingestion layer is responsible for:
//! - Producing `Frame` instances with monotonic indices and capture times
//! - Reporting a drained source as normal termination, not an error
//!
//! Only the synthetic `stub://` source is built in; real camera I/O belongs
//! to deployments.

pub mod camera;

pub use camera::{CameraConfig, CameraSource, CameraStats};
