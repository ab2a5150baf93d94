/// Review server access
///
/// The pipeline (detection, binarization, vectorization) runs behind an
/// HTTP server. This module only speaks its protocol.

pub mod client;

pub use client::{ApiError, ReviewApi};
