/// Image and vector assets shown by the editor
///
/// This module handles:
/// - Fetching the source photo, preview raster and SVG
/// - Decoding them off the UI thread
/// - Keeping each asset slot independent and cancelling stale fetches

pub mod loader;
pub mod slot;

pub use loader::Photo;
pub use slot::{Asset, AssetSlot};
