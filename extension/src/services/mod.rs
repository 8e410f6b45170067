// Collaborators of the popup controller, each behind its own seam

#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod clipboard;
pub mod messaging;
pub mod storage;
pub mod timer;
