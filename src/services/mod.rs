/// Bridging core between the daemon and MPRIS
pub mod bridge;
/// Shared building blocks
pub mod common;
/// XMMS2 IPC client
pub mod xmms2;
