//! HLS backend implementations
//!
//! - **hls4ml**: drives the `hls4ml` CLI and the vendor synthesis tools
//! - **emulated**: in-process fixed-point model of the generated hardware,
//!   used as the hardware variant during equivalence testing

pub mod emulated;
pub mod hls4ml;

pub use emulated::EmulatedNetwork;
pub use hls4ml::Hls4mlBackend;
