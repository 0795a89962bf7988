//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - choosing between the adapter's limits and explicitly requested ones

mod gpu;
mod init;

pub use gpu::Gpu;
pub use init::GpuInit;
