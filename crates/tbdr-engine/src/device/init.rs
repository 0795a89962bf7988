/// Initialization parameters for the GPU layer.
///
/// Keep this structure minimal. Add flags only when a concrete backend
/// requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may pick from.
    pub backends: wgpu::Backends,

    /// Adapter preference. Benchmarks want the discrete GPU when there is one.
    pub power_preference: wgpu::PowerPreference,

    /// Force the software fallback adapter (useful on CI).
    pub force_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// Every blend strategy works with an empty set.
    pub required_features: wgpu::Features,

    /// Request the adapter's own limits instead of `required_limits`.
    ///
    /// The default working size (4000x2000, 50 layers) fits the WebGPU
    /// defaults, but larger runs need whatever the hardware offers.
    pub use_adapter_limits: bool,

    /// Limits requested when `use_adapter_limits` is false.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            use_adapter_limits: true,
            required_limits: wgpu::Limits::default(),
        }
    }
}
