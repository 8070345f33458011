#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Configuration {
    /// Upper bound of the frame-end wait when a block is disabled.
    pub stop_timeout: std::time::Duration,
    /// Pipeline instances (sessions) each block keeps a parameter set for.
    pub instances: usize,
    /// Buffers a single frame may batch per DMA path.
    pub max_buffers: usize,
    /// Keeps secure-governed routing fixed while the system is secured.
    pub secure_build: bool,
}

impl Configuration {
    pub fn deserialize_bincode(data: &[u8]) -> bincode::Result<Configuration> {
        bincode::deserialize(data)
    }
}

pub const DEFAULT_CONFIGURATION: Configuration = Configuration {
    stop_timeout: std::time::Duration::from_millis(100),
    instances: 8,
    max_buffers: 8,
    secure_build: false,
};

impl Default for Configuration {
    fn default() -> Self {
        DEFAULT_CONFIGURATION
    }
}
