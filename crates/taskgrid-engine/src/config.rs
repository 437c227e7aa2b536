//! Engine configuration.

/// Configuration for the command service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on the number of entities one cascade may flip. A
    /// closure that grows past this aborts the transaction instead of
    /// consuming it; 100k is far above any legitimate subtree.
    pub max_closure_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_closure_size: 100_000,
        }
    }
}
