//! Engine configuration types.

use std::time::Duration;

/// Bounds on SLD resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionConfig {
    /// Maximum depth of the goal stack
    pub max_depth: usize,
    /// Maximum number of resolution steps (clause head unifications attempted)
    pub max_steps: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        ResolutionConfig {
            max_depth: 256,
            max_steps: 100_000,
        }
    }
}

/// Budgets for the constraint search.
///
/// Both bounds are cooperative: they are checked once per node expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveOptions {
    pub timeout: Duration,
    /// Node expansion budget, 0 means no limit
    pub max_iterations: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            timeout: Duration::from_secs(10),
            max_iterations: 1_000_000,
        }
    }
}

impl SolveOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Configuration shared by every engine behind the [`Engine`](crate::Engine) facade
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub resolution: ResolutionConfig,
    pub solver: SolveOptions,
}
