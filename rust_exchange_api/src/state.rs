use std::sync::Arc;

use aggregator::{ConnectorRegistry, LiquidityService};

use crate::auth::TokenSet;
use crate::config::{DEFAULT_DEPTH, MAX_DEPTH};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectorRegistry>,
    pub liquidity: Arc<LiquidityService>,
    pub tokens: Arc<TokenSet>,
    pub default_depth: usize,
    pub max_depth: usize,
}

impl AppState {
    pub fn new(registry: Arc<ConnectorRegistry>, tokens: TokenSet) -> Self {
        Self {
            liquidity: Arc::new(LiquidityService::new(registry.clone())),
            registry,
            tokens: Arc::new(tokens),
            default_depth: DEFAULT_DEPTH,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_liquidity(mut self, liquidity: LiquidityService) -> Self {
        self.liquidity = Arc::new(liquidity);
        self
    }

    pub fn with_depth_bounds(mut self, default_depth: usize, max_depth: usize) -> Self {
        self.default_depth = default_depth;
        self.max_depth = max_depth;
        self
    }

    /// Requested order-book depth: anything that is not a positive integer
    /// means the default, and large values are capped.
    pub fn resolve_depth(&self, raw: Option<&str>) -> usize {
        raw.and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|&d| d > 0)
            .map(|d| usize::try_from(d).unwrap_or(usize::MAX).min(self.max_depth))
            .unwrap_or(self.default_depth)
    }
}
