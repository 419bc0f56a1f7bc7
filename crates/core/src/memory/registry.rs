use std::collections::HashMap;
use std::sync::RwLock;

use stairway_types::{Address, MarketId, MarketParams};

use crate::ports::MarketRegistry;

/// Market registry backed by two hash maps
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    markets: RwLock<HashMap<MarketId, MarketParams>>,
    tokens: RwLock<HashMap<Address, MarketId>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a market's parameters
    pub fn register_market(&self, market_id: MarketId, params: MarketParams) {
        let mut markets = self.markets.write().unwrap_or_else(|e| e.into_inner());
        markets.insert(market_id, params);
    }

    /// Bind a token identity to a market
    pub fn register_token(&self, token: Address, market_id: MarketId) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert(token, market_id);
    }
}

impl MarketRegistry for MemoryRegistry {
    fn resolve_token(&self, token: &Address) -> Option<MarketId> {
        self.tokens.read().ok()?.get(token).copied()
    }

    fn resolve_market(&self, market_id: MarketId) -> Option<MarketParams> {
        self.markets.read().ok()?.get(&market_id).copied()
    }
}
