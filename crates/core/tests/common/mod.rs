//! Shared harness for exchange integration tests

#![allow(dead_code)]

use std::sync::Arc;

use stairway_core::memory::{MemoryRegistry, MemoryReserve, MemoryToken, MemoryVault};
use stairway_core::{Collaborators, EscrowAttribution, ExchangeConfig, TokenExchange};
use stairway_types::{Address, MarketId, MarketParams, WAD};

pub const OWNER: Address = Address::repeat_byte(1);
pub const FEE_RECIPIENT: Address = Address::repeat_byte(2);
pub const EXCHANGE: Address = Address::repeat_byte(3);
pub const VAULT: Address = Address::repeat_byte(4);

pub const ALICE: Address = Address::repeat_byte(20);
pub const BOB: Address = Address::repeat_byte(21);
pub const CAROL: Address = Address::repeat_byte(22);

pub const TOKEN: Address = Address::repeat_byte(100);
pub const MARKET: MarketId = MarketId(7);

/// b = 1, r = 0.1, t = 1000 tokens
pub fn staircase(fee_rate: u128) -> MarketParams {
    MarketParams {
        base_cost: WAD,
        price_rise: WAD / 10,
        tokens_per_interval: 1_000 * WAD,
        trading_fee_rate: fee_rate,
        trading_fee_rate_scale: 10_000,
    }
}

pub struct Harness {
    pub exchange: TokenExchange,
    pub registry: Arc<MemoryRegistry>,
    pub token: Arc<MemoryToken>,
    pub vault: Arc<MemoryVault>,
    pub reserve: Arc<MemoryReserve>,
}

impl Harness {
    pub fn new(fee_rate: u128) -> Self {
        Self::with_policy(fee_rate, EscrowAttribution::Tracked)
    }

    pub fn with_policy(fee_rate: u128, escrow_attribution: EscrowAttribution) -> Self {
        let registry = Arc::new(MemoryRegistry::new());
        registry.register_market(MARKET, staircase(fee_rate));
        registry.register_token(TOKEN, MARKET);

        let token = Arc::new(MemoryToken::new());
        let reserve = Arc::new(MemoryReserve::new());
        let vault = Arc::new(MemoryVault::new(VAULT, reserve.clone(), WAD).unwrap());

        let collaborators = Collaborators {
            registry: registry.clone(),
            token: token.clone(),
            vault: vault.clone(),
            reserve: reserve.clone(),
        };
        let config = ExchangeConfig {
            owner: OWNER,
            fee_recipient: FEE_RECIPIENT,
            exchange_address: EXCHANGE,
            escrow_attribution,
        };

        Self {
            exchange: TokenExchange::initialize(config, collaborators).unwrap(),
            registry,
            token,
            vault,
            reserve,
        }
    }

    /// Give `who` reserve funds and approve the exchange to spend them
    pub fn fund(&self, who: &Address, amount: u128) {
        self.reserve.mint(who, amount).unwrap();
        self.reserve.approve(who, &EXCHANGE, amount);
    }
}
