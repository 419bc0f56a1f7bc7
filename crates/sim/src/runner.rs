//! Scenario execution against in-memory collaborators

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use stairway_core::memory::{MemoryRegistry, MemoryReserve, MemoryToken, MemoryVault};
use stairway_core::{Collaborators, ExchangeConfig, ReserveAsset, TokenExchange, TokenLedger, YieldVault};
use stairway_types::{Address, MarketId, TokenExchangeInfo, TradeReceipt};
use tracing::{debug, info, warn};

use crate::config::{account_address, SimConfig, Step, EXCHANGE_ACCOUNT, VAULT_ACCOUNT};
use crate::error::SimResult;

/// What a successful step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepDetail {
    Trade(TradeReceipt),
    Accrued { exchange_rate: u128 },
    Withdrawn { amount: u128 },
    Authorized { token: String, withdrawer: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StepDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultReport {
    pub exchange_rate: u128,
    pub total_shares: u128,
    pub reserve_balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub reserve: u128,
    pub tokens: BTreeMap<String, u128>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenReport {
    pub supply: u128,
    pub escrow: TokenExchangeInfo,
    pub pending_interest: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawer: Option<String>,
}

/// Final state of a scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
    pub vault: VaultReport,
    pub accounts: BTreeMap<String, AccountReport>,
    pub tokens: BTreeMap<String, TokenReport>,
}

impl Report {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.succeeded()).count()
    }
}

/// Exchange wired to in-memory collaborators built from a [`SimConfig`]
pub struct Simulation {
    config: SimConfig,
    exchange: TokenExchange,
    token: Arc<MemoryToken>,
    vault: Arc<MemoryVault>,
    reserve: Arc<MemoryReserve>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let registry = Arc::new(MemoryRegistry::new());
        for market in &config.markets {
            registry.register_market(MarketId(market.id), market.params());
        }
        for token in &config.tokens {
            registry.register_token(account_address(&token.name)?, MarketId(token.market));
        }

        let token = Arc::new(MemoryToken::new());
        let reserve = Arc::new(MemoryReserve::new());
        let vault = Arc::new(
            MemoryVault::new(
                account_address(VAULT_ACCOUNT)?,
                reserve.clone(),
                config.vault.initial_exchange_rate.0,
            )?
            .with_growth(config.vault.growth_per_accrual.0),
        );

        let exchange_address = account_address(EXCHANGE_ACCOUNT)?;
        let exchange = TokenExchange::initialize(
            ExchangeConfig {
                owner: account_address(&config.owner)?,
                fee_recipient: account_address(&config.fee_recipient)?,
                exchange_address,
                escrow_attribution: config.escrow_attribution,
            },
            Collaborators {
                registry,
                token: token.clone(),
                vault: vault.clone(),
                reserve: reserve.clone(),
            },
        )?;

        for account in &config.accounts {
            let address = account_address(&account.name)?;
            reserve.mint(&address, account.funding.0)?;
            let allowance = account.allowance.unwrap_or(account.funding);
            reserve.approve(&address, &exchange_address, allowance.0);
            debug!(account = %account.name, funding = %account.funding, "account funded");
        }

        let owner = exchange.owner();
        for withdrawer in &config.withdrawers {
            exchange.authorize_interest_withdrawer(
                &owner,
                &account_address(&withdrawer.token)?,
                &account_address(&withdrawer.account)?,
            )?;
        }

        Ok(Self {
            config,
            exchange,
            token,
            vault,
            reserve,
        })
    }

    /// Replay every configured step, then report the final state.
    ///
    /// A failing step is recorded and the run continues.
    pub fn run(&self) -> SimResult<Report> {
        let mut outcomes = Vec::with_capacity(self.config.steps.len());

        for (index, step) in self.config.steps.iter().enumerate() {
            let outcome = match self.execute(step) {
                Ok(detail) => {
                    info!(step = index, action = step.action(), "step completed");
                    StepOutcome {
                        index,
                        action: step.action(),
                        detail: Some(detail),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(step = index, action = step.action(), error = %e, "step failed");
                    StepOutcome {
                        index,
                        action: step.action(),
                        detail: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        self.report(outcomes)
    }

    /// Run a single step
    pub fn execute(&self, step: &Step) -> SimResult<StepDetail> {
        match step {
            Step::Buy {
                account,
                token,
                amount,
                max_cost,
                recipient,
            } => {
                let buyer = account_address(account)?;
                let recipient = account_address(recipient.as_deref().unwrap_or(account))?;
                let bound = max_cost.map_or(u128::MAX, |c| c.0);
                let receipt =
                    self.exchange
                        .buy_tokens(&buyer, &account_address(token)?, amount.0, bound, &recipient)?;
                Ok(StepDetail::Trade(receipt))
            }
            Step::Sell {
                account,
                token,
                amount,
                min_price,
                recipient,
            } => {
                let seller = account_address(account)?;
                let recipient = account_address(recipient.as_deref().unwrap_or(account))?;
                let bound = min_price.map_or(0, |p| p.0);
                let receipt =
                    self.exchange
                        .sell_tokens(&seller, &account_address(token)?, amount.0, bound, &recipient)?;
                Ok(StepDetail::Trade(receipt))
            }
            Step::Accrue { times } => {
                for _ in 0..*times {
                    self.vault.accrue_interest()?;
                }
                Ok(StepDetail::Accrued {
                    exchange_rate: self.vault.exchange_rate(),
                })
            }
            Step::Withdraw { account, token } => {
                let amount = self
                    .exchange
                    .withdraw_interest(&account_address(account)?, &account_address(token)?)?;
                Ok(StepDetail::Withdrawn { amount })
            }
            Step::Authorize {
                caller,
                token,
                withdrawer,
            } => {
                self.exchange.authorize_interest_withdrawer(
                    &account_address(caller)?,
                    &account_address(token)?,
                    &account_address(withdrawer)?,
                )?;
                Ok(StepDetail::Authorized {
                    token: token.clone(),
                    withdrawer: withdrawer.clone(),
                })
            }
        }
    }

    /// Snapshot balances, vault and escrow state by scenario name
    pub fn report(&self, steps: Vec<StepOutcome>) -> SimResult<Report> {
        let mut names: Vec<&str> = self.config.accounts.iter().map(|a| a.name.as_str()).collect();
        names.push(&self.config.owner);
        names.push(&self.config.fee_recipient);

        let mut token_addresses = BTreeMap::new();
        for token in &self.config.tokens {
            token_addresses.insert(token.name.clone(), account_address(&token.name)?);
        }

        let mut accounts = BTreeMap::new();
        for name in names {
            let address = account_address(name)?;
            let tokens = token_addresses
                .iter()
                .map(|(token, token_address)| (token.clone(), self.token.balance_of(token_address, &address)))
                .collect();
            accounts.insert(
                name.to_string(),
                AccountReport {
                    reserve: self.reserve.balance_of(&address),
                    tokens,
                },
            );
        }

        let mut tokens = BTreeMap::new();
        for (name, address) in &token_addresses {
            let withdrawer = self
                .exchange
                .interest_withdrawer(address)?
                .map(|w| self.name_of(&w));
            tokens.insert(
                name.clone(),
                TokenReport {
                    supply: self.token.total_supply(address),
                    escrow: self.exchange.token_exchange_info(address)?,
                    pending_interest: self.exchange.pending_interest(address)?,
                    withdrawer,
                },
            );
        }

        let vault = VaultReport {
            exchange_rate: self.vault.exchange_rate(),
            total_shares: self.vault.total_shares(),
            reserve_balance: self.reserve.balance_of(&self.vault.address()),
        };

        Ok(Report {
            steps,
            vault,
            accounts,
            tokens,
        })
    }

    fn name_of(&self, address: &Address) -> String {
        let bytes = address.as_bytes();
        let len = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..len]).into_owned()
    }
}
