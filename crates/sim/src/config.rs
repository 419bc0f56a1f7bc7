use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use stairway_core::EscrowAttribution;
use stairway_types::{Address, MarketId, MarketParams, BPS_DENOMINATOR, DECIMALS, INITIAL_EXCHANGE_RATE, WAD};

use crate::error::{SimError, SimResult};

/// Account name reserved for the exchange's custody account
pub const EXCHANGE_ACCOUNT: &str = "stairway:exchange";

/// Account name reserved for the vault
pub const VAULT_ACCOUNT: &str = "stairway:vault";

/// Scenario configuration loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimConfig {
    /// Default tracing filter level
    pub log_level: String,

    /// How trades feed the escrow ledger
    #[serde(default)]
    pub escrow_attribution: EscrowAttribution,

    /// Account allowed to rotate withdrawers
    pub owner: String,

    /// Account receiving trading fees
    pub fee_recipient: String,

    pub vault: VaultConfig,

    /// Accounts and their starting reserve balances
    pub accounts: Vec<AccountConfig>,

    pub markets: Vec<MarketConfig>,

    /// Market tokens and the market each belongs to
    pub tokens: Vec<TokenConfig>,

    /// Withdrawers assigned by the owner before the first step
    #[serde(default)]
    pub withdrawers: Vec<WithdrawerConfig>,

    /// Actions replayed in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Vault rate settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VaultConfig {
    /// Starting reserve value per share
    pub initial_exchange_rate: TokenAmount,

    /// Fractional rate increase applied by every accrual
    #[serde(default)]
    pub growth_per_accrual: TokenAmount,
}

/// Simulated account
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AccountConfig {
    pub name: String,

    /// Reserve minted to the account at start
    #[serde(default)]
    pub funding: TokenAmount,

    /// Allowance granted to the exchange; defaults to the funding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowance: Option<TokenAmount>,
}

/// Bonding-curve market
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketConfig {
    pub id: u64,
    pub base_cost: TokenAmount,
    pub price_rise: TokenAmount,
    pub tokens_per_interval: TokenAmount,

    /// Fee numerator, zero for no fee
    #[serde(default)]
    pub trading_fee_rate: u64,

    #[serde(default = "default_fee_scale")]
    pub trading_fee_rate_scale: u64,
}

/// Market token
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenConfig {
    pub name: String,
    pub market: u64,
}

/// Initial withdrawer assignment
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WithdrawerConfig {
    pub token: String,
    pub account: String,
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Buy {
        account: String,
        token: String,
        amount: TokenAmount,
        /// Slippage bound; unbounded when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_cost: Option<TokenAmount>,
        /// Receives the tokens; the buyer when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient: Option<String>,
    },
    Sell {
        account: String,
        token: String,
        amount: TokenAmount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_price: Option<TokenAmount>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient: Option<String>,
    },
    /// Advance the vault rate
    Accrue {
        #[serde(default = "default_accruals")]
        times: u32,
    },
    Withdraw {
        account: String,
        token: String,
    },
    Authorize {
        caller: String,
        token: String,
        withdrawer: String,
    },
}

impl Step {
    /// Action name as written in the config
    pub fn action(&self) -> &'static str {
        match self {
            Step::Buy { .. } => "buy",
            Step::Sell { .. } => "sell",
            Step::Accrue { .. } => "accrue",
            Step::Withdraw { .. } => "withdraw",
            Step::Authorize { .. } => "authorize",
        }
    }
}

fn default_fee_scale() -> u64 {
    BPS_DENOMINATOR as u64
}

fn default_accruals() -> u32 {
    1
}

impl SimConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> SimResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_string(),
            source,
        })?;

        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> SimResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| SimError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SimResult<()> {
        if self.log_level.is_empty() {
            return Err(SimError::invalid("log_level must not be empty"));
        }

        if self.vault.initial_exchange_rate.0 == 0 {
            return Err(SimError::invalid("vault.initial_exchange_rate must be greater than 0"));
        }

        let mut accounts = HashSet::new();
        for account in &self.accounts {
            account_address(&account.name)?;
            if account.name == EXCHANGE_ACCOUNT || account.name == VAULT_ACCOUNT {
                return Err(SimError::invalid(format!("account name {} is reserved", account.name)));
            }
            if !accounts.insert(account.name.as_str()) {
                return Err(SimError::invalid(format!("duplicate account {}", account.name)));
            }
        }
        account_address(&self.owner)?;
        account_address(&self.fee_recipient)?;
        if self.owner == self.fee_recipient {
            return Err(SimError::invalid("owner and fee_recipient must differ"));
        }

        if self.markets.is_empty() {
            return Err(SimError::invalid("at least one market is required"));
        }
        let mut markets = HashSet::new();
        for market in &self.markets {
            if !markets.insert(market.id) {
                return Err(SimError::invalid(format!("duplicate market {}", market.id)));
            }
            market.params().validate(MarketId(market.id))?;
        }

        let mut tokens = HashSet::new();
        for token in &self.tokens {
            account_address(&token.name)?;
            if !markets.contains(&token.market) {
                return Err(SimError::invalid(format!(
                    "token {} references unknown market {}",
                    token.name, token.market
                )));
            }
            if !tokens.insert(token.name.as_str()) {
                return Err(SimError::invalid(format!("duplicate token {}", token.name)));
            }
        }

        let known_account = |name: &str| accounts.contains(name) || name == self.owner || name == self.fee_recipient;
        let check_account = |name: &str| {
            if known_account(name) {
                Ok(())
            } else {
                Err(SimError::invalid(format!("unknown account {}", name)))
            }
        };
        let check_token = |name: &str| {
            if tokens.contains(name) {
                Ok(())
            } else {
                Err(SimError::invalid(format!("unknown token {}", name)))
            }
        };

        for withdrawer in &self.withdrawers {
            check_token(&withdrawer.token)?;
            check_account(&withdrawer.account)?;
        }

        for step in &self.steps {
            match step {
                Step::Buy {
                    account,
                    token,
                    recipient,
                    ..
                }
                | Step::Sell {
                    account,
                    token,
                    recipient,
                    ..
                } => {
                    check_account(account)?;
                    check_token(token)?;
                    if let Some(recipient) = recipient {
                        check_account(recipient)?;
                    }
                }
                Step::Accrue { .. } => {}
                Step::Withdraw { account, token } => {
                    check_account(account)?;
                    check_token(token)?;
                }
                Step::Authorize {
                    caller,
                    token,
                    withdrawer,
                } => {
                    check_account(caller)?;
                    check_token(token)?;
                    check_account(withdrawer)?;
                }
            }
        }

        Ok(())
    }
}

impl MarketConfig {
    pub fn params(&self) -> MarketParams {
        MarketParams {
            base_cost: self.base_cost.0,
            price_rise: self.price_rise.0,
            tokens_per_interval: self.tokens_per_interval.0,
            trading_fee_rate: u128::from(self.trading_fee_rate),
            trading_fee_rate_scale: u128::from(self.trading_fee_rate_scale),
        }
    }
}

/// Deterministic address for a scenario name: its bytes, zero padded
pub fn account_address(name: &str) -> SimResult<Address> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 32 {
        return Err(SimError::invalid(format!("name {:?} must be 1 to 32 bytes", name)));
    }

    let mut address = [0u8; 32];
    address[..bytes.len()].copy_from_slice(bytes);
    Ok(Address::new(address))
}

// ============================================================================
// Token Amounts
// ============================================================================

/// 18-decimal amount written in whole units, e.g. `"1500"` or `"0.1"`.
///
/// TOML integers stop at `i64`, so amounts are carried as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenAmount(pub u128);

impl TokenAmount {
    /// `units` whole tokens
    pub fn whole(units: u128) -> Self {
        Self(units.saturating_mul(WAD))
    }
}

impl FromStr for TokenAmount {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SimError::invalid(format!("invalid amount {:?}", s));
        let s = s.trim();
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole) || !digits(fraction) || fraction.len() > DECIMALS as usize {
            return Err(invalid());
        }

        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let fraction: u128 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", fraction, width = DECIMALS as usize);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(WAD)
            .and_then(|v| v.checked_add(fraction))
            .map(TokenAmount)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WAD;
        let fraction = self.0 % WAD;
        if fraction == 0 {
            return write!(f, "{}", whole);
        }

        let fraction = format!("{:0>width$}", fraction, width = DECIMALS as usize);
        write!(f, "{}.{}", whole, fraction.trim_end_matches('0'))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Example
// ============================================================================

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            escrow_attribution: EscrowAttribution::Tracked,
            owner: "owner".to_string(),
            fee_recipient: "treasury".to_string(),
            vault: VaultConfig {
                initial_exchange_rate: TokenAmount(INITIAL_EXCHANGE_RATE),
                growth_per_accrual: TokenAmount::default(),
            },
            accounts: vec![],
            markets: vec![],
            tokens: vec![],
            withdrawers: vec![],
            steps: vec![],
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> SimResult<()> {
    example_config().save(path)
}

/// Two traders on one staircase market with a 1% fee and a vault earning
/// 5% per accrual
pub fn example_config() -> SimConfig {
    SimConfig {
        vault: VaultConfig {
            initial_exchange_rate: TokenAmount(WAD),
            growth_per_accrual: TokenAmount(WAD / 20),
        },
        accounts: vec![
            AccountConfig {
                name: "alice".to_string(),
                funding: TokenAmount::whole(10_000),
                allowance: None,
            },
            AccountConfig {
                name: "bob".to_string(),
                funding: TokenAmount::whole(5_000),
                allowance: None,
            },
            AccountConfig {
                name: "creator".to_string(),
                funding: TokenAmount::default(),
                allowance: None,
            },
        ],
        markets: vec![MarketConfig {
            id: 1,
            base_cost: TokenAmount::whole(1),
            price_rise: TokenAmount(WAD / 10),
            tokens_per_interval: TokenAmount::whole(1_000),
            trading_fee_rate: 100,
            trading_fee_rate_scale: 10_000,
        }],
        tokens: vec![TokenConfig {
            name: "STAIR".to_string(),
            market: 1,
        }],
        withdrawers: vec![WithdrawerConfig {
            token: "STAIR".to_string(),
            account: "creator".to_string(),
        }],
        steps: vec![
            Step::Buy {
                account: "alice".to_string(),
                token: "STAIR".to_string(),
                amount: TokenAmount::whole(2_500),
                max_cost: Some(TokenAmount::whole(2_727)),
                recipient: None,
            },
            Step::Buy {
                account: "bob".to_string(),
                token: "STAIR".to_string(),
                amount: TokenAmount::whole(500),
                max_cost: None,
                recipient: None,
            },
            Step::Accrue { times: 2 },
            Step::Withdraw {
                account: "creator".to_string(),
                token: "STAIR".to_string(),
            },
            Step::Sell {
                account: "alice".to_string(),
                token: "STAIR".to_string(),
                amount: TokenAmount::whole(1_000),
                min_price: None,
                recipient: None,
            },
        ],
        ..SimConfig::default()
    }
}
