//! Interest accrual, withdrawal and withdrawer authorization

mod common;

use common::*;
use stairway_core::{EscrowAttribution, ReserveAsset, YieldVault};
use stairway_math::value_of_shares;
use stairway_types::{Address, ExchangeError, TokenExchangeInfo, WAD};

const SECOND_TOKEN: Address = Address::repeat_byte(101);

/// Alice buys 1000 tokens at unit price, then the vault rate rises 10%
fn funded_with_interest() -> Harness {
    let h = Harness::new(0);
    h.fund(&ALICE, 10_000 * WAD);
    h.exchange.buy_tokens(&ALICE, &TOKEN, 1_000 * WAD, u128::MAX, &ALICE).unwrap();
    h.vault.set_exchange_rate(WAD + WAD / 10).unwrap();
    h
}

#[test]
fn test_pending_interest_follows_vault_rate() {
    let h = funded_with_interest();
    assert_eq!(h.exchange.pending_interest(&TOKEN).unwrap(), 100 * WAD);
    assert_eq!(h.exchange.get_interest_payable(&TOKEN).unwrap(), 100 * WAD);

    // Views never write the ledger
    let info = h.exchange.token_exchange_info(&TOKEN).unwrap();
    assert_eq!(info.generated_interest, 0);
}

#[test]
fn test_withdraw_requires_authorization() {
    let h = funded_with_interest();
    assert_eq!(
        h.exchange.withdraw_interest(&BOB, &TOKEN),
        Err(ExchangeError::NotAuthorized { caller: BOB })
    );
    // Not even the owner may withdraw without being assigned
    assert_eq!(
        h.exchange.withdraw_interest(&OWNER, &TOKEN),
        Err(ExchangeError::NotAuthorized { caller: OWNER })
    );
}

#[test]
fn test_withdraw_pays_withdrawer() {
    let h = funded_with_interest();
    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &BOB).unwrap();

    let paid = h.exchange.withdraw_interest(&BOB, &TOKEN).unwrap();
    assert_eq!(paid, 100 * WAD);
    assert_eq!(h.reserve.balance_of(&BOB), 100 * WAD);

    let info = h.exchange.token_exchange_info(&TOKEN).unwrap();
    assert_eq!(info.generated_interest, 100 * WAD);
    assert_eq!(info.withdrawn_interest, 100 * WAD);
    assert_eq!(info.reserve_in_token, 1_000 * WAD);
    assert_eq!(info.interest_shares, 909_090_909_090_909_090_909);
    assert_eq!(h.vault.total_shares(), info.interest_shares);
}

#[test]
fn test_second_withdraw_is_noop() {
    let h = funded_with_interest();
    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &BOB).unwrap();
    h.exchange.withdraw_interest(&BOB, &TOKEN).unwrap();

    let before = h.exchange.token_exchange_info(&TOKEN).unwrap();
    let vault_before = h.reserve.balance_of(&VAULT);

    assert_eq!(h.exchange.withdraw_interest(&BOB, &TOKEN).unwrap(), 0);
    assert_eq!(h.exchange.token_exchange_info(&TOKEN).unwrap(), before);
    assert_eq!(h.reserve.balance_of(&VAULT), vault_before);
}

#[test]
fn test_withdraw_without_interest_is_noop() {
    let h = Harness::new(0);
    h.fund(&ALICE, 1_000 * WAD);
    h.exchange.buy_tokens(&ALICE, &TOKEN, 500 * WAD, u128::MAX, &ALICE).unwrap();
    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &BOB).unwrap();

    let before = h.exchange.token_exchange_info(&TOKEN).unwrap();
    assert_eq!(h.exchange.withdraw_interest(&BOB, &TOKEN).unwrap(), 0);
    assert_eq!(h.exchange.token_exchange_info(&TOKEN).unwrap(), before);
    assert_eq!(h.reserve.balance_of(&BOB), 0);
}

#[test]
fn test_sell_after_withdrawal() {
    let h = funded_with_interest();
    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &BOB).unwrap();
    h.exchange.withdraw_interest(&BOB, &TOKEN).unwrap();

    h.exchange.sell_tokens(&ALICE, &TOKEN, 500 * WAD, 0, &ALICE).unwrap();
    let info = h.exchange.token_exchange_info(&TOKEN).unwrap();
    assert_eq!(info.reserve_in_token, 500 * WAD);
    assert_eq!(info.withdrawn_interest, info.generated_interest);
    assert_eq!(h.exchange.pending_interest(&TOKEN).unwrap(), 0);
}

#[test]
fn test_failed_payout_rolls_back_withdrawal() {
    let h = funded_with_interest();
    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &BOB).unwrap();
    let before = h.exchange.token_exchange_info(&TOKEN).unwrap();
    h.reserve.freeze(&BOB);

    let result = h.exchange.withdraw_interest(&BOB, &TOKEN);
    assert!(matches!(result, Err(ExchangeError::TransferFailed { .. })));
    assert_eq!(h.exchange.token_exchange_info(&TOKEN).unwrap(), before);
    assert_eq!(h.vault.total_shares(), 1_000 * WAD);

    h.reserve.unfreeze(&BOB);
    assert_eq!(h.exchange.withdraw_interest(&BOB, &TOKEN).unwrap(), 100 * WAD);
}

#[test]
fn test_withdrawer_rotation() {
    let h = funded_with_interest();
    assert_eq!(h.exchange.interest_withdrawer(&TOKEN).unwrap(), None);

    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &BOB).unwrap();
    h.exchange.authorize_interest_withdrawer(&BOB, &TOKEN, &CAROL).unwrap();
    assert_eq!(h.exchange.interest_withdrawer(&TOKEN).unwrap(), Some(CAROL));

    // The previous withdrawer lost its rights
    assert_eq!(
        h.exchange.authorize_interest_withdrawer(&BOB, &TOKEN, &BOB),
        Err(ExchangeError::NotAuthorized { caller: BOB })
    );
    assert!(h.exchange.withdraw_interest(&BOB, &TOKEN).is_err());
    assert_eq!(h.exchange.withdraw_interest(&CAROL, &TOKEN).unwrap(), 100 * WAD);

    // The owner can always reassign
    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &ALICE).unwrap();
    assert_eq!(h.exchange.interest_withdrawer(&TOKEN).unwrap(), Some(ALICE));
}

#[test]
fn test_deferred_attribution_leaves_ledger_alone() {
    let h = Harness::with_policy(0, EscrowAttribution::Deferred);
    h.fund(&ALICE, 1_000 * WAD);
    h.exchange.buy_tokens(&ALICE, &TOKEN, 500 * WAD, u128::MAX, &ALICE).unwrap();
    h.vault.set_exchange_rate(2 * WAD).unwrap();

    assert_eq!(h.exchange.token_exchange_info(&TOKEN).unwrap(), TokenExchangeInfo::default());
    assert_eq!(h.exchange.pending_interest(&TOKEN).unwrap(), 0);

    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &BOB).unwrap();
    assert_eq!(h.exchange.withdraw_interest(&BOB, &TOKEN).unwrap(), 0);
}

#[test]
fn test_tokens_sharing_vault_keep_interest_separate() {
    let h = Harness::new(0);
    h.registry.register_token(SECOND_TOKEN, MARKET);
    h.fund(&ALICE, 10_000 * WAD);
    h.fund(&BOB, 10_000 * WAD);
    h.exchange.authorize_interest_withdrawer(&OWNER, &TOKEN, &CAROL).unwrap();
    h.exchange.authorize_interest_withdrawer(&OWNER, &SECOND_TOKEN, &OWNER).unwrap();
    let supply_before_growth = h.reserve.total_supply();

    // Same raw principal, deposited at different rates
    h.exchange.buy_tokens(&ALICE, &TOKEN, 1_000 * WAD, u128::MAX, &ALICE).unwrap();
    h.vault.set_exchange_rate(WAD + WAD / 4).unwrap();
    h.exchange.buy_tokens(&BOB, &SECOND_TOKEN, 1_000 * WAD, u128::MAX, &BOB).unwrap();
    h.vault.set_exchange_rate(WAD + WAD / 2).unwrap();

    let rate = h.vault.exchange_rate();
    for token in [TOKEN, SECOND_TOKEN] {
        let info = h.exchange.token_exchange_info(&token).unwrap();
        let own_growth = value_of_shares(info.interest_shares, rate).unwrap() - info.reserve_in_token;
        assert_eq!(h.exchange.pending_interest(&token).unwrap(), own_growth);
    }
    assert_eq!(h.exchange.pending_interest(&TOKEN).unwrap(), 500 * WAD);
    assert_eq!(h.exchange.pending_interest(&SECOND_TOKEN).unwrap(), 200 * WAD);

    // Exiting one token leaves the other's interest alone
    h.exchange.sell_tokens(&BOB, &SECOND_TOKEN, 1_000 * WAD, 0, &BOB).unwrap();
    assert_eq!(h.exchange.pending_interest(&TOKEN).unwrap(), 500 * WAD);

    let first = h.exchange.withdraw_interest(&CAROL, &TOKEN).unwrap();
    let second = h.exchange.withdraw_interest(&OWNER, &SECOND_TOKEN).unwrap();
    assert_eq!(first, 500 * WAD);
    assert_eq!(h.reserve.balance_of(&CAROL), first);
    assert_eq!(h.reserve.balance_of(&OWNER), second);

    let funded_growth = h.reserve.total_supply() - supply_before_growth;
    assert_eq!(funded_growth, 700 * WAD);
    assert!(first + second <= funded_growth);
}
