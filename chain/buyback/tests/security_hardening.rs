//! Security Hardening Tests
//!
//! Adversarial coverage of the ledger:
//! - Permission escalation on every owner-only entry point
//! - Deposit guard (unsolicited and nested receipts)
//! - Failing payout rails and compensation
//! - Arithmetic overflow at the payout boundary
//! - Fuzz testing (proptest) of the one-swap and rate invariants

use buyback::assets::{
    Collectible, CollectibleReceiver, CurrencyRail, FungibleToken, MemoryCollectible,
    MemoryCurrency, MemoryToken,
};
use buyback::events::BuybackEvent;
use buyback::{AssetError, Buyback, BuybackConfig, BuybackError, SwapKind, SwapState};
use types::ids::{Address, CollectibleId};
use types::numeric::Amount;

fn owner() -> Address {
    Address::repeat_byte(0x01)
}

fn attacker() -> Address {
    Address::repeat_byte(0x66)
}

fn setup_ledger(token_decimals: u8, collectible_rate: Amount) -> Buyback {
    let config = BuybackConfig::new(
        Address::repeat_byte(0x0b),
        owner(),
        Address::repeat_byte(0x70),
        Address::repeat_byte(0x71),
        token_decimals,
    )
    .with_collectible_rate(collectible_rate);
    Buyback::new(config).unwrap()
}

fn funded_currency(ledger: &Buyback, amount: Amount) -> MemoryCurrency {
    let mut currency = MemoryCurrency::new();
    currency.fund(&ledger.address(), amount).unwrap();
    currency
}

/// Currency rail whose outgoing payments always fail
struct FrozenCurrency {
    inner: MemoryCurrency,
}

impl CurrencyRail for FrozenCurrency {
    fn balance_of(&self, holder: &Address) -> Amount {
        self.inner.balance_of(holder)
    }

    fn transfer(
        &mut self,
        from: &Address,
        _to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        Err(AssetError::InsufficientFunds {
            holder: *from,
            required: amount,
            available: 0,
        })
    }
}

/// Collection rail that refuses to move one id
struct StuckCollectible {
    inner: MemoryCollectible,
    stuck: CollectibleId,
}

impl Collectible for StuckCollectible {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn owner_of(&self, id: CollectibleId) -> Option<Address> {
        self.inner.owner_of(id)
    }

    fn tokens_of(&self, owner: &Address) -> Vec<CollectibleId> {
        self.inner.tokens_of(owner)
    }

    fn transfer_from(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        id: CollectibleId,
    ) -> Result<(), AssetError> {
        if id == self.stuck {
            return Err(AssetError::NotApproved {
                id,
                operator: *operator,
            });
        }
        self.inner.transfer_from(operator, from, to, id)
    }

    fn safe_transfer_from(
        &mut self,
        operator: &Address,
        from: &Address,
        to: &Address,
        id: CollectibleId,
        receiver: &dyn CollectibleReceiver,
    ) -> Result<(), AssetError> {
        self.inner.safe_transfer_from(operator, from, to, id, receiver)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Permission Escalation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_every_owner_entry_point_rejects_attacker() {
    let mut ledger = setup_ledger(18, 10_000);
    let mut currency = funded_currency(&ledger, 1_000);
    let mut token = MemoryToken::new(Address::repeat_byte(0x70));
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    token.mint(&ledger.address(), 5).unwrap();
    let id = nft.mint(&ledger.address());

    let a = attacker();
    assert_eq!(ledger.add_to_allowlist(&a, a), Err(BuybackError::Unauthorized));
    assert_eq!(ledger.remove_from_allowlist(&a, &a), Err(BuybackError::Unauthorized));
    assert_eq!(ledger.set_allowlist(&a, &[a]), Err(BuybackError::Unauthorized));
    assert_eq!(ledger.clear_allowlist(&a), Err(BuybackError::Unauthorized));
    assert_eq!(ledger.set_collectible_rate(&a, 1), Err(BuybackError::Unauthorized));
    assert_eq!(ledger.transfer_ownership(&a, a), Err(BuybackError::Unauthorized));
    assert_eq!(
        ledger.withdraw_currency(&mut currency, &a, 1),
        Err(BuybackError::Unauthorized)
    );
    assert_eq!(
        ledger.recover_fungible(&mut token, &a, 5),
        Err(BuybackError::Unauthorized)
    );
    assert_eq!(
        ledger.recover_collectible(&mut nft, &a, id),
        Err(BuybackError::Unauthorized)
    );

    assert!(ledger.events().is_empty(), "rejected calls emit nothing");
    assert_eq!(ledger.owner(), owner());
    assert_eq!(ledger.currency_balance(&currency), 1_000);
}

#[test]
fn test_previous_owner_loses_rights() {
    let mut ledger = setup_ledger(18, 0);
    let new_owner = Address::repeat_byte(0x02);
    ledger.transfer_ownership(&owner(), new_owner).unwrap();

    assert_eq!(
        ledger.set_collectible_rate(&owner(), 1),
        Err(BuybackError::Unauthorized)
    );
    ledger.set_collectible_rate(&new_owner, 5000).unwrap();
    assert_eq!(ledger.fungible_rate(), 1);
}

#[test]
fn test_forwarding_is_open_to_anyone() {
    let mut ledger = setup_ledger(18, 0);
    let mut token = MemoryToken::new(Address::repeat_byte(0x70));
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    token.mint(&ledger.address(), 1).unwrap();

    // Forwarding takes no caller; the sweep only ever pays the fixed destination
    let forwarded = ledger.forward_to_destination(&mut token, &mut nft).unwrap();
    assert_eq!(forwarded.fungible_amount, 1);
    assert_eq!(token.balance_of(&ledger.destination()), 1);
    assert_eq!(token.balance_of(&attacker()), 0);
}

#[test]
fn test_forwarding_rejects_foreign_rails() {
    let mut ledger = setup_ledger(18, 0);
    let mut token = MemoryToken::new(Address::repeat_byte(0x99));
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    token.mint(&ledger.address(), 1).unwrap();

    assert!(matches!(
        ledger.forward_to_destination(&mut token, &mut nft),
        Err(BuybackError::AssetMismatch { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Deposit Guard
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_receipt_hook_closed_outside_swaps() {
    let ledger = setup_ledger(18, 10_000);
    let result = ledger.on_collectible_received(&attacker(), &attacker(), CollectibleId::new(0));
    assert_eq!(result, Err(AssetError::DepositRejected));
}

/// Receiver that accepts anything on behalf of its own identity
struct AcceptAll(Address);

impl CollectibleReceiver for AcceptAll {
    fn address(&self) -> Address {
        self.0
    }

    fn on_collectible_received(
        &self,
        _operator: &Address,
        _from: &Address,
        _id: CollectibleId,
    ) -> Result<(), AssetError> {
        Ok(())
    }
}

#[test]
fn test_foreign_receiver_cannot_deposit_into_ledger() {
    let ledger = setup_ledger(18, 10_000);
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    let stray = nft.mint(&attacker());
    let ledger_address = ledger.address();

    let result = nft.safe_transfer_from(
        &attacker(),
        &attacker(),
        &ledger_address,
        stray,
        &AcceptAll(attacker()),
    );
    assert_eq!(result, Err(AssetError::DepositRejected));
    assert_eq!(nft.owner_of(stray), Some(attacker()));
    assert!(ledger.custody_collectibles(&nft).is_empty());
}

#[test]
fn test_gate_closed_after_failed_swap() {
    let mut ledger = setup_ledger(18, 10_000);
    let inner = funded_currency(&ledger, 1_000_000);
    let mut currency = FrozenCurrency { inner };
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    let user = Address::repeat_byte(0xa1);
    let id = nft.mint(&user);
    nft.approve(&user, &ledger.address(), id).unwrap();
    ledger.add_to_allowlist(&owner(), user).unwrap();

    assert!(ledger
        .swap_collectible_for_currency(&mut nft, &mut currency, &user, id)
        .is_err());

    let stray = nft.mint(&attacker());
    let ledger_address = ledger.address();
    assert_eq!(
        nft.safe_transfer_from(&attacker(), &attacker(), &ledger_address, stray, &ledger),
        Err(AssetError::DepositRejected)
    );
}

// ═══════════════════════════════════════════════════════════════════
// Failing Payout Rails
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_failed_payout_returns_tokens() {
    let mut ledger = setup_ledger(18, 10_000);
    let mut currency = FrozenCurrency {
        inner: funded_currency(&ledger, 1_000_000),
    };
    let mut token = MemoryToken::new(Address::repeat_byte(0x70));
    let user = Address::repeat_byte(0xa1);
    let amount = 10u128.pow(18);
    token.mint(&user, amount).unwrap();
    token.approve(&user, &ledger.address(), amount);
    ledger.add_to_allowlist(&owner(), user).unwrap();

    let result = ledger.swap_fungible_for_currency(&mut token, &mut currency, &user, amount);
    assert!(matches!(
        result,
        Err(BuybackError::Transfer(AssetError::InsufficientFunds { .. }))
    ));
    assert_eq!(token.balance_of(&user), amount);
    assert_eq!(ledger.custody_token_balance(&token), 0);
    assert_eq!(ledger.swap_state_of(&user), SwapState::Unswapped);
    assert!(ledger.events().iter().all(|e| !matches!(
        e,
        buyback::events::BuybackEvent::FungibleSwapped(_)
    )));
}

#[test]
fn test_failed_payout_returns_collectible() {
    let mut ledger = setup_ledger(18, 10_000);
    let mut currency = FrozenCurrency {
        inner: funded_currency(&ledger, 1_000_000),
    };
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    let user = Address::repeat_byte(0xa1);
    let id = nft.mint(&user);
    nft.approve(&user, &ledger.address(), id).unwrap();
    ledger.add_to_allowlist(&owner(), user).unwrap();

    assert!(ledger
        .swap_collectible_for_currency(&mut nft, &mut currency, &user, id)
        .is_err());
    assert_eq!(nft.owner_of(id), Some(user));
    assert!(ledger.custody_collectibles(&nft).is_empty());
    assert_eq!(ledger.swap_state_of(&user), SwapState::Unswapped);
}

#[test]
fn test_empty_reserve_rejects_swap() {
    let mut ledger = setup_ledger(18, 10_000);
    let mut currency = MemoryCurrency::new();
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    let user = Address::repeat_byte(0xa1);
    let id = nft.mint(&user);
    nft.approve(&user, &ledger.address(), id).unwrap();
    ledger.add_to_allowlist(&owner(), user).unwrap();

    assert_eq!(
        ledger.swap_collectible_for_currency(&mut nft, &mut currency, &user, id),
        Err(BuybackError::InsufficientBalance {
            asset: "currency".to_string(),
            required: 10_000,
            available: 0,
        })
    );
    assert_eq!(nft.owner_of(id), Some(user));
}

#[test]
fn test_interrupted_forwarding_reports_what_moved() {
    let mut ledger = setup_ledger(18, 0);
    let mut token = MemoryToken::new(Address::repeat_byte(0x70));
    let mut inner = MemoryCollectible::new(Address::repeat_byte(0x71));
    let first = inner.mint(&ledger.address());
    let second = inner.mint(&ledger.address());
    let mut nft = StuckCollectible {
        inner,
        stuck: second,
    };
    token.mint(&ledger.address(), 500).unwrap();
    let destination = ledger.destination();

    let (forwarded, error) = match ledger.forward_to_destination(&mut token, &mut nft) {
        Err(BuybackError::ForwardingInterrupted { forwarded, error }) => (forwarded, error),
        other => panic!("expected interrupted forwarding, got {other:?}"),
    };
    assert_eq!(forwarded.collectible_ids, vec![first]);
    assert_eq!(forwarded.fungible_amount, 0);
    assert!(matches!(error, AssetError::NotApproved { id, .. } if id == second));

    // Tokens wait for every collectible, so none left custody
    assert_eq!(token.balance_of(&destination), 0);
    assert_eq!(ledger.custody_token_balance(&token), 500);
    assert_eq!(nft.owner_of(first), Some(destination));
    assert_eq!(nft.owner_of(second), Some(ledger.address()));

    let Some(BuybackEvent::ForwardedToDestination(event)) = ledger.events().last() else {
        panic!("partial forwarding must be recorded");
    };
    assert_eq!(event.collectible_ids, vec![first]);
    assert_eq!(event.fungible_amount, 0);
}

#[test]
fn test_forwarding_checks_destination_credit_first() {
    let mut ledger = setup_ledger(18, 0);
    let mut token = MemoryToken::new(Address::repeat_byte(0x70));
    let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
    let id = nft.mint(&ledger.address());
    token.mint(&ledger.destination(), u128::MAX).unwrap();
    token.mint(&ledger.address(), 1).unwrap();

    assert_eq!(
        ledger.forward_to_destination(&mut token, &mut nft),
        Err(BuybackError::Transfer(AssetError::Overflow))
    );
    assert_eq!(nft.owner_of(id), Some(ledger.address()));
    assert_eq!(ledger.custody_token_balance(&token), 1);
    assert!(ledger.events().is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Arithmetic Overflow
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_large_product_does_not_overflow() {
    // amount * rate exceeds 128 bits, the quotient does not
    let mut ledger = setup_ledger(38, 5000 * 10u128.pow(20));
    let mut currency = funded_currency(&ledger, u128::MAX);
    let mut token = MemoryToken::new(Address::repeat_byte(0x70));
    let user = Address::repeat_byte(0xa1);
    let amount = 10u128.pow(38);
    token.mint(&user, amount).unwrap();
    token.approve(&user, &ledger.address(), amount);
    ledger.add_to_allowlist(&owner(), user).unwrap();

    let receipt = ledger
        .swap_fungible_for_currency(&mut token, &mut currency, &user, amount)
        .unwrap();
    assert_eq!(receipt.payout, 10u128.pow(20));
}

#[test]
fn test_payout_overflow_rejected() {
    let mut ledger = setup_ledger(0, u128::MAX);
    let mut currency = funded_currency(&ledger, u128::MAX);
    let mut token = MemoryToken::new(Address::repeat_byte(0x70));
    let user = Address::repeat_byte(0xa1);
    token.mint(&user, u128::MAX).unwrap();
    token.approve(&user, &ledger.address(), u128::MAX);
    ledger.add_to_allowlist(&owner(), user).unwrap();

    assert_eq!(
        ledger.swap_fungible_for_currency(&mut token, &mut currency, &user, u128::MAX),
        Err(BuybackError::Overflow)
    );
    assert_eq!(token.balance_of(&user), u128::MAX);
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Tests
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Attempt {
        Tokens(Amount),
        Collectible,
    }

    fn attempt() -> impl Strategy<Value = Attempt> {
        prop_oneof![
            (0u128..=1_000_000u128).prop_map(Attempt::Tokens),
            Just(Attempt::Collectible),
        ]
    }

    proptest! {
        /// Invariant: any sequence of attempts yields at most one successful swap,
        /// the recorded state matches the kind that succeeded, and every later
        /// attempt fails the swap limit whatever amount it offers.
        #[test]
        fn fuzz_at_most_one_swap(attempts in prop::collection::vec(attempt(), 1..12)) {
            let mut ledger = setup_ledger(0, 5000);
            let mut currency = funded_currency(&ledger, 1_000_000_000);
            let mut token = MemoryToken::new(Address::repeat_byte(0x70));
            let mut nft = MemoryCollectible::new(Address::repeat_byte(0x71));
            let user = Address::repeat_byte(0xa1);
            let spender = ledger.address();
            token.mint(&user, 1_000_000_000).unwrap();
            token.approve(&user, &spender, 1_000_000_000);
            ledger.add_to_allowlist(&owner(), user).unwrap();

            let mut successes = Vec::new();
            for attempt in &attempts {
                let (kind, result) = match attempt {
                    Attempt::Tokens(amount) => (
                        SwapKind::Fungible,
                        ledger.swap_fungible_for_currency(
                            &mut token,
                            &mut currency,
                            &user,
                            *amount,
                        ),
                    ),
                    Attempt::Collectible => {
                        let id = nft.mint(&user);
                        nft.approve(&user, &spender, id).unwrap();
                        let result = ledger.swap_collectible_for_currency(
                            &mut nft,
                            &mut currency,
                            &user,
                            id,
                        );
                        (SwapKind::Collectible, result)
                    }
                };
                match (successes.first().copied(), result) {
                    (None, Ok(receipt)) => successes.push(receipt.kind()),
                    (None, Err(err)) => prop_assert_eq!(err, BuybackError::InvalidAmount),
                    (Some(previous), result) => {
                        let expected = if previous == kind {
                            BuybackError::LimitExceeded { kind }
                        } else {
                            BuybackError::AlreadySwappedOther { previous }
                        };
                        prop_assert_eq!(result.map(|r| r.kind()), Err(expected));
                    }
                }
            }

            // Only zero-amount attempts can fail before the first swap
            let all_zero = attempts
                .iter()
                .all(|attempt| matches!(attempt, Attempt::Tokens(0)));
            if all_zero {
                prop_assert!(successes.is_empty());
                prop_assert_eq!(ledger.swap_state_of(&user), SwapState::Unswapped);
                return Ok(());
            }
            prop_assert_eq!(successes.len(), 1);
            let expected = match successes[0] {
                SwapKind::Fungible => SwapState::SwappedFungible,
                SwapKind::Collectible => SwapState::SwappedCollectible,
            };
            prop_assert_eq!(ledger.swap_state_of(&user), expected);
            prop_assert_eq!(ledger.completed_swaps(), 1);
        }

        /// Invariant: the fungible rate is always the collectible rate over 5000.
        #[test]
        fn fuzz_rate_derivation(rates in prop::collection::vec(any::<u128>(), 1..8)) {
            let mut ledger = setup_ledger(18, 0);
            for rate in &rates {
                ledger.set_collectible_rate(&owner(), *rate).unwrap();
                prop_assert_eq!(ledger.fungible_rate(), *rate / 5000);
                prop_assert_eq!(ledger.collectible_rate(), *rate);
            }
        }

        /// Invariant: a withdrawal moves exactly the amount or nothing at all.
        #[test]
        fn fuzz_withdrawal_conservation(
            funded in 0u128..=1_000_000u128,
            amount in 0u128..=2_000_000u128,
        ) {
            let mut ledger = setup_ledger(18, 0);
            let mut currency = funded_currency(&ledger, funded);

            let result = ledger.withdraw_currency(&mut currency, &owner(), amount);
            if amount <= funded {
                prop_assert!(result.is_ok());
                prop_assert_eq!(currency.balance_of(&owner()), amount);
                prop_assert_eq!(ledger.currency_balance(&currency), funded - amount);
            } else {
                let is_insufficient =
                    matches!(result, Err(BuybackError::InsufficientBalance { .. }));
                prop_assert!(is_insufficient);
                prop_assert_eq!(ledger.currency_balance(&currency), funded);
            }
        }

        /// Invariant: non-members never swap, whatever they offer.
        #[test]
        fn fuzz_non_member_rejected(amount in 1u128..=u64::MAX as u128) {
            let mut ledger = setup_ledger(0, 5000);
            let mut currency = funded_currency(&ledger, u128::MAX);
            let mut token = MemoryToken::new(Address::repeat_byte(0x70));
            let spender = ledger.address();
            token.mint(&attacker(), amount).unwrap();
            token.approve(&attacker(), &spender, amount);

            let result =
                ledger.swap_fungible_for_currency(&mut token, &mut currency, &attacker(), amount);
            prop_assert_eq!(result, Err(BuybackError::NotAllowlisted { participant: attacker() }));
            prop_assert_eq!(token.balance_of(&attacker()), amount);
        }
    }
}
