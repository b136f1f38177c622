//! Batch settlement against `MemoryStore`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use openledger_settlement::SettlementCoordinator;
use openledger_store::{MemoryStore, RecordStoreExt, keys};
use openledger_types::{
    Amount, Asset, AssetId, BalanceDomain, BalanceRecord, Campaign, CampaignId, CampaignStatus,
    Doc, LedgerConfig, TokenId, TokenType, TransactionRecord, TxContext, TxId, TxStatus, TxType,
    WalletId,
};

// =============================================================================
// Fixtures
// =============================================================================

fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

fn ctx(id: &str) -> TxContext {
    TxContext::at(id, t0() + Duration::hours(1))
}

fn coordinator(store: &Arc<MemoryStore>) -> SettlementCoordinator<MemoryStore> {
    SettlementCoordinator::new(Arc::clone(store), LedgerConfig::default())
}

async fn seed_balance(
    store: &MemoryStore,
    domain: BalanceDomain,
    wallet: &str,
    token: &str,
    amount: u64,
) {
    let rec = BalanceRecord::zero(domain, WalletId::new(wallet), TokenId::new(token), t0())
        .with_balance(Amount::from_base_units(amount));
    store.insert(&rec).await.unwrap();
}

async fn balance(
    store: &MemoryStore,
    domain: BalanceDomain,
    wallet: &str,
    token: &str,
) -> Option<u64> {
    let key = keys::balance(&WalletId::new(wallet), &TokenId::new(token));
    store
        .find::<BalanceRecord>(domain.doc(), &key)
        .await
        .unwrap()
        .map(|rec| rec.balances.to_string().parse().unwrap())
}

async fn spot(store: &MemoryStore, wallet: &str, token: &str) -> Option<u64> {
    balance(store, BalanceDomain::Spot, wallet, token).await
}

async fn submit(store: &MemoryStore, tx: TransactionRecord) -> TxId {
    store.insert(&tx).await.unwrap();
    tx.id
}

async fn status(store: &MemoryStore, id: &TxId) -> TxStatus {
    store
        .load::<TransactionRecord>(Doc::Transactions, id.as_str())
        .await
        .unwrap()
        .status
}

async fn seed_token(store: &MemoryStore, id: &str, total: u64, max: Option<u64>) {
    let token = TokenType::new(
        id,
        Amount::from_base_units(total),
        max.map(Amount::from_base_units),
    );
    store.insert(&token).await.unwrap();
}

async fn token_supply(store: &MemoryStore, id: &str) -> Amount {
    store
        .load::<TokenType>(Doc::Tokens, id)
        .await
        .unwrap()
        .total_supply
}

// =============================================================================
// Two-wallet transfers
// =============================================================================

#[tokio::test]
async fn transfer_moves_balance_and_confirms() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 1000).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_transfer("alice", "bob", "USDT", 100),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv-1"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&id));
    assert_eq!(report.balances_written, 2);
    assert_eq!(spot(&store, "alice", "USDT").await, Some(900));
    assert_eq!(spot(&store, "bob", "USDT").await, Some(100));
    assert_eq!(status(&store, &id).await, TxStatus::Confirmed);
}

#[tokio::test]
async fn transfer_of_exact_balance_is_sufficient() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 100).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_transfer("alice", "bob", "USDT", 100),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&id));
    assert_eq!(spot(&store, "alice", "USDT").await, Some(0));
}

#[tokio::test]
async fn insufficient_balance_rejects_without_touching_balances() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 50).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_transfer("alice", "bob", "USDT", 100),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_300"));
    assert_eq!(spot(&store, "alice", "USDT").await, Some(50));
    assert_eq!(spot(&store, "bob", "USDT").await, None);
    assert_eq!(status(&store, &id).await, TxStatus::Rejected);
}

#[tokio::test]
async fn debit_without_balance_record_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let id = submit(
        &store,
        TransactionRecord::dummy_transfer("ghost", "bob", "USDT", 1),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_201"));
    assert_eq!(report.balances_written, 0);
}

#[tokio::test]
async fn reserve_wallet_cannot_take_part_in_transfer() {
    let store = Arc::new(MemoryStore::new());
    let reserve = WalletId::system();
    seed_balance(&store, BalanceDomain::Spot, reserve.as_str(), "USDT", 1000).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_transfer(reserve.as_str(), "bob", "USDT", 10),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_102"));
    assert_eq!(spot(&store, reserve.as_str(), "USDT").await, Some(1000));
}

#[tokio::test]
async fn one_failure_does_not_abort_siblings() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 100).await;
    let bad = submit(
        &store,
        TransactionRecord::dummy_transfer("carol", "bob", "USDT", 10),
    )
    .await;
    let good = submit(
        &store,
        TransactionRecord::dummy_transfer("alice", "bob", "USDT", 40),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[bad.clone(), good.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&bad).is_some());
    assert!(report.is_confirmed(&good));
    assert_eq!(spot(&store, "bob", "USDT").await, Some(40));
}

#[tokio::test]
async fn shared_cache_chains_transfers_within_one_batch() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 100).await;
    // bob has no record yet: the second transfer spends the first's credit.
    let first = submit(
        &store,
        TransactionRecord::dummy_transfer("alice", "bob", "USDT", 100),
    )
    .await;
    let second = submit(
        &store,
        TransactionRecord::dummy_transfer("bob", "carol", "USDT", 60),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[first.clone(), second.clone()])
        .await
        .unwrap();

    assert_eq!(report.confirmed, vec![first, second]);
    assert_eq!(spot(&store, "alice", "USDT").await, Some(0));
    assert_eq!(spot(&store, "bob", "USDT").await, Some(40));
    assert_eq!(spot(&store, "carol", "USDT").await, Some(60));
}

fn swap(from: &str, to: &str, pay: (&str, u64), receive: (&str, u64)) -> TransactionRecord {
    let mut tx = TransactionRecord::dummy_transfer(from, to, pay.0, pay.1)
        .with_to_leg(TokenId::new(receive.0), Amount::from_base_units(receive.1));
    tx.tx_type = TxType::Swap;
    tx
}

#[tokio::test]
async fn swap_credits_the_other_token() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 500).await;
    let id = submit(&store, swap("alice", "pool", ("USDT", 300), ("USDC", 300))).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&id));
    assert_eq!(spot(&store, "alice", "USDT").await, Some(200));
    assert_eq!(spot(&store, "pool", "USDC").await, Some(300));
}

#[tokio::test]
async fn swap_that_creates_value_is_rolled_back() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 500).await;
    let id = submit(&store, swap("alice", "pool", ("USDT", 300), ("USDC", 301))).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_308"));
    assert_eq!(spot(&store, "alice", "USDT").await, Some(500));
    assert_eq!(spot(&store, "pool", "USDC").await, None);
}

#[tokio::test]
async fn transfer_with_mismatched_legs_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 500).await;
    let tx = TransactionRecord::dummy_transfer("alice", "bob", "USDT", 300)
        .with_to_leg(TokenId::new("USDT"), Amount::from_base_units(301));
    let id = submit(&store, tx).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_100"));
    assert_eq!(spot(&store, "alice", "USDT").await, Some(500));
}

// =============================================================================
// Mint / burn
// =============================================================================

#[tokio::test]
async fn mint_over_max_supply_is_rejected_and_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    seed_token(&store, "AT", 1000, Some(1400)).await;
    let id = submit(&store, TransactionRecord::dummy_mint("alice", "AT", 500)).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_302"));
    assert_eq!(spot(&store, "alice", "AT").await, None);
    assert_eq!(
        token_supply(&store, "AT").await,
        Amount::from_base_units(1000)
    );
    assert_eq!(status(&store, &id).await, TxStatus::Rejected);
}

#[tokio::test]
async fn mint_within_cap_grows_supply_and_credits() {
    let store = Arc::new(MemoryStore::new());
    seed_token(&store, "AT", 1000, Some(1400)).await;
    let id = submit(&store, TransactionRecord::dummy_mint("alice", "AT", 400)).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&id));
    assert_eq!(spot(&store, "alice", "AT").await, Some(400));
    assert_eq!(
        token_supply(&store, "AT").await,
        Amount::from_base_units(1400)
    );
}

#[tokio::test]
async fn mint_from_a_user_wallet_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    seed_token(&store, "AT", 0, None).await;
    let mut tx = TransactionRecord::dummy_mint("alice", "AT", 5);
    tx.from_wallet = WalletId::new("mallory");
    let id = submit(&store, tx).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_102"));
    assert_eq!(token_supply(&store, "AT").await, Amount::ZERO);
}

#[tokio::test]
async fn burn_shrinks_supply_and_debits() {
    let store = Arc::new(MemoryStore::new());
    seed_token(&store, "AT", 1000, None).await;
    seed_balance(&store, BalanceDomain::Spot, "alice", "AT", 300).await;
    let id = submit(&store, TransactionRecord::dummy_burn("alice", "AT", 300)).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&id));
    assert_eq!(spot(&store, "alice", "AT").await, Some(0));
    assert_eq!(
        token_supply(&store, "AT").await,
        Amount::from_base_units(700)
    );
}

#[tokio::test]
async fn burn_beyond_balance_leaves_supply_untouched() {
    let store = Arc::new(MemoryStore::new());
    seed_token(&store, "AT", 1000, None).await;
    seed_balance(&store, BalanceDomain::Spot, "alice", "AT", 10).await;
    let id = submit(&store, TransactionRecord::dummy_burn("alice", "AT", 11)).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).is_some());
    assert_eq!(
        token_supply(&store, "AT").await,
        Amount::from_base_units(1000)
    );
    assert_eq!(spot(&store, "alice", "AT").await, Some(10));
}

// =============================================================================
// Exchange groups
// =============================================================================

#[tokio::test]
async fn exchange_settles_both_legs_together() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 1000).await;
    seed_balance(&store, BalanceDomain::Spot, "bob", "AT", 10).await;
    let pay = submit(
        &store,
        TransactionRecord::dummy_exchange_leg("x-1", "alice", "bob", "USDT", 500),
    )
    .await;
    let deliver = submit(
        &store,
        TransactionRecord::dummy_exchange_leg("x-1", "bob", "alice", "AT", 5),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[pay.clone(), deliver.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&pay));
    assert!(report.is_confirmed(&deliver));
    // The second id was settled as part of the first id's group.
    assert_eq!(report.skipped, vec![deliver.clone()]);
    assert_eq!(spot(&store, "alice", "USDT").await, Some(500));
    assert_eq!(spot(&store, "bob", "USDT").await, Some(500));
    assert_eq!(spot(&store, "alice", "AT").await, Some(5));
    assert_eq!(spot(&store, "bob", "AT").await, Some(5));
    assert_eq!(status(&store, &deliver).await, TxStatus::Confirmed);
}

#[tokio::test]
async fn failing_exchange_leg_rolls_back_the_whole_group() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 1000).await;
    seed_balance(&store, BalanceDomain::Spot, "bob", "AT", 1).await;
    let pay = submit(
        &store,
        TransactionRecord::dummy_exchange_leg("x-2", "alice", "bob", "USDT", 500),
    )
    .await;
    let deliver = submit(
        &store,
        TransactionRecord::dummy_exchange_leg("x-2", "bob", "alice", "AT", 5),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[pay.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&pay).is_some());
    assert!(report.rejection(&deliver).is_some());
    assert_eq!(spot(&store, "alice", "USDT").await, Some(1000));
    assert_eq!(spot(&store, "bob", "USDT").await, None);
    assert_eq!(spot(&store, "bob", "AT").await, Some(1));
    assert_eq!(status(&store, &deliver).await, TxStatus::Rejected);
}

#[tokio::test]
async fn single_exchange_leg_is_incomplete() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 1000).await;
    let lonely = submit(
        &store,
        TransactionRecord::dummy_exchange_leg("x-3", "alice", "bob", "USDT", 1),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[lonely.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&lonely).unwrap().contains("OL_ERR_105"));
    assert_eq!(spot(&store, "alice", "USDT").await, Some(1000));
}

// =============================================================================
// Domains and campaigns
// =============================================================================

#[tokio::test]
async fn cross_domain_transfer_moves_between_ledgers() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 100).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_cross_domain(
            "alice",
            "USDT",
            60,
            BalanceDomain::Spot,
            BalanceDomain::Campaign,
        ),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&id));
    assert_eq!(spot(&store, "alice", "USDT").await, Some(40));
    assert_eq!(
        balance(&store, BalanceDomain::Campaign, "alice", "USDT").await,
        Some(60)
    );
}

#[tokio::test]
async fn cross_domain_within_one_domain_is_invalid() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 100).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_cross_domain(
            "alice",
            "USDT",
            60,
            BalanceDomain::Spot,
            BalanceDomain::Spot,
        ),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_100"));
}

async fn seed_campaign(store: &MemoryStore, asset_remaining: u64) {
    let campaign = Campaign {
        id: CampaignId::new("camp-1"),
        asset_id: AssetId::new("asset-1"),
        asset_token_id: TokenId::new("AT"),
        stable_token_id: TokenId::new("USDT"),
        asset_token_amount: Amount::ZERO,
        remaining_asset_token: Amount::ZERO,
        stable_token_amount: Amount::ZERO,
        rate: 2,
        status: CampaignStatus::New,
        updated_at: t0(),
    };
    store.insert(&campaign).await.unwrap();
    let asset = Asset {
        id: AssetId::new("asset-1"),
        token_id: TokenId::new("AT"),
        remaining_token: Amount::from_base_units(asset_remaining),
        updated_at: t0(),
    };
    store.insert(&asset).await.unwrap();
}

#[tokio::test]
async fn campaign_deposit_opens_campaign_and_draws_down_asset() {
    let store = Arc::new(MemoryStore::new());
    seed_campaign(&store, 1000).await;
    seed_balance(&store, BalanceDomain::Spot, "issuer", "AT", 1000).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_deposit("issuer", "camp-1", "AT", 400),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.is_confirmed(&id));
    let campaign: Campaign = store.load(Doc::Campaigns, "camp-1").await.unwrap();
    assert_eq!(campaign.status, CampaignStatus::Open);
    assert_eq!(campaign.remaining_asset_token, Amount::from_base_units(400));
    assert_eq!(campaign.asset_token_amount, Amount::from_base_units(400));
    let asset: Asset = store.load(Doc::Assets, "asset-1").await.unwrap();
    assert_eq!(asset.remaining_token, Amount::from_base_units(600));
    assert_eq!(spot(&store, "issuer", "AT").await, Some(600));
}

#[tokio::test]
async fn campaign_deposit_beyond_asset_supply_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    seed_campaign(&store, 100).await;
    seed_balance(&store, BalanceDomain::Spot, "issuer", "AT", 1000).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_deposit("issuer", "camp-1", "AT", 400),
    )
    .await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_303"));
    let campaign: Campaign = store.load(Doc::Campaigns, "camp-1").await.unwrap();
    assert_eq!(campaign.status, CampaignStatus::New);
    assert!(campaign.remaining_asset_token.is_zero());
    assert_eq!(spot(&store, "issuer", "AT").await, Some(1000));
}

#[tokio::test]
async fn campaign_deposit_rolls_back_when_asset_write_fails() {
    let store = Arc::new(MemoryStore::new());
    seed_campaign(&store, 1000).await;
    seed_balance(&store, BalanceDomain::Spot, "issuer", "AT", 1000).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_deposit("issuer", "camp-1", "AT", 400),
    )
    .await;
    store.fail_writes(Doc::Assets).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("OL_ERR_400"));
    let campaign: Campaign = store.load(Doc::Campaigns, "camp-1").await.unwrap();
    assert_eq!(campaign.status, CampaignStatus::New);
    assert!(campaign.asset_token_amount.is_zero());
    assert_eq!(spot(&store, "issuer", "AT").await, Some(1000));
}

#[tokio::test]
async fn unsupported_kinds_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let mut tx = TransactionRecord::dummy_transfer("alice", "bob", "NFT", 1);
    tx.tx_type = TxType::TransferNft;
    let id = submit(&store, tx).await;

    let report = coordinator(&store)
        .settle(&ctx("inv"), &[id.clone()])
        .await
        .unwrap();

    assert!(report.rejection(&id).unwrap().contains("TRANSFER_NFT"));
}

// =============================================================================
// Idempotence, listing, persistence
// =============================================================================

#[tokio::test]
async fn resettling_terminal_ids_is_a_noop() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 1000).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_transfer("alice", "bob", "USDT", 100),
    )
    .await;
    let missing = TxId::new("tx-missing");
    let coord = coordinator(&store);

    coord.settle(&ctx("inv-1"), &[id.clone()]).await.unwrap();
    let writes = store.write_count();
    let again = coord
        .settle(&ctx("inv-2"), &[id.clone(), missing.clone()])
        .await
        .unwrap();

    assert!(again.confirmed.is_empty());
    assert_eq!(again.skipped, vec![id.clone(), missing]);
    assert_eq!(store.write_count(), writes);
    assert_eq!(spot(&store, "alice", "USDT").await, Some(900));
}

#[tokio::test]
async fn pending_listing_is_ordered_bounded_and_groups_exchanges() {
    let store = Arc::new(MemoryStore::new());
    let mut expected = Vec::new();
    for i in 0..12 {
        let mut tx = TransactionRecord::dummy_transfer("alice", "bob", "USDT", 1);
        tx.created_at = t0() + Duration::seconds(100 - i);
        expected.push((tx.created_at, tx.id.clone()));
        submit(&store, tx).await;
    }
    for created in [0, 1] {
        let mut leg = TransactionRecord::dummy_exchange_leg("x-9", "alice", "bob", "USDT", 1);
        leg.created_at = t0() + Duration::seconds(created);
        if created == 0 {
            expected.push((leg.created_at, leg.id.clone()));
        }
        submit(&store, leg).await;
    }
    let mut done = TransactionRecord::dummy_transfer("alice", "bob", "USDT", 1);
    done.status = TxStatus::Confirmed;
    done.created_at = t0() - Duration::seconds(1);
    submit(&store, done).await;

    expected.sort();
    let expected: Vec<TxId> = expected.into_iter().map(|(_, id)| id).take(10).collect();

    let ids = coordinator(&store).pending_transaction_ids().await.unwrap();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn status_write_failure_is_returned() {
    let store = Arc::new(MemoryStore::new());
    seed_balance(&store, BalanceDomain::Spot, "alice", "USDT", 1000).await;
    let id = submit(
        &store,
        TransactionRecord::dummy_transfer("alice", "bob", "USDT", 100),
    )
    .await;
    store.fail_writes(Doc::Transactions).await;

    let err = coordinator(&store)
        .settle(&ctx("inv"), &[id])
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("OL_ERR_400"), "{err}");
    // Balances are only flushed after statuses.
    assert_eq!(spot(&store, "alice", "USDT").await, Some(1000));
}

#[tokio::test]
async fn random_transfers_conserve_total_supply() {
    let store = Arc::new(MemoryStore::new());
    let wallets = ["w0", "w1", "w2", "w3", "w4"];
    for w in wallets {
        seed_balance(&store, BalanceDomain::Spot, w, "USDT", 10_000).await;
    }
    let mut rng = rand::thread_rng();
    let mut ids = Vec::new();
    for _ in 0..200 {
        let from = wallets[rng.gen_range(0..wallets.len())];
        let to = wallets[rng.gen_range(0..wallets.len())];
        if from == to {
            continue;
        }
        let amount = rng.gen_range(1..5_000);
        let tx = TransactionRecord::dummy_transfer(from, to, "USDT", amount);
        ids.push(submit(&store, tx).await);
    }

    let report = coordinator(&store).settle(&ctx("inv"), &ids).await.unwrap();
    assert_eq!(report.confirmed.len() + report.rejected.len(), ids.len());

    let mut total = 0;
    for w in wallets {
        total += spot(&store, w, "USDT").await.unwrap();
    }
    assert_eq!(total, 50_000);
}
