//! Idempotent batch purchases of campaign asset tokens.
//!
//! ```text
//! buy_batch(requests)
//!   hash = sha256(json(requests))
//!   PurchaseCache[hash] exists  -> return stored payload
//!   decision phase (sequential) -> one PurchaseResult per request
//!   flush: campaigns, then balances || investor books (bounded pools)
//!   PurchaseCache[hash] = payload
//! ```
//!
//! A rejected request never aborts the batch; it shows up as `Rejected`
//! in the payload. A write failure during the flush aborts the call and
//! nothing is cached, so the same batch can be retried.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use openledger_settlement::BalanceCache;
use openledger_store::{LedgerStore, RecordStoreExt, keys};
use openledger_types::{
    Amount, BalanceDomain, Campaign, CampaignId, CampaignStatus, Doc, InvestorBook, LedgerConfig,
    LedgerError, LedgerResult, PurchaseCacheRecord, PurchaseRequest, PurchaseResult, TxContext,
    TxStatus, content_hash,
};

use crate::task_group::TaskGroup;

/// Buyers pay from their campaign-domain balance.
const PAYMENT_DOMAIN: BalanceDomain = BalanceDomain::Campaign;

/// Sells campaign asset tokens against stable-token balances.
pub struct PurchaseEngine<S: ?Sized> {
    store: Arc<S>,
    config: LedgerConfig,
}

impl<S> PurchaseEngine<S>
where
    S: LedgerStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Process `requests` at most once.
    ///
    /// Returns the JSON array of [`PurchaseResult`]s. Calling again with an
    /// identical batch returns the stored payload byte for byte and
    /// changes nothing.
    pub async fn buy_batch(
        &self,
        cx: &TxContext,
        requests: &[PurchaseRequest],
    ) -> LedgerResult<String> {
        if requests.is_empty() {
            return Err(LedgerError::EmptyInput("purchase batch".into()));
        }
        let hash = content_hash(requests)?;
        if let Some(cached) = self
            .store
            .find::<PurchaseCacheRecord>(Doc::PurchaseCache, &hash)
            .await?
        {
            info!(%hash, requests = requests.len(), "Purchase batch replayed from cache");
            return Ok(cached.result);
        }

        let mut batch = PurchaseBatch::new(Arc::clone(&self.store), cx);
        let mut results = Vec::with_capacity(requests.len());
        for req in requests {
            let result = match batch.apply(req).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(
                        request_id = %req.request_id,
                        campaign = %req.campaign_id,
                        wallet = %req.wallet_id,
                        error = %err,
                        "Purchase rejected"
                    );
                    PurchaseResult::rejected(req, err.to_string())
                }
            };
            results.push(result);
        }
        let payload = serde_json::to_string(&results)?;

        batch.flush(self.config.worker_count).await?;

        self.store
            .insert(&PurchaseCacheRecord {
                hash: hash.clone(),
                result: payload.clone(),
                created_at: cx.timestamp,
            })
            .await?;
        info!(
            %hash,
            requests = requests.len(),
            confirmed = results
                .iter()
                .filter(|r| r.status == TxStatus::Confirmed)
                .count(),
            "Purchase batch processed"
        );
        Ok(payload)
    }
}

/// An investor book and whether it must be created at flush.
#[derive(Debug, Clone)]
struct BookEntry {
    book: InvestorBook,
    is_new: bool,
}

/// Decision-phase state of one batch. Only ever touched sequentially.
///
/// Campaigns and investor books enter their maps only once a request
/// against them is confirmed, so the flush writes exactly what changed.
struct PurchaseBatch<S: ?Sized> {
    store: Arc<S>,
    cx: TxContext,
    campaigns: BTreeMap<CampaignId, Campaign>,
    balances: BalanceCache<S>,
    books: BTreeMap<String, BookEntry>,
}

impl<S> PurchaseBatch<S>
where
    S: LedgerStore + ?Sized + 'static,
{
    fn new(store: Arc<S>, cx: &TxContext) -> Self {
        Self {
            balances: BalanceCache::new(Arc::clone(&store), cx.timestamp),
            store,
            cx: cx.clone(),
            campaigns: BTreeMap::new(),
            books: BTreeMap::new(),
        }
    }

    /// Decide one request. Everything that can fail is checked before the
    /// balance debit, the first mutation, so an error leaves the batch
    /// state untouched.
    async fn apply(&mut self, req: &PurchaseRequest) -> LedgerResult<PurchaseResult> {
        if req.units.is_zero() {
            return Err(LedgerError::InvalidAmount {
                reason: format!("request {} buys zero units", req.request_id),
            });
        }
        let mut campaign = self.campaign(&req.campaign_id).await?;
        if campaign.status == CampaignStatus::Closed || campaign.is_sold_out() {
            return Err(LedgerError::CampaignSoldOut(campaign.id.to_string()));
        }
        if req.token_id != campaign.stable_token_id {
            return Err(LedgerError::MixedTokens {
                expected: campaign.stable_token_id.clone(),
                found: req.token_id.clone(),
            });
        }

        let units = req.units.min(campaign.remaining_asset_token);
        let cost = units
            .checked_mul_u64(campaign.rate)
            .ok_or(LedgerError::AmountOverflow)?;
        campaign.remaining_asset_token = campaign
            .remaining_asset_token
            .checked_sub(units)
            .ok_or(LedgerError::AmountOverflow)?;
        campaign.stable_token_amount = campaign.stable_token_amount.try_add(cost)?;
        campaign.updated_at = self.cx.timestamp;

        let book_key = keys::investor_book(&req.campaign_id, &req.wallet_id);
        let mut entry = self.book(&book_key, req).await?;
        entry.book.asset_token_amount = entry.book.asset_token_amount.try_add(units)?;
        entry.book.stable_token_amount = entry.book.stable_token_amount.try_add(cost)?;
        entry.book.updated_at = self.cx.timestamp;

        self.balances
            .sub_amount(PAYMENT_DOMAIN, &req.wallet_id, &req.token_id, cost)
            .await?;

        self.books.insert(book_key, entry);
        self.campaigns.insert(campaign.id.clone(), campaign);
        Ok(PurchaseResult::confirmed(req, units, cost))
    }

    async fn campaign(&self, id: &CampaignId) -> LedgerResult<Campaign> {
        match self.campaigns.get(id) {
            Some(campaign) => Ok(campaign.clone()),
            None => self.store.load(Doc::Campaigns, id.as_str()).await,
        }
    }

    async fn book(&self, key: &str, req: &PurchaseRequest) -> LedgerResult<BookEntry> {
        if let Some(entry) = self.books.get(key) {
            return Ok(entry.clone());
        }
        let entry = match self
            .store
            .find::<InvestorBook>(Doc::InvestorBooks, key)
            .await?
        {
            Some(book) => BookEntry {
                book,
                is_new: false,
            },
            None => BookEntry {
                book: InvestorBook {
                    id: self.cx.derive_id(Doc::InvestorBooks, key),
                    campaign_id: req.campaign_id.clone(),
                    wallet_id: req.wallet_id.clone(),
                    asset_token_amount: Amount::ZERO,
                    stable_token_amount: Amount::ZERO,
                    created_at: self.cx.timestamp,
                    updated_at: self.cx.timestamp,
                },
                is_new: true,
            },
        };
        Ok(entry)
    }

    /// Persist the decision phase: campaigns one by one, then balances and
    /// investor books on two bounded pools running side by side. The pools
    /// share a first-error latch; whichever fails first is returned and the
    /// other pool's running writes are detached, not cancelled.
    async fn flush(self, workers: usize) -> LedgerResult<()> {
        let Self {
            store,
            campaigns,
            balances,
            books,
            ..
        } = self;

        for campaign in campaigns.values() {
            store.save(campaign).await?;
        }

        let mut balance_pool = TaskGroup::new("balances", workers);
        for entry in balances.into_entries() {
            let store = Arc::clone(&store);
            balance_pool.spawn(async move { entry.write(store.as_ref()).await });
        }

        let mut book_pool = balance_pool.sibling("investor-books", workers);
        for entry in books.into_values() {
            let store = Arc::clone(&store);
            book_pool.spawn(async move {
                if entry.is_new {
                    store.insert(&entry.book).await
                } else {
                    store.save(&entry.book).await
                }
            });
        }

        let (balances_written, books_written) =
            tokio::try_join!(balance_pool.wait(), book_pool.wait())?;
        info!(
            campaigns = campaigns.len(),
            balances = balances_written,
            investor_books = books_written,
            "Purchase batch flushed"
        );
        Ok(())
    }
}
