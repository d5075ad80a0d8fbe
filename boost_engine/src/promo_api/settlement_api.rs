//! `SettlementApi` is the high-level API for every mutating promotion flow.
//!
//! It owns the business rules — who may buy what, what a settlement callback is allowed to do, and in which
//! order the ledger and the promotional state are written — and delegates all storage to a
//! [`PromoGatewayDatabase`] backend. The cardinal ordering rule lives here: the ledger row reaches its
//! terminal status **before** any promotional side effect is attempted, and a side effect that fails never
//! un-settles a captured payment.
use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{Listing, ListingStatus, Network, NewTransaction, PhoneNumber, Transaction, TxStatus, UserId},
    events::{EventProducers, ListingBoostedEvent, TickerDethronedEvent},
    traits::{
        CatalogManagement,
        PromoGatewayDatabase,
        PromoGatewayError,
        SettlementEffect,
        SettlementOutcome,
        SettlementStatus,
        SweepResult,
    },
};

pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: std::fmt::Debug> std::fmt::Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.db)
    }
}

impl<B> SettlementApi<B>
where B: PromoGatewayDatabase + CatalogManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Opens a boost purchase: validates the package and the listing, then writes a `Pending` ledger row
    /// whose payment window starts now.
    ///
    /// The caller (the payment-initiation endpoint) is responsible for dispatching the actual charge to the
    /// aggregator afterwards and recording the outcome via [`Self::record_gateway_ack`] or
    /// [`Self::reject_charge`].
    pub async fn initiate_boost(
        &self,
        listing_id: i64,
        user: &UserId,
        package_id: i64,
        network: Network,
        phone: PhoneNumber,
        payment_window: Duration,
    ) -> Result<Transaction, PromoGatewayError> {
        let package = self
            .db
            .fetch_package(package_id)
            .await?
            .ok_or(PromoGatewayError::PackageNotFound(package_id))?;
        if !package.active {
            return Err(PromoGatewayError::PackageInactive(package_id));
        }
        if package.is_ticker() {
            return Err(PromoGatewayError::UnsupportedAction(
                "the ticker slot is claimed directly, not bought through the payment flow".to_string(),
            ));
        }
        self.approved_listing_owned_by(listing_id, user).await?;
        let tx = NewTransaction::new(listing_id, user.clone(), &package, network, phone, payment_window);
        let tx = self.db.create_pending_transaction(tx).await?;
        info!(
            "💰️ Boost purchase opened. Transaction #{} ({} for listing #{listing_id}, package '{}', via {})",
            tx.id, tx.amount, package.name, tx.provider
        );
        Ok(tx)
    }

    /// Records the aggregator's reference for a charge it accepted. Settlement callbacks will be matched on
    /// this reference.
    pub async fn record_gateway_ack(&self, tx_id: i64, reference: &str) -> Result<Transaction, PromoGatewayError> {
        let tx = self.db.attach_gateway_reference(tx_id, reference).await?;
        debug!("💰️ Gateway accepted the charge for transaction #{tx_id}. Reference: {reference}");
        Ok(tx)
    }

    /// Fails a freshly opened transaction after the aggregator rejected the charge synchronously. No row is
    /// left `Pending` behind a rejection.
    pub async fn reject_charge(&self, tx_id: i64, reason: &str) -> Result<Transaction, PromoGatewayError> {
        let tx = self.db.fail_pending_transaction(tx_id, reason).await?;
        info!("💰️ Transaction #{tx_id} failed at charge time: {reason}");
        Ok(tx)
    }

    /// Processes one settlement callback. This is the webhook's whole contract:
    ///
    /// 1. An unknown reference is an error ([`PromoGatewayError::TransactionNotFound`]).
    /// 2. A callback for a row that is already terminal is a duplicate delivery: nothing changes and the
    ///    outcome says so.
    /// 3. A callback arriving after the payment window is rejected, and the row is expired on the spot —
    ///    late money is never honoured ([`PromoGatewayError::TransactionExpired`]).
    /// 4. A `pending` verdict is a progress ping; the row stays open.
    /// 5. Otherwise the row is finalized (conditionally, so racing deliveries collapse into one winner),
    ///    and only a *newly applied* `Success` goes on to grant the promotional effect.
    ///
    /// A side effect that fails after the status write is reported as [`SettlementEffect::EffectFailed`]
    /// on an `Ok` outcome: the payment is captured and stays captured.
    pub async fn process_settlement(
        &self,
        reference: &str,
        verdict: SettlementStatus,
        error_message: Option<&str>,
    ) -> Result<SettlementOutcome, PromoGatewayError> {
        let tx = self
            .db
            .fetch_transaction_by_reference(reference)
            .await?
            .ok_or_else(|| PromoGatewayError::TransactionNotFound(reference.to_string()))?;
        if tx.status.is_terminal() {
            debug!("💰️ Duplicate settlement delivery for transaction #{} ({reference}). Ignoring", tx.id);
            return Ok(SettlementOutcome { transaction: tx, effect: SettlementEffect::None, duplicate: true });
        }
        let now = Utc::now();
        if tx.is_expired_at(now) {
            return match self.db.expire_transaction(tx.id).await? {
                Some(expired) => {
                    info!(
                        "💰️ Settlement for transaction #{} arrived {}s past its payment window. Rejected",
                        expired.id,
                        (now - expired.expires_at).num_seconds()
                    );
                    Err(PromoGatewayError::TransactionExpired(expired.id))
                },
                // Lost a race against the sweeper or another delivery; either way the row is terminal now.
                None => Err(PromoGatewayError::TransactionExpired(tx.id)),
            };
        }
        let (status, message) = match verdict {
            SettlementStatus::Pending => {
                debug!("💰️ Progress notification for transaction #{} ({reference}). Row stays open", tx.id);
                return Ok(SettlementOutcome { transaction: tx, effect: SettlementEffect::None, duplicate: false });
            },
            SettlementStatus::Success => (TxStatus::Success, None),
            SettlementStatus::Failed => (TxStatus::Failed, error_message.or(Some("Charge failed"))),
        };
        let result = self.db.finalize_transaction(reference, status, message).await?;
        if !result.applied {
            debug!(
                "💰️ Settlement for transaction #{} lost the finalization race; already {}",
                result.transaction.id, result.transaction.status
            );
            return Ok(SettlementOutcome {
                transaction: result.transaction,
                effect: SettlementEffect::None,
                duplicate: true,
            });
        }
        let tx = result.transaction;
        info!("💰️ Transaction #{} settled as {} ({reference})", tx.id, tx.status);
        let effect = if tx.status == TxStatus::Success {
            // The payment is captured. From here on, failures are reported, never rolled back.
            match self.grant_promotion(&tx).await {
                Ok(effect) => effect,
                Err(e) => {
                    error!(
                        "💰️ Transaction #{} is settled but its promotional effect could not be applied: {e}. Manual \
                         reconciliation required",
                        tx.id
                    );
                    SettlementEffect::EffectFailed(e.to_string())
                },
            }
        } else {
            SettlementEffect::None
        };
        Ok(SettlementOutcome { transaction: tx, effect, duplicate: false })
    }

    /// Claims the ticker slot for an approved listing the caller owns.
    ///
    /// The claim settles synchronously: a ledger row is written already settled (there is no aggregator in
    /// this pathway), then the slot is overwritten and the previous occupant — if someone else held it —
    /// is notified on a best-effort basis.
    pub async fn claim_ticker(&self, listing_id: i64, user: &UserId) -> Result<SettlementOutcome, PromoGatewayError> {
        let package = self.db.fetch_ticker_package().await?.ok_or(PromoGatewayError::NoTickerPackage)?;
        self.approved_listing_owned_by(listing_id, user).await?;
        let tx = self.db.create_settled_claim(NewTransaction::for_ticker_claim(listing_id, user.clone(), &package)).await?;
        info!("💰️ Ticker claim settled. Transaction #{} ({} by {user} for listing #{listing_id})", tx.id, tx.amount);
        let effect = match self.assign_ticker_slot(listing_id, user).await {
            Ok(effect) => effect,
            Err(e) => {
                error!(
                    "💰️ Ticker claim #{} is settled but the slot could not be reassigned: {e}. Manual reconciliation \
                     required",
                    tx.id
                );
                SettlementEffect::EffectFailed(e.to_string())
            },
        };
        Ok(SettlementOutcome { transaction: tx, effect, duplicate: false })
    }

    /// One pass of the expiry sweep: demote every listing whose boost window has lapsed, and reconcile
    /// abandoned `Pending` ledger rows to `Expired`. Safe to run at any cadence and concurrently with
    /// settlements; each underlying statement is a conditional batch update.
    pub async fn expire_promotions(&self) -> Result<SweepResult, PromoGatewayError> {
        let now = Utc::now();
        let demoted = self.db.expire_overdue_boosts(now).await?;
        let reconciled = self.db.expire_overdue_transactions(now).await?;
        if !demoted.is_empty() {
            info!("💰️ Sweep demoted {} listing(s) whose boost lapsed", demoted.len());
        }
        if !reconciled.is_empty() {
            info!("💰️ Sweep reconciled {} abandoned pending transaction(s)", reconciled.len());
        }
        Ok(SweepResult { demoted, reconciled })
    }

    /// Admin override: strip a listing's premium status immediately, leaving an audit trail. The ledger is
    /// untouched.
    pub async fn force_expire(
        &self,
        listing_id: i64,
        operator: &UserId,
        reason: &str,
    ) -> Result<Listing, PromoGatewayError> {
        self.db.fetch_listing(listing_id).await?.ok_or(PromoGatewayError::ListingNotFound(listing_id))?;
        self.db.force_expire_boost(listing_id, operator, reason).await
    }

    /// Grants whatever the settled transaction paid for: a timed boost, or the ticker slot.
    async fn grant_promotion(&self, tx: &Transaction) -> Result<SettlementEffect, PromoGatewayError> {
        let package = self
            .db
            .fetch_package(tx.package_id)
            .await?
            .ok_or(PromoGatewayError::PackageNotFound(tx.package_id))?;
        match package.boost_window() {
            Some(window) => {
                let until = Utc::now() + window;
                let listing = self.db.apply_boost(tx.listing_id, until).await?;
                debug!("💰️ Listing #{} boosted until {until} ({})", listing.id, package.name);
                self.call_listing_boosted_hook(&listing, tx).await;
                Ok(SettlementEffect::Boosted(listing))
            },
            None => self.assign_ticker_slot(tx.listing_id, &tx.user_id).await,
        }
    }

    async fn assign_ticker_slot(&self, listing_id: i64, owner: &UserId) -> Result<SettlementEffect, PromoGatewayError> {
        let (slot, previous) = self.db.reassign_ticker(listing_id, owner, Utc::now()).await?;
        let dethroned = previous.owner_id.filter(|prev| prev != owner);
        if let Some(prev_owner) = &dethroned {
            let body = match previous.current_listing_id {
                Some(l) => format!("Your listing #{l} has lost the ticker slot."),
                None => "You have lost the ticker slot.".to_string(),
            };
            // Best effort. The reassignment stands even if the previous occupant cannot be told about it.
            if let Err(e) = self.db.record_notification(prev_owner, "ticker_dethroned", &body).await {
                warn!("💰️ Could not record the dethrone notification for {prev_owner}: {e}");
            }
            info!("💰️ {prev_owner} has been dethroned from the ticker slot by {owner}");
            self.call_ticker_dethroned_hook(TickerDethronedEvent {
                previous_owner: prev_owner.clone(),
                previous_listing_id: previous.current_listing_id,
                slot: slot.clone(),
            })
            .await;
        }
        Ok(SettlementEffect::TickerReassigned { slot, dethroned })
    }

    async fn call_listing_boosted_hook(&self, listing: &Listing, tx: &Transaction) {
        trace!("💰️ Notifying listing-boosted hooks");
        for producer in &self.producers.listing_boosted_producer {
            let event = ListingBoostedEvent::new(listing.clone(), tx.clone());
            producer.publish_event(event).await;
        }
    }

    async fn call_ticker_dethroned_hook(&self, event: TickerDethronedEvent) {
        trace!("💰️ Notifying ticker-dethroned hooks");
        for producer in &self.producers.ticker_dethroned_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    async fn approved_listing_owned_by(&self, listing_id: i64, user: &UserId) -> Result<Listing, PromoGatewayError> {
        let listing = self.db.fetch_listing(listing_id).await?.ok_or(PromoGatewayError::ListingNotFound(listing_id))?;
        if &listing.seller_id != user {
            return Err(PromoGatewayError::NotListingOwner { listing_id, user_id: user.clone() });
        }
        if listing.status != ListingStatus::Approved {
            return Err(PromoGatewayError::ListingNotApproved(listing_id));
        }
        Ok(listing)
    }
}
