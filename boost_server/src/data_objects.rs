use std::fmt::Display;

use boost_engine::{
    db_types::{Network, PhoneNumber, TxStatus},
    SettlementStatus,
};
use bps_common::Cfa;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The body of a boost purchase request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitRequest {
    pub listing_id: i64,
    pub package_id: i64,
    pub network: Network,
    pub phone_number: PhoneNumber,
}

/// What the buyer's client gets back after the charge has been dispatched. The promotion is not granted
/// yet; the client polls `GET /api/transaction/{id}` until the settlement arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitResponse {
    pub success: bool,
    pub transaction_id: i64,
    /// The aggregator's reference for the charge. Settlement callbacks will quote it.
    #[serde(rename = "tx_reference")]
    pub reference: String,
    pub amount: Cfa,
    pub status: TxStatus,
    /// When the payment window closes. Settlements after this are rejected.
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// The body of a settlement callback from the aggregator. Unknown fields (amount, phone, network) are
/// ignored; the ledger row is the authority on all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementNotification {
    #[serde(rename = "tx_reference")]
    pub reference: String,
    pub status: SettlementStatus,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerClaimRequest {
    pub listing_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceExpireRequest {
    pub listing_id: i64,
    pub reason: String,
}
