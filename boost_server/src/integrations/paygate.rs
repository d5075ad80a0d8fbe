//! The mobile-money aggregator client.
//!
//! Boost purchases dispatch a charge request to the aggregator's REST API; the buyer then approves the
//! debit on their handset and the aggregator reports the outcome asynchronously via the settlement
//! webhook. The [`MobileMoneyGateway`] trait is the seam the routes depend on, so endpoint tests can swap
//! in a mock without any HTTP.
use std::sync::Arc;

use bps_common::Cfa;
use boost_engine::db_types::{Network, PhoneNumber};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PayGateConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the payment gateway: {0}")]
    Unreachable(String),
    #[error("Could not deserialize the gateway response: {0}")]
    JsonError(String),
    #[error("The gateway rejected the charge. Error {status}. {message}")]
    ChargeRejected { status: u16, message: String },
}

/// The charge dispatched to the aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    /// Our transaction id, echoed back in support queries.
    pub identifier: i64,
    pub amount: Cfa,
    pub network: Network,
    pub phone_number: PhoneNumber,
    pub description: String,
}

/// The aggregator's synchronous acknowledgement of a charge request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeAck {
    /// The aggregator's reference for this charge. Settlement callbacks quote it.
    #[serde(rename = "tx_reference")]
    pub reference: String,
}

#[allow(async_fn_in_trait)]
pub trait MobileMoneyGateway {
    /// Asks the aggregator to debit the subscriber. A successful return only means the charge was queued;
    /// the verdict arrives later on the settlement webhook.
    async fn request_charge(&self, charge: ChargeRequest) -> Result<ChargeAck, GatewayError>;
}

#[derive(Clone)]
pub struct PayGateClient {
    base_url: String,
    client: Arc<Client>,
}

impl PayGateClient {
    pub fn new(config: &PayGateConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        headers.insert("X-PayGate-Api-Key", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { base_url: config.base_url.clone(), client: Arc::new(client) })
    }
}

impl MobileMoneyGateway for PayGateClient {
    async fn request_charge(&self, charge: ChargeRequest) -> Result<ChargeAck, GatewayError> {
        let url = format!("{}/pay", self.base_url);
        debug!("📡️ Dispatching charge for transaction #{} ({}) to {url}", charge.identifier, charge.amount);
        let response =
            self.client.post(url).json(&charge).send().await.map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            let ack = response.json::<ChargeAck>().await.map_err(|e| GatewayError::JsonError(e.to_string()))?;
            debug!("📡️ Charge for transaction #{} queued. Reference: {}", charge.identifier, ack.reference);
            Ok(ack)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayError::Unreachable(e.to_string()))?;
            warn!("📡️ Charge for transaction #{} rejected. {status}: {message}", charge.identifier);
            Err(GatewayError::ChargeRejected { status, message })
        }
    }
}
