use std::{fmt::Display, str::FromStr, sync::OnceLock};

use bps_common::Cfa;
use chrono::{DateTime, Duration, Utc};
use log::error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Mobile-money subscriber numbers are 8 digits and must carry one of the national mobile prefixes.
const PHONE_PATTERN: &str = r"^(90|91|92|93|96|97|98|99)\d{6}$";

/// The provider tag recorded on ledger rows created by the synchronous ticker-claim pathway, which settles
/// immediately and never touches the mobile-money aggregator.
pub const TICKER_CLAIM_PROVIDER: &str = "ticker_claim";

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------       UserId        ---------------------------------------------------------
/// A lightweight wrapper around the marketplace's user identifier (an opaque string assigned by the auth
/// provider).
#[derive(Clone, Debug, Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       Network       ---------------------------------------------------------
/// The mobile-money networks the payment aggregator can charge against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    TMoney,
    Flooz,
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::TMoney => write!(f, "tmoney"),
            Network::Flooz => write!(f, "flooz"),
        }
    }
}

impl FromStr for Network {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tmoney" => Ok(Self::TMoney),
            "flooz" => Ok(Self::Flooz),
            s => Err(ConversionError(format!("Unknown mobile money network: {s}"))),
        }
    }
}

//--------------------------------------     PhoneNumber     ---------------------------------------------------------
/// A validated local mobile-money subscriber number. Construction fails unless the value matches the
/// national numbering pattern, so a `PhoneNumber` held anywhere in the system is known to be well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PhoneNumber {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"));
        if re.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ConversionError(format!("{s} is not a valid mobile money number")))
        }
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------      TxStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TxStatus {
    /// The transaction has been created and no settlement has been received yet.
    Pending,
    /// The payment settled successfully and the promotional effect has been (or is being) applied.
    Success,
    /// The gateway rejected or failed the charge.
    Failed,
    /// The payment window lapsed before any settlement arrived.
    Expired,
}

impl TxStatus {
    /// Terminal statuses are never mutated again. This is the ledger's idempotency boundary.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

impl Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "Pending"),
            TxStatus::Success => write!(f, "Success"),
            TxStatus::Failed => write!(f, "Failed"),
            TxStatus::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for TxStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

impl From<String> for TxStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid transaction status: {value}. But this conversion cannot fail. Defaulting to Pending");
            TxStatus::Pending
        })
    }
}

//--------------------------------------       Package       ---------------------------------------------------------
/// A purchasable promotion tier. The catalog is immutable at runtime; rows are only ever read.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub price: Cfa,
    /// `0` means this package is the unique ticker slot; any other value is a timed boost in days.
    pub duration_days: i64,
    pub active: bool,
}

impl Package {
    pub fn is_ticker(&self) -> bool {
        self.duration_days == 0
    }

    pub fn boost_window(&self) -> Option<Duration> {
        (self.duration_days > 0).then(|| Duration::days(self.duration_days))
    }
}

//--------------------------------------    NewTransaction   ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub listing_id: i64,
    pub user_id: UserId,
    pub package_id: i64,
    pub amount: Cfa,
    /// The network being charged, or [`TICKER_CLAIM_PROVIDER`] for synchronous claims.
    pub provider: String,
    pub phone_number: Option<PhoneNumber>,
    /// Fixed at creation. The sole authority on staleness for this transaction.
    pub expires_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(listing_id: i64, user_id: UserId, package: &Package, network: Network, phone: PhoneNumber, window: Duration) -> Self {
        Self {
            listing_id,
            user_id,
            package_id: package.id,
            amount: package.price,
            provider: network.to_string(),
            phone_number: Some(phone),
            expires_at: Utc::now() + window,
        }
    }

    /// A ledger row for the synchronous ticker-claim pathway. It is born settled, so the expiry window is
    /// moot; it is set to the creation instant.
    pub fn for_ticker_claim(listing_id: i64, user_id: UserId, package: &Package) -> Self {
        Self {
            listing_id,
            user_id,
            package_id: package.id,
            amount: package.price,
            provider: TICKER_CLAIM_PROVIDER.to_string(),
            phone_number: None,
            expires_at: Utc::now(),
        }
    }
}

//--------------------------------------     Transaction     ---------------------------------------------------------
/// A row in the payment ledger. Created `Pending`; transitions to exactly one terminal state and is never
/// mutated after that.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub listing_id: i64,
    pub user_id: UserId,
    pub package_id: i64,
    pub amount: Cfa,
    pub provider: String,
    pub phone_number: Option<PhoneNumber>,
    pub status: TxStatus,
    /// Set once the gateway acknowledges the charge. Settlement callbacks are matched on this value.
    pub gateway_reference: Option<String>,
    pub error_message: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

//--------------------------------------    ListingStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
    Closed,
}

impl Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Pending => write!(f, "Pending"),
            ListingStatus::Approved => write!(f, "Approved"),
            ListingStatus::Rejected => write!(f, "Rejected"),
            ListingStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for ListingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            "Closed" => Ok(Self::Closed),
            s => Err(ConversionError(format!("Invalid listing status: {s}"))),
        }
    }
}

impl From<String> for ListingStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid listing status: {value}. But this conversion cannot fail. Defaulting to Pending");
            ListingStatus::Pending
        })
    }
}

//--------------------------------------       Listing       ---------------------------------------------------------
/// The boost-relevant subset of a classified-ad listing. The promotion fields (`is_premium`,
/// `premium_until`) are only ever written by the settlement processor, the expiry sweep, or an admin
/// override — never directly by the seller.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub seller_id: UserId,
    pub title: String,
    pub status: ListingStatus,
    pub is_premium: bool,
    pub premium_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      TickerSlot     ---------------------------------------------------------
/// The singleton "king of the hill" slot. Exactly one row exists; reassignment is a full overwrite of all
/// three fields. There is no history table — the previous occupant is only observable at the instant of
/// reassignment.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TickerSlot {
    pub current_listing_id: Option<i64>,
    pub owner_id: Option<UserId>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl TickerSlot {
    pub fn is_held(&self) -> bool {
        self.current_listing_id.is_some()
    }
}

//--------------------------------------     Notification    ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub kind: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An ordinary authenticated marketplace user.
    User,
    /// May read any transaction or listing, but not mutate anything.
    ReadAll,
    /// May force-expire boosts and trigger sweeps.
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::ReadAll => write!(f, "read_all"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "read_all" => Ok(Self::ReadAll),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

pub type Roles = Vec<Role>;
