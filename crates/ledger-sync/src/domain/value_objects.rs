//! # Domain Value Objects
//!
//! Immutable value types for the ledger sync layer.

use serde::{Deserialize, Serialize};
use shared_types::{TokenAmount, TxHash, U256};
use uuid::Uuid;

use super::errors::LedgerError;

/// How a transfer affected the queried account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Minted to the account (`from` is the zero address).
    Earned,
    /// Sent by the account.
    Spent,
    /// Received from another account.
    Received,
}

/// Lifecycle of a `TransactionRecord`.
///
/// ```text
/// Pending --(confirmed log with same txHash)--> Completed
/// Pending --(broadcast rejected)--------------> Failed
/// ```
///
/// There is no timeout edge. A transport failure after the wallet took the
/// request is not a rejection: the record stays `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Submitted locally, not yet observed in a log.
    Pending,
    /// Derived from a confirmed log.
    Completed,
    /// The wallet or chain rejected the broadcast.
    Failed,
}

/// Lifecycle of an `NftRecord`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NftStatus {
    /// Mint broadcast, token id not yet known.
    Unconfirmed,
    /// Observed in a Transfer log.
    Confirmed,
}

/// Identity of a confirmed log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    /// Transaction that emitted the log.
    pub tx_hash: TxHash,
    /// Position of the log within its block.
    pub log_index: u64,
}

/// Record identity: local until reconciled, then the confirmed event key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RecordId {
    /// Generated client-side for an optimistic entry.
    Local(Uuid),
    /// `(txHash, logIndex)` of a confirmed log.
    Event(EventKey),
}

impl RecordId {
    /// Fresh local id.
    pub fn local() -> Self {
        RecordId::Local(Uuid::new_v4())
    }

    /// The local uuid, if this is an optimistic id.
    pub fn as_local(&self) -> Option<Uuid> {
        match self {
            RecordId::Local(id) => Some(*id),
            RecordId::Event(_) => None,
        }
    }
}

/// Bounded recent-block window for log queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryWindow {
    /// Number of most recent blocks to scan, including the latest.
    pub blocks: u64,
}

impl HistoryWindow {
    /// A window of `blocks` blocks.
    pub fn new(blocks: u64) -> Self {
        Self { blocks }
    }

    /// Inclusive `(from, to)` block range ending at `latest`.
    pub fn bounds(&self, latest: u64) -> (u64, u64) {
        let span = self.blocks.max(1);
        (latest.saturating_sub(span - 1), latest)
    }
}

/// Where an NFT image can be fetched from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "uri", rename_all = "lowercase")]
pub enum ImageRef {
    /// Stored remotely (e.g. `ipfs://...`).
    Remote(String),
    /// No remote store configured; explicit placeholder image.
    Placeholder(String),
}

impl ImageRef {
    /// URI to embed in token metadata.
    pub fn uri(&self) -> &str {
        match self {
            ImageRef::Remote(uri) | ImageRef::Placeholder(uri) => uri,
        }
    }

    /// True for the placeholder fallback.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ImageRef::Placeholder(_))
    }
}

/// An image selected by the user for an achievement mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Creates an image file.
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Achievement-token metadata, serialized as the token URI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Image URI; filled in by the mint flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NftMetadata {
    /// Metadata with a name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: None,
        }
    }
}

/// Authoritative donation identifier an achievement is minted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonationId(pub U256);

impl From<u64> for DonationId {
    fn from(id: u64) -> Self {
        Self(U256::from(id))
    }
}

/// Raw oracle answer. Deliberately uninterpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote(pub U256);

/// Balances for the session account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Native currency balance.
    pub native: TokenAmount,
    /// Reward token balance.
    pub token: TokenAmount,
}

/// Successful broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    /// Hash returned by the wallet.
    pub tx_hash: TxHash,
    /// Optimistic cache entry created for this write, if any.
    pub record_id: Option<RecordId>,
}

/// Uniform result of every write action.
pub type WriteResult = Result<WriteReceipt, LedgerError>;

/// Flat `{ok, txHash} | {ok: false, error}` shape handed to the UI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReport {
    /// Whether the broadcast succeeded.
    pub ok: bool,
    /// Transaction hash on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    /// Human-readable message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error tag on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl From<&WriteResult> for WriteReport {
    fn from(result: &WriteResult) -> Self {
        match result {
            Ok(receipt) => Self {
                ok: true,
                tx_hash: Some(receipt.tx_hash),
                error: None,
                error_kind: None,
            },
            Err(err) => Self {
                ok: false,
                tx_hash: None,
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
            },
        }
    }
}
