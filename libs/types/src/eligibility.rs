//! Eligibility rows, item id ordering keys and snapshot entries

use crate::errors::ValidationError;
use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// One (wallet, item) pair from the eligibility pool
///
/// Field names match the pool service's JSON rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EligibilityRow {
    pub wallet_address: String,
    pub item_id: String,
}

impl EligibilityRow {
    pub fn new(wallet_address: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            item_id: item_id.into(),
        }
    }

    /// Wallet in the canonical form used for ordering and dedup (trimmed, lowercase)
    pub fn canonical_wallet(&self) -> String {
        self.wallet_address.trim().to_ascii_lowercase()
    }

    pub fn item_key(&self) -> ItemKey {
        ItemKey::parse(&self.item_id)
    }
}

/// Ordering key for an item id
///
/// Integers compare numerically and always sort before ids that failed to parse,
/// which compare lexically. The derived `Ord` relies on that variant order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKey {
    Numeric(U256),
    Raw(String),
}

impl ItemKey {
    /// Parse a decimal or 0x-prefixed hex item id
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
            Some(_) => None,
            None if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) => {
                U256::from_dec_str(trimmed).ok()
            }
            None => None,
        };

        match parsed {
            Some(value) => ItemKey::Numeric(value),
            None => ItemKey::Raw(trimmed.to_string()),
        }
    }

    /// Map the item id into the ledger identifier space
    ///
    /// Ids at or above `offset` are already encoded and pass through unchanged, so the
    /// offset is never applied twice.
    pub fn encode(&self, offset: U256) -> Result<U256, ValidationError> {
        match self {
            ItemKey::Numeric(value) if *value >= offset => Ok(*value),
            ItemKey::Numeric(value) => {
                value
                    .checked_add(offset)
                    .ok_or_else(|| ValidationError::ItemIdOverflow {
                        item_id: value.to_string(),
                        offset: offset.to_string(),
                    })
            }
            ItemKey::Raw(raw) => Err(ValidationError::NonNumericItemId { input: raw.clone() }),
        }
    }
}

/// One ordered, encoded entry of a submitted snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub owner: String,
    pub item_id: U256,
}

impl SnapshotEntry {
    /// Reject owners the ledger could not decode as an address
    pub fn new(owner: impl Into<String>, item_id: U256) -> Result<Self, ValidationError> {
        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(ValidationError::EmptyWallet);
        }
        if let Err(e) = owner.parse::<Address>() {
            return Err(ValidationError::InvalidWallet {
                input: owner,
                reason: e.to_string(),
            });
        }
        Ok(Self { owner, item_id })
    }
}
