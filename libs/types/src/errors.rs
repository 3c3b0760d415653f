//! Validation errors for round and eligibility values

use thiserror::Error;

/// Errors raised when a value cannot be represented in the ledger's terms
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Item id is not a decimal or 0x-prefixed hex integer
    #[error("Item id '{input}' is not an integer")]
    NonNumericItemId { input: String },

    /// Encoding the item id would overflow 256 bits
    #[error("Item id {item_id} overflows when offset by {offset}")]
    ItemIdOverflow { item_id: String, offset: String },

    /// Wallet address is empty
    #[error("Wallet address cannot be empty")]
    EmptyWallet,

    /// Wallet is not a 20-byte hex address the ledger can accept
    #[error("Wallet address '{input}' is invalid: {reason}")]
    InvalidWallet { input: String, reason: String },
}
