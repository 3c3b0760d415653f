//! # Raffle Round Types
//!
//! Shared vocabulary for the round lifecycle services.
//!
//! ## Design Philosophy
//!
//! - **Ledger owns rounds**: [`Round`] is a read model of the ledger's view; services never
//!   mutate it locally, they only request create / submit / draw operations
//! - **Large-integer item ids**: item ids travel as strings from the pool service and are
//!   compared and encoded as 256-bit integers ([`U256`])
//! - **Deterministic ordering**: [`ItemKey`] gives every item id (even malformed ones) a
//!   place in one total order, so snapshot builds are reproducible
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{EligibilityRow, ItemKey};
//!
//! let row = EligibilityRow::new("0xabc", "42");
//! assert_eq!(row.item_key(), ItemKey::parse("42"));
//! ```

pub mod eligibility;
pub mod errors;
pub mod round;

pub use eligibility::{EligibilityRow, ItemKey, SnapshotEntry};
pub use errors::ValidationError;
pub use ethers_core::types::U256;
pub use round::{Round, RoundNumber, TxReference, NO_ROUND, ZERO_ADDRESS};
