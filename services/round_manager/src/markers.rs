//! Durable per-round markers
//!
//! Keys written to the [`StateStore`]; none are ever deleted:
//!
//! | key                      | value        | meaning                                 |
//! |--------------------------|--------------|-----------------------------------------|
//! | `frozen:<round>`         | `"true"`     | freeze decided, no further freeze tries |
//! | `snapshot_tx:<round>`    | tx reference | snapshot confirmed on the ledger        |
//! | `draw_requested:<round>` | `"true"`     | draw request sent for the round         |
//! | `first_round_created`    | `"true"`     | at least one round has been created     |

use crate::error::Result;
use crate::traits::StateStore;
use std::sync::Arc;
use types::{RoundNumber, TxReference};

const TRUE: &str = "true";
const FIRST_ROUND_KEY: &str = "first_round_created";

pub fn frozen_key(round: RoundNumber) -> String {
    format!("frozen:{}", round)
}

pub fn snapshot_tx_key(round: RoundNumber) -> String {
    format!("snapshot_tx:{}", round)
}

pub fn draw_requested_key(round: RoundNumber) -> String {
    format!("draw_requested:{}", round)
}

#[derive(Clone)]
pub struct RoundMarkers {
    store: Arc<dyn StateStore>,
}

impl RoundMarkers {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn is_frozen(&self, round: RoundNumber) -> Result<bool> {
        self.flag(&frozen_key(round)).await
    }

    pub async fn mark_frozen(&self, round: RoundNumber) -> Result<()> {
        self.store.set(&frozen_key(round), TRUE).await
    }

    pub async fn snapshot_tx(&self, round: RoundNumber) -> Result<Option<TxReference>> {
        Ok(self
            .store
            .get(&snapshot_tx_key(round))
            .await?
            .filter(|tx| !tx.is_empty())
            .map(TxReference::from))
    }

    /// Persist a confirmed submission
    ///
    /// The tx reference is written before the frozen flag: a crash in between still
    /// leaves the idempotency key in place.
    pub async fn record_snapshot(&self, round: RoundNumber, tx: &TxReference) -> Result<()> {
        self.store.set(&snapshot_tx_key(round), tx.as_str()).await?;
        self.mark_frozen(round).await
    }

    pub async fn draw_requested(&self, round: RoundNumber) -> Result<bool> {
        self.flag(&draw_requested_key(round)).await
    }

    pub async fn mark_draw_requested(&self, round: RoundNumber) -> Result<()> {
        self.store.set(&draw_requested_key(round), TRUE).await
    }

    pub async fn first_round_created(&self) -> Result<bool> {
        self.flag(FIRST_ROUND_KEY).await
    }

    pub async fn mark_first_round_created(&self) -> Result<()> {
        self.store.set(FIRST_ROUND_KEY, TRUE).await
    }

    async fn flag(&self, key: &str) -> Result<bool> {
        Ok(self.store.get(key).await?.as_deref() == Some(TRUE))
    }
}
