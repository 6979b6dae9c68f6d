// src/trades.rs
//! STOCK Act trade disclosures, served from an injected read-only lookup.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const BUILTIN_TRADES: &str = include_str!("../data/stock_act_trades.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub transaction_date: String,
    pub ticker: String,
    pub asset_description: String,
    pub transaction_type: String,
    pub amount_range: String,
}

/// Filer name → disclosed trades. Implementations are read-only.
pub trait TradeLookup: Send + Sync {
    fn trades_for(&self, filer: &str) -> Option<Vec<Trade>>;
}

/// In-memory table keyed by upper-cased filer name.
#[derive(Debug, Clone, Default)]
pub struct StaticTradeBook {
    by_filer: HashMap<String, Vec<Trade>>,
}

fn filer_key(filer: &str) -> String {
    filer.trim().to_uppercase()
}

impl StaticTradeBook {
    pub fn from_json(s: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<Trade>> =
            serde_json::from_str(s).context("parsing trade book json")?;
        let by_filer = raw
            .into_iter()
            .map(|(k, v)| (filer_key(&k), v))
            .collect();
        Ok(Self { by_filer })
    }

    /// The sample dataset shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TRADES)
    }

    pub fn len(&self) -> usize {
        self.by_filer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_filer.is_empty()
    }
}

impl TradeLookup for StaticTradeBook {
    fn trades_for(&self, filer: &str) -> Option<Vec<Trade>> {
        self.by_filer.get(&filer_key(filer)).cloned()
    }
}
