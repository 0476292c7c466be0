use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Buy/sell quote for one item, in raw currency units (no divisor applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceEntry {
    pub buy: Decimal,
    pub sell: Decimal,
}

/// Read-only item -> price mapping, loaded once at startup. Absence of an
/// entry means the item is unknown/unpriced.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    entries: BTreeMap<String, PriceEntry>,
}

impl PriceBook {
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, PriceEntry)>,
    {
        let entries: BTreeMap<String, PriceEntry> = entries.into_iter().collect();
        for (name, e) in &entries {
            if e.buy < Decimal::ZERO || e.sell < Decimal::ZERO {
                bail!("negative price for item '{name}': buy={} sell={}", e.buy, e.sell);
            }
        }
        Ok(Self { entries })
    }

    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read prices file {path}"))?;
        let entries: BTreeMap<String, PriceEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("decode prices file {path}"))?;
        Self::from_entries(entries)
    }

    pub fn get(&self, market_name: &str) -> Option<&PriceEntry> {
        self.entries.get(market_name)
    }

    /// Priced items in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PriceEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
