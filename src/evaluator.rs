use std::sync::Arc;

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{PricingPolicy, TradeMessages};
use crate::pricebook::PriceBook;
use crate::stats::Stats;
use crate::types::{Decision, ItemRef, OfferReason, OfferVerdict, TradeOffer};

/// Value charged for an item on the giving side when the price book has no
/// entry for it. Large enough to sink any realistic offer.
const UNKNOWN_GIVE_PENALTY: Decimal = dec!(9999);

pub struct OfferEvaluator {
    owner_id: String,
    policy: PricingPolicy,
    messages: TradeMessages,
    stats: Arc<Stats>,
}

impl OfferEvaluator {
    pub fn new(
        owner_id: String,
        policy: PricingPolicy,
        messages: TradeMessages,
        stats: Arc<Stats>,
    ) -> Self {
        Self { owner_id, policy, messages, stats }
    }

    fn give_price(&self, e: &crate::pricebook::PriceEntry) -> Decimal {
        match self.policy {
            PricingPolicy::Defensive => e.sell,
            PricingPolicy::Mirrored => e.buy,
        }
    }

    fn receive_price(&self, e: &crate::pricebook::PriceEntry) -> Decimal {
        match self.policy {
            PricingPolicy::Defensive => e.buy,
            PricingPolicy::Mirrored => e.sell,
        }
    }

    /// Classify an offer. First matching rule wins: glitched, admin,
    /// donation, stealing, then valuation. Pure over its inputs; all sums
    /// are exact `Decimal` arithmetic, display rounding never happens here.
    ///
    /// A missing partner identity is a collaborator contract violation and
    /// surfaces as an error, never as a decline.
    pub fn evaluate(&self, offer: &TradeOffer, book: &PriceBook) -> Result<OfferVerdict> {
        if offer.partner_id.is_empty() {
            bail!("offer {} has no partner identity", offer.id);
        }

        self.stats.inc_offer_evaluated();

        if offer.is_glitched {
            tracing::warn!(offer_id = %offer.id, partner = %offer.partner_id, "offer is glitched");
            return Ok(OfferVerdict::new(Decision::DeclineOffer(OfferReason::Glitched)));
        }
        if offer.partner_id == self.owner_id {
            tracing::info!(offer_id = %offer.id, "admin offer");
            return Ok(OfferVerdict::new(Decision::AcceptOffer(OfferReason::Admin)));
        }
        if offer.items_to_give.is_empty() {
            tracing::info!(offer_id = %offer.id, partner = %offer.partner_id, "donation");
            return Ok(OfferVerdict::new(Decision::AcceptOffer(OfferReason::Donation)));
        }
        if offer.items_to_receive.is_empty() {
            tracing::warn!(offer_id = %offer.id, partner = %offer.partner_id, "one-sided take");
            return Ok(OfferVerdict::new(Decision::DeclineOffer(OfferReason::Stealing)));
        }

        let mut warnings: Vec<String> = vec![];

        let mut give_value = Decimal::ZERO;
        for item in &offer.items_to_give {
            match book.get(&item.market_name) {
                Some(e) => give_value += self.give_price(e),
                None => {
                    give_value += UNKNOWN_GIVE_PENALTY;
                    warnings.push(self.unknown_warning(&self.messages.not_giving, item));
                    tracing::warn!(item = %item.market_name, "unpriced item on giving side");
                }
            }
        }

        let mut receive_value = Decimal::ZERO;
        for item in &offer.items_to_receive {
            match book.get(&item.market_name) {
                Some(e) => receive_value += self.receive_price(e),
                None => {
                    warnings.push(self.unknown_warning(&self.messages.not_receiving, item));
                    tracing::warn!(item = %item.market_name, "unpriced item on receiving side");
                }
            }
        }

        self.stats.add_unknown_items(warnings.len() as u64);

        tracing::info!(
            offer_id = %offer.id,
            partner = %offer.partner_id,
            give_value = %give_value,
            receive_value = %receive_value,
            "offer valued"
        );

        let decision = if receive_value >= give_value {
            Decision::AcceptOffer(OfferReason::Sufficient)
        } else {
            Decision::DeclineOffer(OfferReason::Insufficient)
        };
        Ok(OfferVerdict { decision, warnings })
    }

    fn unknown_warning(&self, template: &str, item: &ItemRef) -> String {
        format!("{template} {}", item.market_name)
    }
}
