//! Filtered, payout-annotated views over a catalog snapshot.

use crate::ids::same_id;
use crate::model::{Catalog, CustomPayout, Offer};
use crate::payout::{self, PayoutSummary, Resolved};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    /// Case-insensitive title substring.
    pub title: Option<String>,
    /// When set, only this influencer's custom payouts count.
    pub influencer: Option<String>,
}

impl OfferFilter {
    fn title_matches(&self, offer: &Offer) -> bool {
        match self.title.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => offer
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OfferListing<'a> {
    pub offer: &'a Offer,
    pub payout: Resolved<'a>,
}

impl OfferListing<'_> {
    pub fn display_payout(&self) -> String {
        payout::render(Some(self.payout.terms()))
    }

    pub fn to_entry(&self) -> ListedOffer {
        ListedOffer {
            id: self.offer.id.clone(),
            title: self.offer.title.clone(),
            description: self.offer.description.clone(),
            categories: self.offer.categories.clone(),
            custom: self.payout.is_custom(),
            payout: payout::summarize(Some(self.payout.terms())),
        }
    }
}

/// JSON form of a listed offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedOffer {
    pub id: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub custom: bool,
    pub payout: PayoutSummary,
}

/// Offers matching `filter` that have an applicable payout, in catalog order.
/// Offers without one are hidden, including offers that only have a base
/// payout when an influencer is named.
pub fn list_offers<'a>(catalog: &'a Catalog, filter: &OfferFilter) -> Vec<OfferListing<'a>> {
    catalog
        .offers
        .iter()
        .filter(|offer| filter.title_matches(offer))
        .filter_map(|offer| {
            payout::resolve(catalog, &offer.id, filter.influencer.as_deref())
                .map(|payout| OfferListing { offer, payout })
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct InfluencerOffer<'a> {
    pub payout: &'a CustomPayout,
    /// `None` when the payout points at an offer that no longer exists.
    pub offer: Option<&'a Offer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerOfferEntry {
    pub offer_id: String,
    pub offer: Option<Offer>,
    pub payout: PayoutSummary,
}

impl InfluencerOffer<'_> {
    pub fn to_entry(&self) -> InfluencerOfferEntry {
        InfluencerOfferEntry {
            offer_id: self.payout.offer_id.clone(),
            offer: self.offer.cloned(),
            payout: payout::summarize(Some(&self.payout.terms)),
        }
    }
}

/// Every custom payout held by `influencer_id`, joined with its offer.
pub fn influencer_offers<'a>(catalog: &'a Catalog, influencer_id: &str) -> Vec<InfluencerOffer<'a>> {
    catalog
        .custom_payouts
        .iter()
        .filter(|payout| same_id(&payout.influencer_id, influencer_id))
        .map(|payout| InfluencerOffer {
            payout,
            offer: catalog.find_offer(&payout.offer_id),
        })
        .collect()
}
