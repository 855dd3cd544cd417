//! Creating and updating offers together with their payouts.
//!
//! The manager only mutates an in-memory [`Catalog`]; callers load and save
//! it. All answers come through the injected [`Prompter`], so tests can drive
//! the flows with canned input.

use crate::error::{OfferError, Result, ValidationError};
use crate::ids::{next_offer_id, CountryCode, IdStrategy, InfluencerId};
use crate::model::{
    Amount, BasePayout, Catalog, Category, CpaTerms, CustomPayout, FixedTerms, Offer, PayoutKind,
    PayoutTerms, RawTerms,
};
use crate::prompt::{ask_optional, ask_required, ask_until, ask_yes_no, Prompter};
use serde::Deserialize;

/// Offer input supplied as a document instead of interactively.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDraft {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub payout: RawTerms,
    #[serde(default)]
    pub custom_payout: Option<CustomPayoutDraft>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPayoutDraft {
    pub influencer_id: String,
    pub fixed_amount: Amount,
}

impl OfferDraft {
    pub fn validate(self) -> std::result::Result<NewOffer, ValidationError> {
        let title = required(&self.title)?;
        let description = required(&self.description)?;
        let categories = Category::from_names(self.categories.iter().map(|c| c.trim()))?;
        let terms = self.payout.validate()?;

        let custom = self
            .custom_payout
            .map(|custom| {
                InfluencerId::parse(&custom.influencer_id)
                    .map(|influencer| (influencer, custom.fixed_amount))
            })
            .transpose()?;

        Ok(NewOffer {
            title,
            description,
            categories,
            terms,
            custom,
        })
    }
}

fn required(value: &str) -> std::result::Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required);
    }
    Ok(value.to_string())
}

/// Stored amount as shown in update prompts.
fn current(amount: Option<&Amount>) -> String {
    amount.map_or_else(|| "N/A".to_string(), Amount::to_string)
}

/// Validated input for a new offer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub title: String,
    pub description: String,
    pub categories: Vec<Category>,
    pub terms: PayoutTerms,
    /// Custom payouts are always FIXED, whatever the base payout type.
    pub custom: Option<(InfluencerId, Amount)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOffer {
    pub offer: Offer,
    pub base_payout: BasePayout,
    pub custom_payouts: Vec<CustomPayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomChange {
    Updated(String),
    Created(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedOffer {
    pub offer: Offer,
    pub base_payout: BasePayout,
    pub custom_change: Option<CustomChange>,
}

/// Appends the offer, its base payout and the optional custom payout.
pub fn create_offer(
    catalog: &mut Catalog,
    new_offer: NewOffer,
    strategy: IdStrategy,
) -> CreatedOffer {
    let id = next_offer_id(strategy, &catalog.offers);

    let mut offer = Offer {
        id: id.clone(),
        title: new_offer.title,
        description: new_offer.description,
        categories: Vec::new(),
    };
    offer.set_categories(&new_offer.categories);

    let base_payout = BasePayout {
        offer_id: id.clone(),
        terms: new_offer.terms,
    };
    let custom_payouts: Vec<CustomPayout> = new_offer
        .custom
        .into_iter()
        .map(|(influencer, amount)| CustomPayout {
            offer_id: id.clone(),
            influencer_id: influencer.into_string(),
            terms: PayoutTerms::fixed(amount),
        })
        .collect();

    catalog.offers.push(offer.clone());
    catalog.base_payouts.push(base_payout.clone());
    catalog.custom_payouts.extend(custom_payouts.iter().cloned());
    log::info!(
        "Created offer {id} with {} custom payout(s)",
        custom_payouts.len()
    );

    CreatedOffer {
        offer,
        base_payout,
        custom_payouts,
    }
}

pub struct OfferManager<P> {
    prompter: P,
    id_strategy: IdStrategy,
}

impl<P: Prompter> OfferManager<P> {
    pub fn new(prompter: P, id_strategy: IdStrategy) -> Self {
        Self {
            prompter,
            id_strategy,
        }
    }

    /// Interactive create: collects every field, then appends to `catalog`.
    pub fn create(&mut self, catalog: &mut Catalog) -> Result<CreatedOffer> {
        let new_offer = self.collect_new_offer()?;
        Ok(create_offer(catalog, new_offer, self.id_strategy))
    }

    pub fn collect_new_offer(&mut self) -> Result<NewOffer> {
        let p = &mut self.prompter;
        let title = ask_required(p, "Enter offer title: ")?;
        let description = ask_required(p, "Enter offer description: ")?;
        let categories = ask_until(
            p,
            &format!(
                "Enter categories (comma separated, choose from {}): ",
                Category::allowed_list()
            ),
            Category::parse_list,
        )?;
        let terms = self.collect_base_terms()?;
        let custom = self.collect_custom_payout()?;

        Ok(NewOffer {
            title,
            description,
            categories,
            terms,
            custom,
        })
    }

    fn collect_base_terms(&mut self) -> Result<PayoutTerms> {
        let kind: PayoutKind = ask_until(
            &mut self.prompter,
            "Enter base payout type (CPA/FIXED/CPA_AND_FIXED): ",
            |answer| answer.to_uppercase().parse(),
        )?;
        Ok(match kind {
            PayoutKind::Cpa => PayoutTerms::Cpa(self.collect_cpa_terms()?),
            PayoutKind::Fixed => PayoutTerms::Fixed(self.collect_fixed_terms()?),
            PayoutKind::CpaAndFixed => {
                let cpa = self.collect_cpa_terms()?;
                PayoutTerms::CpaAndFixed(cpa, self.collect_fixed_terms()?)
            }
        })
    }

    fn collect_cpa_terms(&mut self) -> Result<CpaTerms> {
        let p = &mut self.prompter;
        let mut cpa = CpaTerms::flat(ask_until(p, "Enter base CPA amount: ", str::parse)?);

        if ask_yes_no(p, "Add country-specific CPA overrides? (yes/no): ")? {
            while let Some(country) = ask_optional(
                p,
                "Enter country code (or press Enter to finish): ",
                CountryCode::parse,
            )? {
                let amount = ask_until(p, &format!("CPA for {country}: "), str::parse)?;
                cpa.country_overrides.insert(country, amount);
            }
        }
        Ok(cpa)
    }

    fn collect_fixed_terms(&mut self) -> Result<FixedTerms> {
        let amount = ask_until(&mut self.prompter, "Enter Fixed amount: ", str::parse)?;
        Ok(FixedTerms {
            amount: Some(amount),
        })
    }

    fn collect_custom_payout(&mut self) -> Result<Option<(InfluencerId, Amount)>> {
        let p = &mut self.prompter;
        if !ask_yes_no(p, "Add a custom payout for an influencer? (yes/no): ")? {
            return Ok(None);
        }
        let influencer = ask_until(p, "Enter influencer ID (e.g., INF_1): ", InfluencerId::parse)?;
        let amount = ask_until(
            p,
            &format!("Enter custom amount for {influencer}: "),
            str::parse,
        )?;
        Ok(Some((influencer, amount)))
    }

    /// Interactive update. Blank answers keep the stored value. Unknown ids
    /// fail before any prompt or mutation.
    pub fn update(&mut self, catalog: &mut Catalog, offer_id: &str) -> Result<UpdatedOffer> {
        let offer_id = offer_id.trim();
        let index = catalog
            .offer_position(offer_id)
            .ok_or_else(|| OfferError::NotFound(offer_id.to_string()))?;

        self.update_offer_fields(&mut catalog.offers[index])?;

        let base_index = catalog.base_payout_position(offer_id);
        let mut terms = match base_index {
            Some(i) => catalog.base_payouts[i].terms.clone(),
            None => {
                log::debug!("Offer {offer_id} has no base payout; starting from CPA 0");
                PayoutTerms::Cpa(CpaTerms::flat(Amount::zero()))
            }
        };
        self.update_base_terms(&mut terms)?;
        let base_payout = BasePayout {
            offer_id: offer_id.to_string(),
            terms,
        };
        match base_index {
            Some(i) => catalog.base_payouts[i] = base_payout.clone(),
            None => catalog.base_payouts.push(base_payout.clone()),
        }

        let custom_change = self.update_custom_payout(catalog, offer_id)?;
        log::info!("Updated offer {offer_id}");

        Ok(UpdatedOffer {
            offer: catalog.offers[index].clone(),
            base_payout,
            custom_change,
        })
    }

    fn update_offer_fields(&mut self, offer: &mut Offer) -> Result<()> {
        let p = &mut self.prompter;
        let keep_text =
            |answer: &str| -> std::result::Result<String, ValidationError> { Ok(answer.to_string()) };

        let title = ask_optional(
            p,
            &format!("Update title or press Enter to continue [{}]: ", offer.title),
            keep_text,
        )?;
        let description = ask_optional(
            p,
            &format!(
                "Update description or press Enter to continue [{}]: ",
                offer.description
            ),
            keep_text,
        )?;
        let categories = ask_optional(
            p,
            &format!(
                "Update categories (comma separated) or press Enter to continue [{}]: ",
                offer.categories.join(", ")
            ),
            Category::parse_list,
        )?;

        if let Some(title) = title {
            offer.title = title;
        }
        if let Some(description) = description {
            offer.description = description;
        }
        if let Some(categories) = categories {
            offer.set_categories(&categories);
        }
        Ok(())
    }

    fn update_base_terms(&mut self, terms: &mut PayoutTerms) -> Result<()> {
        let p = &mut self.prompter;
        if let PayoutTerms::Unrecognized(raw) = terms {
            p.notify(&format!(
                "Base payout has unrecognized terms (type {}); leaving it unchanged.",
                raw.kind_label()
            ));
            return Ok(());
        }

        if let Some(cpa) = terms.cpa_mut() {
            let question = format!(
                "Enter new base CPA amount or press Enter to keep [{}]: ",
                current(cpa.amount.as_ref())
            );
            if let Some(amount) = ask_optional(p, &question, str::parse)? {
                cpa.amount = Some(amount);
            }

            if !cpa.country_overrides.is_empty() {
                p.notify("Update existing country CPA overrides:");
                for (country, value) in cpa.country_overrides.iter_mut() {
                    let question = format!(
                        "  Update CPA for [{country}] or press Enter to keep [{value}]: "
                    );
                    if let Some(amount) = ask_optional(p, &question, str::parse)? {
                        *value = amount;
                    }
                }
            }
        }

        if let Some(fixed) = terms.fixed_part_mut() {
            let question = format!(
                "Enter new FIXED amount or press Enter to keep [{}]: ",
                current(fixed.amount.as_ref())
            );
            if let Some(amount) = ask_optional(p, &question, str::parse)? {
                fixed.amount = Some(amount);
            }
        }
        Ok(())
    }

    fn update_custom_payout(
        &mut self,
        catalog: &mut Catalog,
        offer_id: &str,
    ) -> Result<Option<CustomChange>> {
        let p = &mut self.prompter;
        if !ask_yes_no(p, "Update a custom payout for an influencer? (yes/no): ")? {
            return Ok(None);
        }

        let existing = catalog.influencers_for_offer(offer_id);
        let question = if existing.is_empty() {
            "Enter influencer ID: ".to_string()
        } else {
            format!("Enter influencer ID [{}]: ", existing.join(", "))
        };
        let influencer = ask_until(p, &question, InfluencerId::parse)?;

        match catalog.custom_payout_position(offer_id, influencer.as_str()) {
            Some(i) => {
                let payout = &mut catalog.custom_payouts[i];
                let shown = current(
                    payout
                        .terms
                        .fixed_part()
                        .and_then(|fixed| fixed.amount.as_ref()),
                );
                let question =
                    format!("Update CUSTOM amount or press Enter to continue [{shown}]: ");
                if let Some(amount) = ask_optional(p, &question, str::parse)? {
                    match payout.terms.fixed_part_mut() {
                        Some(fixed) => fixed.amount = Some(amount),
                        None => payout.terms = PayoutTerms::fixed(amount),
                    }
                }
                p.notify(&format!("Custom payout updated for {influencer}"));
                Ok(Some(CustomChange::Updated(payout.influencer_id.clone())))
            }
            None => {
                let amount = ask_until(p, "Enter FIXED amount: ", str::parse)?;
                let influencer_id = influencer.into_string();
                catalog.custom_payouts.push(CustomPayout {
                    offer_id: offer_id.to_string(),
                    influencer_id: influencer_id.clone(),
                    terms: PayoutTerms::fixed(amount),
                });
                p.notify(&format!("Custom payout created for {influencer_id}"));
                Ok(Some(CustomChange::Created(influencer_id)))
            }
        }
    }
}
