//! Payout resolution and rendering.
//!
//! `resolve` picks the record that applies to an offer (custom overrides
//! base, with no fallback once an influencer is named); `render` turns its
//! terms into the display string used by the list views.

use crate::ids::{normalize, same_id};
use crate::model::{Amount, BasePayout, Catalog, CustomPayout, PayoutKind, PayoutTerms};
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Base(&'a BasePayout),
    Custom(&'a CustomPayout),
}

impl<'a> Resolved<'a> {
    pub fn terms(&self) -> &'a PayoutTerms {
        match *self {
            Resolved::Base(payout) => &payout.terms,
            Resolved::Custom(payout) => &payout.terms,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Resolved::Custom(_))
    }
}

/// Finds the payout for `offer_id`.
///
/// With a non-blank `influencer_id` only that influencer's custom payout
/// counts; the base payout is never used as a fallback.
pub fn resolve<'a>(
    catalog: &'a Catalog,
    offer_id: &str,
    influencer_id: Option<&str>,
) -> Option<Resolved<'a>> {
    let influencer = influencer_id.map(normalize).filter(|id| !id.is_empty());

    match influencer {
        Some(influencer) => catalog
            .custom_payouts
            .iter()
            .find(|payout| {
                same_id(&payout.offer_id, offer_id) && normalize(&payout.influencer_id) == influencer
            })
            .map(Resolved::Custom),
        None => catalog
            .base_payouts
            .iter()
            .find(|payout| same_id(&payout.offer_id, offer_id))
            .map(Resolved::Base),
    }
}

/// Lowest and highest amount, compared numerically. Returns the amounts as
/// they were entered.
fn min_max<'a, I>(amounts: I) -> Option<(&'a Amount, &'a Amount)>
where
    I: IntoIterator<Item = &'a Amount>,
{
    amounts.into_iter().fold(None, |acc, amount| match acc {
        None => Some((amount, amount)),
        Some((min, max)) => Some((
            if amount.as_f64() < min.as_f64() { amount } else { min },
            if amount.as_f64() > max.as_f64() { amount } else { max },
        )),
    })
}

/// Overrides win over the base CPA; `None` when neither is there.
fn cpa_range<'a, I>(overrides: I, base: Option<&'a Amount>) -> Option<CpaRange>
where
    I: IntoIterator<Item = &'a Amount>,
{
    let (min, max) = min_max(overrides).or_else(|| base.map(|amount| (amount, amount)))?;
    Some(CpaRange {
        min: min.clone(),
        max: max.clone(),
    })
}

/// The parts of a payout its type puts on display.
struct Shown {
    kind: PayoutKind,
    cpa: Option<CpaRange>,
    fixed: Option<Amount>,
}

/// `None` for a type outside the known three.
fn shown(terms: &PayoutTerms) -> Option<Shown> {
    let (kind, cpa, fixed) = match terms {
        PayoutTerms::Cpa(cpa) => (
            PayoutKind::Cpa,
            cpa_range(cpa.country_overrides.values(), cpa.amount.as_ref()),
            None,
        ),
        PayoutTerms::Fixed(fixed) => (PayoutKind::Fixed, None, fixed.amount.clone()),
        PayoutTerms::CpaAndFixed(cpa, fixed) => (
            PayoutKind::CpaAndFixed,
            cpa_range(cpa.country_overrides.values(), cpa.amount.as_ref()),
            fixed.amount.clone(),
        ),
        PayoutTerms::Unrecognized(raw) => {
            let kind = raw.payout_kind()?;
            let overrides = raw.override_numbers();
            let base = raw.cpa_number();
            let cpa = kind
                .includes_cpa()
                .then(|| cpa_range(&overrides, base.as_ref()))
                .flatten();
            let fixed = raw.fixed_number().filter(|_| kind.includes_fixed());
            (kind, cpa, fixed)
        }
    };
    Some(Shown { kind, cpa, fixed })
}

fn render_cpa(range: &CpaRange) -> String {
    if range.min.as_f64() == range.max.as_f64() {
        format!("CPA ${}", range.min)
    } else {
        format!("CPA ${}\u{2013}${}", range.min, range.max)
    }
}

/// Display string for a payout. Parts missing from the record are left out;
/// "N/A" when nothing is left or the type is unknown.
pub fn render(terms: Option<&PayoutTerms>) -> String {
    let Some(shown) = terms.and_then(shown) else {
        return NOT_AVAILABLE.to_string();
    };
    let parts: Vec<String> = shown
        .cpa
        .iter()
        .map(render_cpa)
        .chain(shown.fixed.iter().map(|fixed| format!("Fixed ${fixed}")))
        .collect();
    if parts.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        parts.join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpaRange {
    pub min: Amount,
    pub max: Amount,
}

/// Structured form of a rendered payout, for JSON consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutSummary {
    pub kind: &'static str,
    pub cpa: Option<CpaRange>,
    pub fixed: Option<Amount>,
    pub display: String,
}

pub fn summarize(terms: Option<&PayoutTerms>) -> PayoutSummary {
    let (kind, cpa, fixed) = match terms.map(shown) {
        None => ("NONE", None, None),
        Some(None) => ("UNRECOGNIZED", None, None),
        Some(Some(shown)) => (shown.kind.as_str(), shown.cpa, shown.fixed),
    };
    PayoutSummary {
        kind,
        cpa,
        fixed,
        display: render(terms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CountryCode;
    use crate::model::{CpaTerms, FixedTerms, RawTerms};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn amount(raw: &str) -> Amount {
        raw.parse().unwrap()
    }

    fn cpa(base: Option<&str>, overrides: &[(&str, &str)]) -> CpaTerms {
        CpaTerms {
            amount: base.map(amount),
            country_overrides: overrides
                .iter()
                .map(|(code, value)| (CountryCode::parse(code).unwrap(), amount(value)))
                .collect(),
        }
    }

    fn fixed(value: Option<&str>) -> FixedTerms {
        FixedTerms {
            amount: value.map(amount),
        }
    }

    fn stored(value: serde_json::Value) -> PayoutTerms {
        serde_json::from_value(value).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog {
            base_payouts: vec![
                BasePayout {
                    offer_id: "offer_1".into(),
                    terms: PayoutTerms::fixed(amount("100")),
                },
                BasePayout {
                    offer_id: "offer_2".into(),
                    terms: PayoutTerms::Cpa(cpa(Some("4"), &[])),
                },
            ],
            custom_payouts: vec![CustomPayout {
                offer_id: "offer_2".into(),
                influencer_id: "INF_1".into(),
                terms: PayoutTerms::fixed(amount("250")),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn renders_fixed() {
        assert_eq!(render(Some(&PayoutTerms::fixed(amount("100")))), "Fixed $100");
        assert_eq!(render(Some(&PayoutTerms::fixed(amount("99.5")))), "Fixed $99.5");
        assert_eq!(render(Some(&PayoutTerms::Fixed(fixed(None)))), "N/A");
    }

    #[test]
    fn renders_cpa_from_base_amount_without_overrides() {
        assert_eq!(render(Some(&PayoutTerms::Cpa(cpa(Some("3"), &[])))), "CPA $3");
        assert_eq!(render(Some(&PayoutTerms::Cpa(cpa(None, &[])))), "N/A");
    }

    #[test]
    fn renders_cpa_range_from_country_overrides() {
        let same = PayoutTerms::Cpa(cpa(Some("1"), &[("US", "5"), ("GB", "5")]));
        assert_eq!(render(Some(&same)), "CPA $5");

        let spread = PayoutTerms::Cpa(cpa(Some("1"), &[("US", "5"), ("GB", "8")]));
        assert_eq!(render(Some(&spread)), "CPA $5\u{2013}$8");

        let fractional = PayoutTerms::Cpa(cpa(Some("1"), &[("DE", "2.25"), ("FR", "10")]));
        assert_eq!(render(Some(&fractional)), "CPA $2.25\u{2013}$10");
    }

    #[test]
    fn renders_overrides_without_base_cpa() {
        let terms = stored(json!({ "type": "CPA", "cpaCountryOverrides": { "US": 5, "GB": 5 } }));
        assert_eq!(render(Some(&terms)), "CPA $5");

        let terms = stored(json!({ "type": "CPA", "cpaCountryOverrides": { "US": 5, "GB": 8 } }));
        assert_eq!(render(Some(&terms)), "CPA $5\u{2013}$8");
    }

    #[test]
    fn renders_cpa_and_fixed_joined() {
        let terms = PayoutTerms::CpaAndFixed(
            cpa(Some("2"), &[("US", "3"), ("CA", "1")]),
            fixed(Some("50")),
        );
        assert_eq!(render(Some(&terms)), "CPA $1\u{2013}$3 + Fixed $50");

        let flat = PayoutTerms::CpaAndFixed(cpa(Some("2"), &[]), fixed(Some("50")));
        assert_eq!(render(Some(&flat)), "CPA $2 + Fixed $50");
    }

    #[test]
    fn renders_whichever_part_of_cpa_and_fixed_is_present() {
        let fixed_only = stored(json!({ "type": "CPA_AND_FIXED", "fixedAmount": 100 }));
        assert_eq!(render(Some(&fixed_only)), "Fixed $100");

        let cpa_only = stored(json!({ "type": "CPA_AND_FIXED", "cpaAmount": 3 }));
        assert_eq!(render(Some(&cpa_only)), "CPA $3");

        let neither = stored(json!({ "type": "CPA_AND_FIXED" }));
        assert_eq!(render(Some(&neither)), "N/A");
    }

    #[test]
    fn renders_the_amounts_a_type_names_even_with_stray_fields() {
        let terms = stored(json!({ "type": "FIXED", "fixedAmount": 10, "cpaAmount": 2 }));
        assert!(matches!(terms, PayoutTerms::Unrecognized(_)));
        assert_eq!(render(Some(&terms)), "Fixed $10");

        let terms = stored(json!({
            "type": "CPA",
            "cpaAmount": 5,
            "cpaCountryOverrides": { "US": null }
        }));
        assert_eq!(render(Some(&terms)), "CPA $5");
    }

    #[test]
    fn renders_na_for_absent_and_unknown_types() {
        assert_eq!(render(None), "N/A");
        let raw = RawTerms {
            kind: Some(json!("BOUNTY")),
            fixed_amount: Some(json!(5)),
            ..Default::default()
        };
        assert_eq!(render(Some(&PayoutTerms::Unrecognized(raw))), "N/A");
        assert_eq!(render(Some(&stored(json!({ "type": "cpa", "cpaAmount": 2 })))), "N/A");
    }

    #[test]
    fn resolve_uses_base_without_influencer() {
        let catalog = catalog();
        let resolved = resolve(&catalog, "offer_1", None).expect("base payout");
        assert!(!resolved.is_custom());
        assert_eq!(render(Some(resolved.terms())), "Fixed $100");

        let blank = resolve(&catalog, "OFFER_1 ", Some("   ")).expect("blank influencer");
        assert!(!blank.is_custom());
    }

    #[test]
    fn resolve_prefers_custom_for_named_influencer() {
        let catalog = catalog();
        let resolved = resolve(&catalog, "offer_2", Some(" inf_1 ")).expect("custom payout");
        assert!(resolved.is_custom());
        assert_eq!(render(Some(resolved.terms())), "Fixed $250");
    }

    #[test]
    fn resolve_never_falls_back_to_base_for_influencer() {
        let catalog = catalog();
        assert!(resolve(&catalog, "offer_1", Some("INF_1")).is_none());
        assert!(resolve(&catalog, "offer_2", Some("INF_2")).is_none());
        assert!(resolve(&catalog, "offer_9", None).is_none());
    }

    #[test]
    fn summary_carries_structured_amounts() {
        let terms = PayoutTerms::CpaAndFixed(
            cpa(Some("2"), &[("US", "5"), ("GB", "8")]),
            fixed(Some("10")),
        );
        assert_eq!(
            summarize(Some(&terms)),
            PayoutSummary {
                kind: "CPA_AND_FIXED",
                cpa: Some(CpaRange {
                    min: amount("5"),
                    max: amount("8"),
                }),
                fixed: Some(amount("10")),
                display: "CPA $5\u{2013}$8 + Fixed $10".into(),
            }
        );
        assert_eq!(summarize(None).kind, "NONE");
        assert_eq!(summarize(None).display, "N/A");

        let unknown = stored(json!({ "type": "cpa", "cpaAmount": 2 }));
        assert_eq!(
            summarize(Some(&unknown)),
            PayoutSummary {
                kind: "UNRECOGNIZED",
                cpa: None,
                fixed: None,
                display: "N/A".into(),
            }
        );
        let fixed_only = stored(json!({ "type": "CPA_AND_FIXED", "fixedAmount": 100 }));
        assert_eq!(summarize(Some(&fixed_only)).cpa, None);
    }
}
