use crate::error::ValidationError;
use crate::ids::{same_id, CountryCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Allow-listed offer categories. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Gaming,
    Tech,
    Health,
    Nutrition,
    Fashion,
    Finance,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Gaming,
        Category::Tech,
        Category::Health,
        Category::Nutrition,
        Category::Fashion,
        Category::Finance,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Gaming => "Gaming",
            Category::Tech => "Tech",
            Category::Health => "Health",
            Category::Nutrition => "Nutrition",
            Category::Fashion => "Fashion",
            Category::Finance => "Finance",
        }
    }

    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parses a comma separated answer. Blank entries are dropped and
    /// duplicates collapse to their first occurrence.
    pub fn parse_list(raw: &str) -> Result<Vec<Category>, ValidationError> {
        let entries: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();
        Self::from_names(entries)
    }

    pub fn from_names<'a, I>(names: I) -> Result<Vec<Category>, ValidationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parsed = Vec::new();
        let mut invalid = Vec::new();
        for name in names {
            match name.parse::<Category>() {
                Ok(category) => {
                    if !parsed.contains(&category) {
                        parsed.push(category);
                    }
                }
                Err(_) => invalid.push(name.to_string()),
            }
        }
        if !invalid.is_empty() {
            return Err(ValidationError::InvalidCategories(invalid.join(", ")));
        }
        if parsed.is_empty() {
            return Err(ValidationError::NoCategories);
        }
        Ok(parsed)
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidCategories(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored offer. Categories stay plain strings on disk so that a record
/// written by another tool never makes the whole collection unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Offer {
    pub fn set_categories(&mut self, categories: &[Category]) {
        self.categories = categories.iter().map(|c| c.as_str().to_string()).collect();
    }
}

/// A payout amount, kept exactly as it was entered: `100` stays an integer,
/// `12.5` stays a float. Never rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(serde_json::Number);

impl Amount {
    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }

    pub fn zero() -> Self {
        Self(serde_json::Number::from(0))
    }

    /// Reads a stored JSON value; anything but a number yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(Self(number.clone())),
            _ => None,
        }
    }
}

impl From<Amount> for Value {
    fn from(amount: Amount) -> Self {
        Value::Number(amount.0)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(serde_json::Number::from(value))
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let not_numeric = || ValidationError::NotNumeric(trimmed.to_string());
        if trimmed.is_empty() {
            return Err(not_numeric());
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return Ok(Self::from(int));
        }
        let value: f64 = trimmed.parse().map_err(|_| not_numeric())?;
        if !value.is_finite() {
            return Err(not_numeric());
        }
        // "1e3" and "5." are integral; store them the way they print.
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        if value.fract() == 0.0 && value.abs() < MAX_EXACT {
            return Ok(Self::from(value as i64));
        }
        serde_json::Number::from_f64(value)
            .map(Self)
            .ok_or_else(not_numeric)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutKind {
    Cpa,
    Fixed,
    CpaAndFixed,
}

impl PayoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            PayoutKind::Cpa => "CPA",
            PayoutKind::Fixed => "FIXED",
            PayoutKind::CpaAndFixed => "CPA_AND_FIXED",
        }
    }

    pub const fn includes_cpa(self) -> bool {
        matches!(self, PayoutKind::Cpa | PayoutKind::CpaAndFixed)
    }

    pub const fn includes_fixed(self) -> bool {
        matches!(self, PayoutKind::Fixed | PayoutKind::CpaAndFixed)
    }
}

/// Exact, case-sensitive match on the stored spelling.
impl FromStr for PayoutKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CPA" => Ok(PayoutKind::Cpa),
            "FIXED" => Ok(PayoutKind::Fixed),
            "CPA_AND_FIXED" => Ok(PayoutKind::CpaAndFixed),
            _ => Err(ValidationError::InvalidPayoutType(s.to_string())),
        }
    }
}

impl fmt::Display for PayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpaTerms {
    /// Base CPA. A record may carry only country overrides.
    pub amount: Option<Amount>,
    pub country_overrides: BTreeMap<CountryCode, Amount>,
}

impl CpaTerms {
    pub fn flat(amount: Amount) -> Self {
        Self {
            amount: Some(amount),
            country_overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedTerms {
    pub amount: Option<Amount>,
}

/// On-disk shape of payout terms: `type` plus whichever amount fields were
/// written. Values are kept as raw JSON so that a record holding `null` or a
/// string where a number belongs is written back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTerms {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cpa_amount: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fixed_amount: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cpa_country_overrides: Option<Value>,
}

/// An explicit `null` stays `Some(Value::Null)`; only a missing field is `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// `Some(None)` for a missing field, `None` when the field is not a number.
fn optional_amount(value: Option<&Value>) -> Option<Option<Amount>> {
    match value {
        None => Some(None),
        Some(value) => Amount::from_json(value).map(Some),
    }
}

impl RawTerms {
    /// The stored type when it is one of the known spellings.
    pub fn payout_kind(&self) -> Option<PayoutKind> {
        self.kind.as_ref()?.as_str()?.parse().ok()
    }

    /// The stored type for messages, `none` when the field is missing.
    pub fn kind_label(&self) -> String {
        match &self.kind {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => other.to_string(),
            None => "none".to_string(),
        }
    }

    pub fn cpa_number(&self) -> Option<Amount> {
        self.cpa_amount.as_ref().and_then(Amount::from_json)
    }

    pub fn fixed_number(&self) -> Option<Amount> {
        self.fixed_amount.as_ref().and_then(Amount::from_json)
    }

    /// Numeric override values; entries holding anything else are skipped.
    pub fn override_numbers(&self) -> Vec<Amount> {
        match &self.cpa_country_overrides {
            Some(Value::Object(map)) => map.values().filter_map(Amount::from_json).collect(),
            _ => Vec::new(),
        }
    }

    /// Lenient read of stored terms. Amounts may be missing; `None` means the
    /// record cannot be represented without losing something it holds.
    fn to_terms(&self) -> Option<PayoutTerms> {
        let kind = self.payout_kind()?;
        let cpa_amount = optional_amount(self.cpa_amount.as_ref())?;
        let fixed_amount = optional_amount(self.fixed_amount.as_ref())?;
        let country_overrides = match &self.cpa_country_overrides {
            None => BTreeMap::new(),
            Some(overrides) => stored_overrides(overrides)?,
        };

        if !kind.includes_cpa() && (cpa_amount.is_some() || self.cpa_country_overrides.is_some()) {
            return None;
        }
        if !kind.includes_fixed() && fixed_amount.is_some() {
            return None;
        }

        let cpa = CpaTerms {
            amount: cpa_amount,
            country_overrides,
        };
        let fixed = FixedTerms {
            amount: fixed_amount,
        };
        Some(match kind {
            PayoutKind::Cpa => PayoutTerms::Cpa(cpa),
            PayoutKind::Fixed => PayoutTerms::Fixed(fixed),
            PayoutKind::CpaAndFixed => PayoutTerms::CpaAndFixed(cpa, fixed),
        })
    }

    /// Strict check used for new offers: the type must be spelled exactly,
    /// every amount its type needs must be a number and no other amount may
    /// be present. Override keys are upper-cased and checked.
    pub fn validate(&self) -> Result<PayoutTerms, ValidationError> {
        let kind = match &self.kind {
            Some(Value::String(kind)) => kind.parse::<PayoutKind>()?,
            _ => return Err(ValidationError::InvalidPayoutType(self.kind_label())),
        };
        let number = |value: &Value| {
            Amount::from_json(value).ok_or_else(|| ValidationError::NotNumeric(value.to_string()))
        };
        let cpa_amount = self.cpa_amount.as_ref().map(number).transpose()?;
        let fixed_amount = self.fixed_amount.as_ref().map(number).transpose()?;

        let mut country_overrides = BTreeMap::new();
        match &self.cpa_country_overrides {
            None => {}
            Some(Value::Object(map)) => {
                for (code, value) in map {
                    country_overrides.insert(CountryCode::parse(code)?, number(value)?);
                }
            }
            Some(other) => return Err(ValidationError::InvalidOverrides(other.to_string())),
        }

        let missing = |field| ValidationError::MissingAmount {
            kind: kind.as_str(),
            field,
        };
        let unexpected = |field| ValidationError::UnexpectedAmount {
            kind: kind.as_str(),
            field,
        };
        if kind.includes_cpa() && cpa_amount.is_none() {
            return Err(missing("cpaAmount"));
        }
        if kind.includes_fixed() && fixed_amount.is_none() {
            return Err(missing("fixedAmount"));
        }
        if !kind.includes_cpa() {
            if cpa_amount.is_some() {
                return Err(unexpected("cpaAmount"));
            }
            if !country_overrides.is_empty() {
                return Err(unexpected("cpaCountryOverrides"));
            }
        }
        if !kind.includes_fixed() && fixed_amount.is_some() {
            return Err(unexpected("fixedAmount"));
        }

        let cpa = CpaTerms {
            amount: cpa_amount,
            country_overrides,
        };
        let fixed = FixedTerms {
            amount: fixed_amount,
        };
        Ok(match kind {
            PayoutKind::Cpa => PayoutTerms::Cpa(cpa),
            PayoutKind::Fixed => PayoutTerms::Fixed(fixed),
            PayoutKind::CpaAndFixed => PayoutTerms::CpaAndFixed(cpa, fixed),
        })
    }
}

/// Overrides whose keys are already canonical codes and whose values are all
/// numbers.
fn stored_overrides(value: &Value) -> Option<BTreeMap<CountryCode, Amount>> {
    value
        .as_object()?
        .iter()
        .map(|(code, amount)| {
            let country = CountryCode::parse(code).ok().filter(|c| c.as_str() == code.as_str())?;
            Some((country, Amount::from_json(amount)?))
        })
        .collect()
}

/// Payout terms, one variant per payout type. A record may lack some of the
/// amounts its type names; rendering skips the missing parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTerms", into = "RawTerms")]
pub enum PayoutTerms {
    Cpa(CpaTerms),
    Fixed(FixedTerms),
    CpaAndFixed(CpaTerms, FixedTerms),
    /// Stored terms with an unknown type, or with fields the typed variants
    /// cannot hold (non-numeric amounts, amounts foreign to the type).
    /// Written back untouched.
    Unrecognized(RawTerms),
}

impl PayoutTerms {
    pub fn fixed(amount: Amount) -> Self {
        PayoutTerms::Fixed(FixedTerms {
            amount: Some(amount),
        })
    }

    pub fn kind(&self) -> Option<PayoutKind> {
        match self {
            PayoutTerms::Cpa(_) => Some(PayoutKind::Cpa),
            PayoutTerms::Fixed(_) => Some(PayoutKind::Fixed),
            PayoutTerms::CpaAndFixed(_, _) => Some(PayoutKind::CpaAndFixed),
            PayoutTerms::Unrecognized(raw) => raw.payout_kind(),
        }
    }

    pub fn cpa(&self) -> Option<&CpaTerms> {
        match self {
            PayoutTerms::Cpa(cpa) | PayoutTerms::CpaAndFixed(cpa, _) => Some(cpa),
            _ => None,
        }
    }

    pub fn cpa_mut(&mut self) -> Option<&mut CpaTerms> {
        match self {
            PayoutTerms::Cpa(cpa) | PayoutTerms::CpaAndFixed(cpa, _) => Some(cpa),
            _ => None,
        }
    }

    pub fn fixed_part(&self) -> Option<&FixedTerms> {
        match self {
            PayoutTerms::Fixed(fixed) | PayoutTerms::CpaAndFixed(_, fixed) => Some(fixed),
            _ => None,
        }
    }

    pub fn fixed_part_mut(&mut self) -> Option<&mut FixedTerms> {
        match self {
            PayoutTerms::Fixed(fixed) | PayoutTerms::CpaAndFixed(_, fixed) => Some(fixed),
            _ => None,
        }
    }
}

impl From<RawTerms> for PayoutTerms {
    fn from(raw: RawTerms) -> Self {
        match raw.to_terms() {
            Some(terms) => terms,
            None => {
                log::debug!("Keeping payout terms as stored: {raw:?}");
                PayoutTerms::Unrecognized(raw)
            }
        }
    }
}

impl From<PayoutTerms> for RawTerms {
    fn from(terms: PayoutTerms) -> Self {
        fn kind(kind: PayoutKind) -> Option<Value> {
            Some(Value::String(kind.as_str().to_string()))
        }
        fn amount(amount: Option<Amount>) -> Option<Value> {
            amount.map(Value::from)
        }
        fn overrides(cpa: &CpaTerms) -> Option<Value> {
            (!cpa.country_overrides.is_empty()).then(|| {
                Value::Object(
                    cpa.country_overrides
                        .iter()
                        .map(|(code, amount)| (code.to_string(), Value::from(amount.clone())))
                        .collect(),
                )
            })
        }

        match terms {
            PayoutTerms::Cpa(cpa) => RawTerms {
                kind: kind(PayoutKind::Cpa),
                cpa_country_overrides: overrides(&cpa),
                cpa_amount: amount(cpa.amount),
                fixed_amount: None,
            },
            PayoutTerms::Fixed(fixed) => RawTerms {
                kind: kind(PayoutKind::Fixed),
                cpa_amount: None,
                fixed_amount: amount(fixed.amount),
                cpa_country_overrides: None,
            },
            PayoutTerms::CpaAndFixed(cpa, fixed) => RawTerms {
                kind: kind(PayoutKind::CpaAndFixed),
                cpa_country_overrides: overrides(&cpa),
                cpa_amount: amount(cpa.amount),
                fixed_amount: amount(fixed.amount),
            },
            PayoutTerms::Unrecognized(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasePayout {
    pub offer_id: String,
    #[serde(flatten)]
    pub terms: PayoutTerms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPayout {
    pub offer_id: String,
    pub influencer_id: String,
    #[serde(flatten)]
    pub terms: PayoutTerms,
}

/// A stored record that does not fit its collection's model, kept as read
/// together with its position in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Unparsed {
    pub index: usize,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnparsedRecords {
    pub offers: Vec<Unparsed>,
    pub base_payouts: Vec<Unparsed>,
    pub custom_payouts: Vec<Unparsed>,
}

/// In-memory snapshot of the three collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub offers: Vec<Offer>,
    pub base_payouts: Vec<BasePayout>,
    pub custom_payouts: Vec<CustomPayout>,
    /// Records skipped on load. Saving puts them back where they were.
    pub unparsed: UnparsedRecords,
}

impl Catalog {
    /// Exact id lookup, used when mutating.
    pub fn offer_position(&self, offer_id: &str) -> Option<usize> {
        self.offers.iter().position(|offer| offer.id == offer_id)
    }

    /// Normalized lookup, used when joining payouts to offers for display.
    pub fn find_offer(&self, offer_id: &str) -> Option<&Offer> {
        self.offers.iter().find(|offer| same_id(&offer.id, offer_id))
    }

    pub fn base_payout_position(&self, offer_id: &str) -> Option<usize> {
        self.base_payouts
            .iter()
            .position(|payout| payout.offer_id == offer_id)
    }

    pub fn custom_payout_position(&self, offer_id: &str, influencer_id: &str) -> Option<usize> {
        self.custom_payouts.iter().position(|payout| {
            same_id(&payout.offer_id, offer_id) && same_id(&payout.influencer_id, influencer_id)
        })
    }

    pub fn influencers_for_offer(&self, offer_id: &str) -> Vec<&str> {
        self.custom_payouts
            .iter()
            .filter(|payout| payout.offer_id == offer_id)
            .map(|payout| payout.influencer_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn category_list_rejects_unknown_and_dedupes() {
        assert_eq!(
            Category::parse_list("Health, Nutrition, Health").unwrap(),
            vec![Category::Health, Category::Nutrition]
        );
        assert_eq!(
            Category::parse_list("InvalidCat").unwrap_err(),
            ValidationError::InvalidCategories("InvalidCat".into())
        );
        assert_eq!(
            Category::parse_list("gaming, Tech").unwrap_err(),
            ValidationError::InvalidCategories("gaming".into())
        );
        assert_eq!(
            Category::parse_list(" , ").unwrap_err(),
            ValidationError::NoCategories
        );
    }

    #[test]
    fn amount_keeps_integers_and_fractions_as_entered() {
        assert_eq!("100".parse::<Amount>().unwrap().to_string(), "100");
        assert_eq!(" 12.5 ".parse::<Amount>().unwrap().to_string(), "12.5");
        assert_eq!("1e3".parse::<Amount>().unwrap().to_string(), "1000");
        assert_eq!("-3".parse::<Amount>().unwrap().to_string(), "-3");
        assert!("abc".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
        assert!("NaN".parse::<Amount>().is_err());
        assert!("inf".parse::<Amount>().is_err());
    }

    #[test]
    fn payout_kind_matches_stored_spelling_exactly() {
        assert_eq!("CPA_AND_FIXED".parse::<PayoutKind>(), Ok(PayoutKind::CpaAndFixed));
        assert_eq!("FIXED".parse::<PayoutKind>(), Ok(PayoutKind::Fixed));
        assert!("cpa".parse::<PayoutKind>().is_err());
        assert!(" FIXED".parse::<PayoutKind>().is_err());
        assert!("FLAT".parse::<PayoutKind>().is_err());
    }

    #[test]
    fn base_payout_reads_flat_json_into_variants() {
        let payout: BasePayout = serde_json::from_value(json!({
            "offerId": "offer_1",
            "type": "CPA_AND_FIXED",
            "cpaAmount": 5,
            "fixedAmount": 100,
            "cpaCountryOverrides": { "US": 6, "GB": 4.5 }
        }))
        .unwrap();

        assert_eq!(payout.offer_id, "offer_1");
        let cpa = payout.terms.cpa().expect("cpa part");
        assert_eq!(cpa.amount, Some(Amount::from(5)));
        assert_eq!(cpa.country_overrides.len(), 2);
        assert_eq!(
            payout.terms.fixed_part().expect("fixed part").amount,
            Some(Amount::from(100))
        );
    }

    #[test]
    fn base_payout_writes_only_fields_of_its_type() {
        let payout = BasePayout {
            offer_id: "offer_2".into(),
            terms: PayoutTerms::Cpa(CpaTerms::flat(Amount::from(3))),
        };
        assert_eq!(
            serde_json::to_value(&payout).unwrap(),
            json!({ "offerId": "offer_2", "type": "CPA", "cpaAmount": 3 })
        );
    }

    #[test]
    fn known_types_with_missing_amounts_stay_typed() {
        let overrides_only: BasePayout = serde_json::from_value(json!({
            "offerId": "offer_1",
            "type": "CPA",
            "cpaCountryOverrides": { "US": 5, "GB": 5 }
        }))
        .unwrap();
        let cpa = overrides_only.terms.cpa().expect("cpa terms");
        assert_eq!(cpa.amount, None);
        assert_eq!(cpa.country_overrides.len(), 2);

        let fixed_only = json!({ "offerId": "offer_2", "type": "CPA_AND_FIXED", "fixedAmount": 100 });
        let payout: BasePayout = serde_json::from_value(fixed_only.clone()).unwrap();
        assert_eq!(
            payout.terms,
            PayoutTerms::CpaAndFixed(
                CpaTerms {
                    amount: None,
                    country_overrides: BTreeMap::new()
                },
                FixedTerms {
                    amount: Some(Amount::from(100))
                }
            )
        );
        assert_eq!(serde_json::to_value(&payout).unwrap(), fixed_only);

        let bare = json!({ "offerId": "offer_3", "influencerId": "INF_1", "type": "FIXED" });
        let payout: CustomPayout = serde_json::from_value(bare.clone()).unwrap();
        assert_eq!(payout.terms, PayoutTerms::Fixed(FixedTerms { amount: None }));
        assert_eq!(serde_json::to_value(&payout).unwrap(), bare);
    }

    #[test]
    fn terms_the_variants_cannot_hold_are_kept_verbatim() {
        for stored in [
            json!({ "offerId": "offer_4", "type": "BOUNTY", "fixedAmount": 1 }),
            json!({ "offerId": "offer_5", "type": "cpa", "cpaAmount": 2 }),
            json!({ "offerId": "offer_6", "type": "FIXED", "fixedAmount": 10, "cpaAmount": 2 }),
            json!({ "offerId": "offer_7", "type": "CPA", "cpaAmount": null }),
            json!({ "offerId": "offer_8", "type": "CPA", "cpaAmount": 5, "cpaCountryOverrides": { "US": null } }),
            json!({ "offerId": "offer_9", "type": 3 }),
        ] {
            let payout: BasePayout = serde_json::from_value(stored.clone()).unwrap();
            assert!(
                matches!(payout.terms, PayoutTerms::Unrecognized(_)),
                "{stored}"
            );
            assert_eq!(serde_json::to_value(&payout).unwrap(), stored);
        }
    }

    #[test]
    fn stored_type_is_case_sensitive() {
        let payout: BasePayout =
            serde_json::from_value(json!({ "offerId": "offer_1", "type": "cpa", "cpaAmount": 2 }))
                .unwrap();
        assert_eq!(payout.terms.kind(), None);

        let payout: BasePayout = serde_json::from_value(
            json!({ "offerId": "offer_1", "type": "FIXED", "fixedAmount": 1, "cpaAmount": 2 }),
        )
        .unwrap();
        assert_eq!(payout.terms.kind(), Some(PayoutKind::Fixed));
    }

    #[test]
    fn strict_validation_requires_exact_amounts() {
        let raw = |value| serde_json::from_value::<RawTerms>(value).unwrap();

        assert_eq!(
            raw(json!({ "type": "cpa", "cpaAmount": 2 })).validate(),
            Err(ValidationError::InvalidPayoutType("cpa".into()))
        );
        assert_eq!(
            raw(json!({ "type": "CPA", "cpaCountryOverrides": { "US": 5 } })).validate(),
            Err(ValidationError::MissingAmount {
                kind: "CPA",
                field: "cpaAmount"
            })
        );
        assert_eq!(
            raw(json!({ "type": "FIXED", "fixedAmount": 10, "cpaAmount": 2 })).validate(),
            Err(ValidationError::UnexpectedAmount {
                kind: "FIXED",
                field: "cpaAmount"
            })
        );
        assert_eq!(
            raw(json!({ "type": "FIXED", "fixedAmount": null })).validate(),
            Err(ValidationError::NotNumeric("null".into()))
        );
        assert_eq!(
            raw(json!({ "type": "CPA", "cpaAmount": 1, "cpaCountryOverrides": [5] })).validate(),
            Err(ValidationError::InvalidOverrides("[5]".into()))
        );
        assert_eq!(
            raw(json!({ "type": "CPA", "cpaAmount": 1, "cpaCountryOverrides": { "gb": 2 } }))
                .validate()
                .unwrap()
                .cpa()
                .map(|cpa| cpa.country_overrides.keys().map(|c| c.to_string()).collect()),
            Some(vec!["GB".to_string()])
        );
    }

    #[test]
    fn catalog_matches_custom_payouts_case_insensitively() {
        let catalog = Catalog {
            custom_payouts: vec![CustomPayout {
                offer_id: "offer_1".into(),
                influencer_id: "INF_7".into(),
                terms: PayoutTerms::fixed(Amount::from(10)),
            }],
            ..Default::default()
        };
        assert_eq!(catalog.custom_payout_position(" OFFER_1", "inf_7 "), Some(0));
        assert_eq!(catalog.custom_payout_position("offer_1", "INF_8"), None);
        assert_eq!(catalog.influencers_for_offer("offer_1"), vec!["INF_7"]);
    }
}
