//! Identifier formats: offer ids, influencer ids and country codes.

use crate::error::ValidationError;
use crate::model::Offer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const OFFER_ID_PREFIX: &str = "offer_";

static COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid regex"));
static INFLUENCER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^INF_\d+$").expect("valid regex"));

/// Trim + lowercase, the equality used when joining records by id.
pub fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

pub fn same_id(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Two-letter uppercase country code, e.g. `US`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Upper-cases the input before checking `^[A-Z]{2}$`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let code = raw.trim().to_uppercase();
        if COUNTRY_CODE.is_match(&code) {
            Ok(Self(code))
        } else {
            Err(ValidationError::InvalidCountryCode(raw.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Influencer id of the form `INF_<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InfluencerId(String);

impl InfluencerId {
    /// Upper-cases the input before checking `^INF_\d+$`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let id = raw.trim().to_uppercase();
        if INFLUENCER_ID.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(ValidationError::InvalidInfluencerId(raw.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for InfluencerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How new offer ids are minted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// `offer_<max existing suffix + 1>`.
    #[default]
    Sequential,
    /// Unix time in milliseconds.
    Timestamp,
}

/// Numeric suffix of an `offer_<n>` id; `None` for anything else.
pub fn offer_sequence(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(OFFER_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn next_sequential_id(offers: &[Offer]) -> String {
    let max = offers
        .iter()
        .filter_map(|offer| offer_sequence(&offer.id))
        .max()
        .unwrap_or(0);
    format!("{OFFER_ID_PREFIX}{}", max.saturating_add(1))
}

pub fn next_offer_id(strategy: IdStrategy, offers: &[Offer]) -> String {
    let id = match strategy {
        IdStrategy::Sequential => next_sequential_id(offers),
        IdStrategy::Timestamp => timestamp_id(unix_now_ms(), offers),
    };
    log::debug!("Generated offer id {id} ({strategy:?})");
    id
}

fn timestamp_id(mut now_ms: u64, offers: &[Offer]) -> String {
    while offers.iter().any(|offer| offer.id == now_ms.to_string()) {
        now_ms += 1;
    }
    now_ms.to_string()
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(id: &str) -> Offer {
        Offer {
            id: id.to_string(),
            title: "t".into(),
            description: "d".into(),
            categories: vec!["Tech".into()],
        }
    }

    #[test]
    fn country_codes() {
        assert_eq!(CountryCode::parse("US").unwrap().as_str(), "US");
        assert_eq!(CountryCode::parse("gb").unwrap().as_str(), "GB");
        for bad in ["us1", "USA", "U1", "", "U"] {
            assert!(CountryCode::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn influencer_ids() {
        assert_eq!(InfluencerId::parse("INF_12").unwrap().as_str(), "INF_12");
        assert_eq!(InfluencerId::parse(" inf_3 ").unwrap().as_str(), "INF_3");
        for bad in ["inf12", "INF12", "INF_", "INF_1a", "XINF_1"] {
            assert!(InfluencerId::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn sequential_id_takes_max_suffix_plus_one() {
        assert_eq!(next_sequential_id(&[]), "offer_1");
        assert_eq!(
            next_sequential_id(&[offer("offer_1"), offer("offer_3")]),
            "offer_4"
        );
        // Numeric, not lexicographic.
        assert_eq!(
            next_sequential_id(&[offer("offer_9"), offer("offer_10")]),
            "offer_11"
        );
        assert_eq!(
            next_sequential_id(&[offer("1718000000000"), offer("offer_x"), offer("offer_2")]),
            "offer_3"
        );
        assert_eq!(next_sequential_id(&[offer("legacy")]), "offer_1");
    }

    #[test]
    fn offer_sequence_ignores_malformed_ids() {
        assert_eq!(offer_sequence("offer_42"), Some(42));
        assert_eq!(offer_sequence("offer_"), None);
        assert_eq!(offer_sequence("offer_+1"), None);
        assert_eq!(offer_sequence("Offer_1"), None);
    }

    #[test]
    fn timestamp_ids_skip_taken_values() {
        assert_eq!(timestamp_id(1_000, &[]), "1000");
        assert_eq!(timestamp_id(1_000, &[offer("1000"), offer("1001")]), "1002");
    }
}
