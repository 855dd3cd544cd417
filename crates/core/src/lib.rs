//! # Offer Core
//!
//! Data model and business rules for the influencer offer catalog.
//!
//! ## Flow
//!
//! ```text
//! Prompter (terminal / scripted)
//!     │
//!     ├──> OfferManager (validation, id generation, merge rules)
//!     │      └─> Catalog (offers, base payouts, custom payouts)
//!     │
//!     └──> Listing (title / influencer filters)
//!            └─> Payout resolver ──> "CPA $5–$8 + Fixed $100"
//! ```
//!
//! The crate performs no I/O besides reading prompt answers; persistence
//! lives in `offer-store`.
//!
//! ## Example
//!
//! ```
//! use offer_core::{payout, Catalog};
//!
//! let catalog = Catalog::default();
//! let resolved = payout::resolve(&catalog, "offer_1", None);
//! assert_eq!(payout::render(resolved.as_ref().map(|r| r.terms())), "N/A");
//! ```

mod error;
pub mod ids;
pub mod listing;
pub mod manager;
mod model;
pub mod payout;
pub mod prompt;

pub use error::{OfferError, Result, ValidationError};
pub use ids::{CountryCode, IdStrategy, InfluencerId};
pub use manager::{
    create_offer, CreatedOffer, CustomChange, CustomPayoutDraft, NewOffer, OfferDraft,
    OfferManager, UpdatedOffer,
};
pub use model::{
    Amount, BasePayout, Catalog, Category, CpaTerms, CustomPayout, FixedTerms, Offer,
    PayoutKind, PayoutTerms, RawTerms, Unparsed, UnparsedRecords,
};
pub use prompt::{LinePrompter, Prompter};
