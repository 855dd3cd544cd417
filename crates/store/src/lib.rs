//! JSON document store for the offer catalog.
//!
//! Each collection is one pretty-printed JSON array in the data directory,
//! read and written wholesale. A missing file reads as an empty array.
//!
//! Records are converted one at a time. A record that does not fit the model
//! is logged, kept aside as raw JSON and written back at its old position on
//! the next save, so one odd entry never costs the rest of the file.
//!
//! Writes go through a sibling `*.json.tmp` file and a rename, so a reader
//! never observes a half-written file. There is no locking between
//! processes: two invocations that load, modify and save concurrently will
//! lose one of the updates, and a failed save can leave the three files out
//! of step with each other.

mod error;

pub use error::{Result, StoreError};

use offer_core::{Catalog, Unparsed, UnparsedRecords};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Offers,
    BasePayouts,
    CustomPayouts,
}

impl Collection {
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Offers => "offers.json",
            Collection::BasePayouts => "offerPayouts.json",
            Collection::CustomPayouts => "influencerCustomPayouts.json",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Collection::Offers => "offers",
            Collection::BasePayouts => "base_payouts",
            Collection::CustomPayouts => "custom_payouts",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Reads a collection, surfacing I/O and parse failures.
    pub async fn read<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let path = self.path(collection);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed { path, source })
    }

    /// Reads a collection, treating any failure as an empty collection.
    pub async fn read_or_empty<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        match self.read(collection).await {
            Ok(records) => records,
            Err(err) => {
                log::warn!("Treating {} as empty: {err}", collection.name());
                Vec::new()
            }
        }
    }

    /// Replaces a collection on disk, creating the data directory if needed.
    pub async fn write<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let path = self.path(collection);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let bytes = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Encode {
            name: collection.name(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        log::debug!(
            "Wrote {} {} record(s) to {}",
            records.len(),
            collection.name(),
            path.display()
        );
        Ok(())
    }

    /// Snapshot of all three collections; unreadable files load as empty.
    pub async fn load_catalog(&self) -> Catalog {
        let (offers, base_payouts, custom_payouts) = tokio::join!(
            self.read_or_empty::<Value>(Collection::Offers),
            self.read_or_empty::<Value>(Collection::BasePayouts),
            self.read_or_empty::<Value>(Collection::CustomPayouts),
        );
        assemble(offers, base_payouts, custom_payouts)
    }

    /// Strict snapshot; fails on the first unreadable collection. Records
    /// that do not fit the model are still kept aside rather than failing.
    pub async fn try_load_catalog(&self) -> Result<Catalog> {
        let (offers, base_payouts, custom_payouts) = tokio::try_join!(
            self.read::<Value>(Collection::Offers),
            self.read::<Value>(Collection::BasePayouts),
            self.read::<Value>(Collection::CustomPayouts),
        )?;
        Ok(assemble(offers, base_payouts, custom_payouts))
    }

    /// Writes all three collections concurrently. Not atomic as a group.
    pub async fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        let offers = interleave(&catalog.offers, &catalog.unparsed.offers);
        let base_payouts = interleave(&catalog.base_payouts, &catalog.unparsed.base_payouts);
        let custom_payouts =
            interleave(&catalog.custom_payouts, &catalog.unparsed.custom_payouts);
        tokio::try_join!(
            self.write(Collection::Offers, &offers),
            self.write(Collection::BasePayouts, &base_payouts),
            self.write(Collection::CustomPayouts, &custom_payouts),
        )?;
        Ok(())
    }
}

fn assemble(offers: Vec<Value>, base_payouts: Vec<Value>, custom_payouts: Vec<Value>) -> Catalog {
    let (offers, unparsed_offers) = split_records(Collection::Offers, offers);
    let (base_payouts, unparsed_base) = split_records(Collection::BasePayouts, base_payouts);
    let (custom_payouts, unparsed_custom) =
        split_records(Collection::CustomPayouts, custom_payouts);
    Catalog {
        offers,
        base_payouts,
        custom_payouts,
        unparsed: UnparsedRecords {
            offers: unparsed_offers,
            base_payouts: unparsed_base,
            custom_payouts: unparsed_custom,
        },
    }
}

/// Converts each record on its own; failures come back with their index.
fn split_records<T: DeserializeOwned>(
    collection: Collection,
    values: Vec<Value>,
) -> (Vec<T>, Vec<Unparsed>) {
    let mut records = Vec::with_capacity(values.len());
    let mut unparsed = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match T::deserialize(&value) {
            Ok(record) => records.push(record),
            Err(err) => {
                log::warn!(
                    "Keeping {} record #{index} as stored: {err}",
                    collection.name()
                );
                unparsed.push(Unparsed { index, value });
            }
        }
    }
    (records, unparsed)
}

#[derive(Serialize)]
#[serde(untagged)]
enum Entry<'a, T> {
    Record(&'a T),
    Kept(&'a Value),
}

/// Puts kept records back at their old positions. `unparsed` is in index
/// order, as `split_records` produces it; records appended since the load
/// end up after them.
fn interleave<'a, T>(records: &'a [T], unparsed: &'a [Unparsed]) -> Vec<Entry<'a, T>> {
    let mut entries: Vec<Entry<'a, T>> = records.iter().map(Entry::Record).collect();
    for kept in unparsed {
        let at = kept.index.min(entries.len());
        entries.insert(at, Entry::Kept(&kept.value));
    }
    entries
}
