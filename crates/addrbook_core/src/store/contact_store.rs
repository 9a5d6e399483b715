//! Contact repository contract and JSON file-backed implementation.
//!
//! # Responsibility
//! - Provide find/upsert/delete over the canonical contact collection.
//! - Keep the on-disk format (`{"contacts": [...]}`) inside this module.
//!
//! # Invariants
//! - Identity resolution order is: id match, then email match, then insert.
//! - Matched records keep their existing id; their other fields are fully
//!   replaced by the incoming values, empty values included.
//! - Every mutation rewrites the whole file through a temp file + rename.

use crate::model::contact::{
    new_contact_id, normalize_email, ContactField, ContactId, ContactRecord,
};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure while writing the store file.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "store write failed: {err}"),
            Self::Serialize(err) => write!(f, "store serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// How `upsert` resolved the identity of an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityResolution {
    /// Incoming id matched an existing record.
    MatchedId,
    /// Incoming email matched an existing record; its id was kept.
    MatchedEmail,
    /// No match; a new record with a fresh id was appended.
    Created,
}

/// Result of one successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Id of the stored record after the upsert.
    pub id: ContactId,
    pub resolution: IdentityResolution,
}

impl UpsertOutcome {
    pub fn is_created(&self) -> bool {
        self.resolution == IdentityResolution::Created
    }
}

/// Repository interface used by import orchestration.
pub trait ContactRepository {
    fn all(&self) -> &[ContactRecord];
    fn find_by_id(&self, id: &str) -> Option<&ContactRecord>;
    fn find_by_email(&self, email: &str) -> Option<&ContactRecord>;
    fn upsert(&mut self, incoming: ContactRecord) -> StoreResult<UpsertOutcome>;
    fn delete_by_id(&mut self, id: &str) -> StoreResult<bool>;
}

impl<R: ContactRepository + ?Sized> ContactRepository for &mut R {
    fn all(&self) -> &[ContactRecord] {
        (**self).all()
    }

    fn find_by_id(&self, id: &str) -> Option<&ContactRecord> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> Option<&ContactRecord> {
        (**self).find_by_email(email)
    }

    fn upsert(&mut self, incoming: ContactRecord) -> StoreResult<UpsertOutcome> {
        (**self).upsert(incoming)
    }

    fn delete_by_id(&mut self, id: &str) -> StoreResult<bool> {
        (**self).delete_by_id(id)
    }
}

#[derive(Serialize)]
struct StoreFile<'a> {
    contacts: &'a [ContactRecord],
}

/// JSON file-backed contact store.
///
/// One instance owns one path; callers must not share a path between
/// concurrently mutating instances.
#[derive(Debug, Clone)]
pub struct ContactStore {
    path: Option<PathBuf>,
    contacts: Vec<ContactRecord>,
}

impl ContactStore {
    /// Loads the store at `path`, repairing missing or duplicate ids.
    ///
    /// Missing, unreadable or malformed files yield an empty store. When ids
    /// were repaired the store is written back immediately; a failure of that
    /// write is logged and the in-memory store stays usable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            path: Some(path.into()),
            contacts: Vec::new(),
        };
        store.reload();
        store
    }

    /// Creates a store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            contacts: Vec::new(),
        }
    }

    /// Re-reads the backing file, discarding in-memory state.
    pub fn reload(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let started_at = Instant::now();

        self.contacts = read_contacts(&path);
        let repaired = repair_ids(&mut self.contacts);

        info!(
            "event=store_load module=store status=ok contacts={} repaired_ids={} duration_ms={}",
            self.contacts.len(),
            repaired,
            started_at.elapsed().as_millis()
        );

        if repaired > 0 {
            if let Err(err) = self.save() {
                error!(
                    "event=store_repair module=store status=error error_code=store_write_failed error={err}"
                );
            }
        }
    }

    /// Writes the whole store atomically.
    ///
    /// # Errors
    /// Returns `StoreError` when serialization, the temp write or the final
    /// rename fails. The previous file is left untouched in that case.
    pub fn save(&self) -> StoreResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let started_at = Instant::now();

        match write_atomically(path, &self.contacts) {
            Ok(()) => {
                info!(
                    "event=store_save module=store status=ok contacts={} duration_ms={}",
                    self.contacts.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts ordered by `last_used` descending; ties keep storage order.
    pub fn recent_first(&self) -> Vec<&ContactRecord> {
        let mut ordered: Vec<&ContactRecord> = self.contacts.iter().collect();
        ordered.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        ordered
    }

    /// Sets the advisory `last_used` timestamp of one contact.
    ///
    /// Returns `Ok(false)` when no contact has this id.
    pub fn touch(&mut self, id: &str, timestamp: impl Into<String>) -> StoreResult<bool> {
        let Some(index) = self.position_by_id(id) else {
            return Ok(false);
        };
        let timestamp = timestamp.into();
        self.mutate(|contacts| {
            contacts[index].last_used = timestamp;
            true
        })
    }

    /// Deletes the first contact whose email matches, if any.
    pub fn delete_by_email(&mut self, email: &str) -> StoreResult<bool> {
        let Some(id) = self.find_by_email(email).map(|contact| contact.id.clone()) else {
            return Ok(false);
        };
        self.delete_by_id(&id)
    }

    fn position_by_id(&self, id: &str) -> Option<usize> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        self.contacts
            .iter()
            .position(|contact| contact.id.trim() == id)
    }

    fn position_by_email(&self, email: &str) -> Option<usize> {
        let email = normalize_email(email);
        if email.is_empty() {
            return None;
        }
        self.contacts
            .iter()
            .position(|contact| normalize_email(&contact.email) == email)
    }

    fn fresh_id(&self) -> ContactId {
        loop {
            let id = new_contact_id();
            if self.position_by_id(&id).is_none() {
                return id;
            }
        }
    }

    /// Applies `change`, persists, and restores the previous state on failure.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Vec<ContactRecord>) -> T) -> StoreResult<T> {
        let snapshot = self.contacts.clone();
        let value = change(&mut self.contacts);
        if let Err(err) = self.save() {
            self.contacts = snapshot;
            return Err(err);
        }
        Ok(value)
    }
}

impl ContactRepository for ContactStore {
    fn all(&self) -> &[ContactRecord] {
        &self.contacts
    }

    fn find_by_id(&self, id: &str) -> Option<&ContactRecord> {
        self.position_by_id(id).map(|index| &self.contacts[index])
    }

    fn find_by_email(&self, email: &str) -> Option<&ContactRecord> {
        self.position_by_email(email)
            .map(|index| &self.contacts[index])
    }

    fn upsert(&mut self, mut incoming: ContactRecord) -> StoreResult<UpsertOutcome> {
        incoming.id = incoming.id.trim().to_string();
        incoming.email = normalize_email(&incoming.email);

        let matched = match self.position_by_id(&incoming.id) {
            Some(index) => Some((index, IdentityResolution::MatchedId)),
            None => self
                .position_by_email(&incoming.email)
                .map(|index| (index, IdentityResolution::MatchedEmail)),
        };

        if let Some((index, resolution)) = matched {
            let id = self.contacts[index].id.clone();
            self.mutate(|contacts| contacts[index].replace_fields_from(&incoming))?;
            return Ok(UpsertOutcome { id, resolution });
        }

        let id = self.fresh_id();
        incoming.id = id.clone();
        self.mutate(|contacts| contacts.push(incoming))?;
        Ok(UpsertOutcome {
            id,
            resolution: IdentityResolution::Created,
        })
    }

    fn delete_by_id(&mut self, id: &str) -> StoreResult<bool> {
        let id = id.trim().to_string();
        self.mutate(|contacts| {
            let before = contacts.len();
            contacts.retain(|contact| contact.id.trim() != id);
            contacts.len() != before
        })
    }
}

fn read_contacts(path: &Path) -> Vec<ContactRecord> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("event=store_load module=store status=missing mode=file");
            return Vec::new();
        }
        Err(err) => {
            warn!(
                "event=store_load module=store status=degraded error_code=store_read_failed error={err}"
            );
            return Vec::new();
        }
    };

    let document: Value = match serde_json::from_str(&raw) {
        Ok(document) => document,
        Err(err) => {
            warn!(
                "event=store_load module=store status=degraded error_code=store_parse_failed error={err}"
            );
            return Vec::new();
        }
    };

    let Some(entries) = document.get("contacts").and_then(Value::as_array) else {
        warn!("event=store_load module=store status=degraded error_code=store_shape_invalid");
        return Vec::new();
    };

    let mut contacts = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(fields) = entry.as_object() else {
            warn!("event=store_load module=store status=skipped index={index} reason=not_object");
            continue;
        };
        match serde_json::from_value::<ContactRecord>(Value::Object(canonical_keys(fields))) {
            Ok(contact) => contacts.push(contact),
            Err(err) => {
                warn!("event=store_load module=store status=skipped index={index} error={err}");
            }
        }
    }
    contacts
}

/// Renames legacy keys to canonical ones; the canonical key wins when an
/// entry carries both.
fn canonical_keys(fields: &Map<String, Value>) -> Map<String, Value> {
    let mut canonical = fields.clone();
    let renames = ContactField::ALL
        .iter()
        .map(|field| (field.legacy_key(), field.name()))
        .chain([("_id", "id")]);
    for (legacy, name) in renames {
        if legacy == name {
            continue;
        }
        if let Some(value) = canonical.remove(legacy) {
            canonical.entry(name.to_string()).or_insert(value);
        }
    }
    canonical
}

/// Assigns fresh ids to records with empty or duplicate ids.
fn repair_ids(contacts: &mut [ContactRecord]) -> usize {
    let mut seen: HashSet<String> = contacts
        .iter()
        .map(|contact| contact.id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let mut first_owner: HashSet<String> = HashSet::new();
    let mut repaired = 0;

    for contact in contacts.iter_mut() {
        let id = contact.id.trim().to_string();
        if !id.is_empty() && first_owner.insert(id) {
            continue;
        }
        let mut fresh = new_contact_id();
        while !seen.insert(fresh.clone()) {
            fresh = new_contact_id();
        }
        contact.id = fresh;
        repaired += 1;
    }

    repaired
}

fn write_atomically(path: &Path, contacts: &[ContactRecord]) -> StoreResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, &StoreFile { contacts })?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}
