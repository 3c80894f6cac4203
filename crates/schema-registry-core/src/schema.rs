//! The registry data model (§3): `SchemaRecord`, `SchemaReference`,
//! `Subject`, and `VersionEntry`.

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::types::SchemaType;

/// A named pointer from one schema to another, resolved at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReference {
    pub name: String,
    pub subject: String,
    pub version: i32,
}

/// A globally identified, canonicalized schema body. Immutable once
/// created; shared by id across every subject version that points at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub id: i64,
    pub schema_type: SchemaType,
    pub canonical_text: String,
    #[serde(skip)]
    pub fingerprint: Fingerprint,
    pub references: Vec<SchemaReference>,
}

/// One entry in a subject's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version_number: i32,
    pub schema_id: i64,
    pub deleted: bool,
}

/// A named evolution channel, qualified by context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub context: String,
    pub name: String,
    pub versions: Vec<VersionEntry>,
    pub deleted: bool,
    /// High-water mark for version numbers, independent of `versions`'
    /// live contents: permanently deleting the highest-numbered version
    /// must not free its number for reuse.
    #[serde(default = "Subject::default_next_version")]
    next_version: i32,
}

impl Subject {
    fn default_next_version() -> i32 {
        1
    }

    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            name: name.into(),
            versions: Vec::new(),
            deleted: false,
            next_version: Self::default_next_version(),
        }
    }

    /// Versions visible under default listing rules (`deleted=false`
    /// widens nothing; soft-deleted entries are always excluded here).
    pub fn visible_versions(&self, include_deleted: bool) -> impl Iterator<Item = &VersionEntry> {
        self.versions
            .iter()
            .filter(move |v| include_deleted || !v.deleted)
    }

    pub fn latest_visible(&self, include_deleted: bool) -> Option<&VersionEntry> {
        self.visible_versions(include_deleted)
            .max_by_key(|v| v.version_number)
    }

    pub fn get_version(&self, version_number: i32) -> Option<&VersionEntry> {
        self.versions
            .iter()
            .find(|v| v.version_number == version_number)
    }

    /// The version number the next `append_version` call will assign,
    /// without assigning it. Derived from the persisted high-water mark,
    /// never from the live `versions` list, so permanently deleting the
    /// newest version never frees its number for reuse.
    pub fn next_version_number(&self) -> i32 {
        self.next_version
    }

    /// Appends a new version pointing at `schema_id` and returns the
    /// version number it was assigned, bumping the high-water mark.
    pub fn append_version(&mut self, schema_id: i64) -> i32 {
        let version_number = self.next_version;
        self.next_version += 1;
        self.versions.push(VersionEntry {
            version_number,
            schema_id,
            deleted: false,
        });
        version_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(version_number: i32, schema_id: i64, deleted: bool) -> VersionEntry {
        VersionEntry {
            version_number,
            schema_id,
            deleted,
        }
    }

    #[test]
    fn next_version_number_starts_at_one() {
        let subject = Subject::new(".", "orders-value");
        assert_eq!(subject.next_version_number(), 1);
    }

    #[test]
    fn next_version_number_never_reuses_deleted_numbers() {
        let mut subject = Subject::new(".", "orders-value");
        subject.append_version(100);
        subject.append_version(101);
        assert_eq!(subject.next_version_number(), 3);
    }

    #[test]
    fn permanently_deleting_the_newest_version_does_not_free_its_number() {
        let mut subject = Subject::new(".", "orders-value");
        subject.append_version(100);
        subject.append_version(101);
        subject.append_version(102);
        // Permanent delete removes the entry outright, as
        // `MemoryEngine::delete_version` does.
        subject.versions.retain(|v| v.version_number != 3);
        assert_eq!(subject.versions.len(), 2);
        assert_eq!(subject.append_version(103), 4);
    }

    #[test]
    fn latest_visible_excludes_deleted_by_default() {
        let mut subject = Subject::new(".", "orders-value");
        subject.versions.push(entry(1, 100, false));
        subject.versions.push(entry(2, 101, true));
        let latest = subject.latest_visible(false).unwrap();
        assert_eq!(latest.version_number, 1);
        let latest_incl = subject.latest_visible(true).unwrap();
        assert_eq!(latest_incl.version_number, 2);
    }

    proptest! {
        /// Version numbers are strictly monotonic regardless of which
        /// versions get permanently removed along the way (§8 invariant:
        /// deletions never cause reuse).
        #[test]
        fn version_numbers_are_monotonic_despite_deletions(
            permanent_delete_mask in prop::collection::vec(any::<bool>(), 1..10),
        ) {
            let mut subject = Subject::new(".", "orders-value");
            let mut assigned = Vec::new();
            for (i, delete_it) in permanent_delete_mask.iter().enumerate() {
                let version = subject.append_version(100 + i as i64);
                assigned.push(version);
                if *delete_it {
                    subject.versions.retain(|v| v.version_number != version);
                }
            }
            for pair in assigned.windows(2) {
                prop_assert!(pair[1] > pair[0]);
            }
        }
    }
}
