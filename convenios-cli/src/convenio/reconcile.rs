//! Surgical save: diff an edited table against its snapshots.
//!
//! Only rows the user could see are eligible for deletion, and only rows
//! whose fields actually changed are rewritten. Rows without an identifier
//! are new and belong to the insert path, never to delete/update.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use super::record::{Record, RecordUpdate};

/// Storage operations needed to bring the table in line with an edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub deletes: BTreeSet<i64>,
    pub updates: Vec<RecordUpdate>,
    /// New rows, attached by the caller from [`new_rows`]
    pub inserts: Vec<Record>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }

    pub fn with_inserts(mut self, inserts: Vec<Record>) -> Self {
        self.inserts = inserts;
        self
    }
}

/// Compute deletes and updates.
///
/// * `edited` - the table after the user's changes
/// * `original` - the full stored table before saving
/// * `snapshot` - the rows visible under the filter when editing began
pub fn reconcile(edited: &[Record], original: &[Record], snapshot: &[Record]) -> ChangeSet {
    let kept: HashSet<i64> = edited.iter().filter_map(|r| r.id).collect();

    let deletes: BTreeSet<i64> = snapshot
        .iter()
        .filter_map(|r| r.id)
        .filter(|id| !kept.contains(id))
        .collect();

    let by_id: HashMap<i64, &Record> = original
        .iter()
        .filter_map(|r| r.id.map(|id| (id, r)))
        .collect();

    let mut updates = Vec::new();
    for row in edited {
        let Some(id) = row.id else { continue };

        let Some(stored) = by_id.get(&id) else {
            log::warn!("Edited row {} no longer exists in storage, skipping", id);
            continue;
        };

        if !row.same_fields(stored) {
            log::debug!("Row {} ('{}') changed, scheduling update", id, row.convenio);
            updates.push(RecordUpdate::from_record(id, row));
        }
    }

    log::info!(
        "Reconciled edit: {} deletes, {} updates",
        deletes.len(),
        updates.len()
    );

    ChangeSet {
        deletes,
        updates,
        inserts: Vec::new(),
    }
}

/// Rows the user added during the session (no identifier yet)
pub fn new_rows(edited: &[Record]) -> Vec<Record> {
    edited
        .iter()
        .filter(|r| r.id.is_none() && !r.convenio.trim().is_empty())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(id: i64, name: &str) -> Record {
        Record::new(name).with_id(id)
    }

    fn table() -> Vec<Record> {
        vec![rec(1, "Banco A"), rec(2, "Banco B"), rec(3, "Banco C")]
    }

    #[test]
    fn test_unchanged_edit_produces_no_operations() {
        let original = table();
        let snapshot = vec![original[0].clone(), original[2].clone()];
        let changes = reconcile(&snapshot, &original, &snapshot);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_deletes_only_visible_rows() {
        let original = table();
        let snapshot = vec![original[0].clone(), original[1].clone()];
        let edited = vec![original[0].clone()];

        let changes = reconcile(&edited, &original, &snapshot);

        assert_eq!(changes.deletes, BTreeSet::from([2]));
        assert!(changes.updates.is_empty());
    }

    #[test]
    fn test_filtered_out_row_survives() {
        let original = table();
        let snapshot = vec![original[0].clone()];
        let edited: Vec<Record> = Vec::new();

        let changes = reconcile(&edited, &original, &snapshot);

        assert_eq!(changes.deletes, BTreeSet::from([1]));
        assert!(!changes.deletes.contains(&2));
        assert!(!changes.deletes.contains(&3));
    }

    #[test]
    fn test_changed_row_is_fully_rewritten() {
        let original = table();
        let snapshot = original.clone();
        let mut edited = original.clone();
        edited[1].data_corte = NaiveDate::from_ymd_opt(2025, 6, 30);

        let changes = reconcile(&edited, &original, &snapshot);

        assert!(changes.deletes.is_empty());
        assert_eq!(changes.updates.len(), 1);
        let update = &changes.updates[0];
        assert_eq!(update.id, 2);
        assert_eq!(update.convenio, "Banco B");
        assert_eq!(update.data_corte, NaiveDate::from_ymd_opt(2025, 6, 30));
    }

    #[test]
    fn test_new_rows_are_ignored_by_reconcile() {
        let original = table();
        let snapshot = original.clone();
        let mut edited = original.clone();
        edited.push(Record::new("Banco Novo"));

        let changes = reconcile(&edited, &original, &snapshot);
        assert!(changes.is_empty());

        let added = new_rows(&edited);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].convenio, "Banco Novo");
    }

    #[test]
    fn test_row_missing_from_storage_is_skipped() {
        let original = vec![rec(1, "Banco A")];
        let snapshot = vec![rec(1, "Banco A"), rec(9, "Banco Sumido")];
        let edited = vec![rec(1, "Banco A"), rec(9, "Banco Sumido Editado")];

        let changes = reconcile(&edited, &original, &snapshot);
        assert!(changes.is_empty());
    }
}
