//! engine::renames
//!
//! RenameUnifier: turns raw diff deltas from the two comparison contexts
//! into logical change entries.
//!
//! # Algorithm
//!
//! 1. Renamed and Copied deltas from the native detector are accepted as
//!    Renamed entries. Their endpoints are removed from the add and
//!    delete candidates.
//! 2. With [`RenamePairing::Order`], remaining add candidates are paired
//!    with remaining deletes one-to-one in list order, up to the shorter
//!    list. Each pair becomes a Renamed entry. This is not a content
//!    match: two unrelated changes that happen to line up get paired.
//! 3. The committed and working contexts are unified independently and
//!    reported side by side. A path renamed in history and again in the
//!    working tree yields two entries.
//! 4. One exception: a path added by an unpushed commit and then renamed
//!    in the working tree is a single working rename. The remote never saw
//!    the added path, so a separate Added entry would count it twice.
//!
//! The incoming context (remote commits not merged yet) is unified the
//! same way but kept apart: it never feeds the change counts.
//!
//! Untracked deltas are add candidates for pairing only. One left unpaired
//! is an undecided file, not an addition.
//!
//! # Invariants
//!
//! - Within one context every path is the `path` of at most one entry
//! - The result depends only on the input order, so unifying the same
//!   deltas twice gives the same entries

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::core::config::RenamePairing;
use crate::core::types::{ChangeEntry, ChangeKind, RepoPath};
use crate::git::{DeltaKind, DiffDelta};

/// Logical changes for one comparison context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub renamed: Vec<ChangeEntry>,
    pub added: Vec<ChangeEntry>,
    pub modified: Vec<ChangeEntry>,
    pub deleted: Vec<ChangeEntry>,
}

impl RenameOutcome {
    /// All entries: renamed, added, modified, deleted.
    pub fn entries(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.renamed
            .iter()
            .chain(&self.added)
            .chain(&self.modified)
            .chain(&self.deleted)
    }

    pub fn len(&self) -> usize {
        self.renamed.len() + self.added.len() + self.modified.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// New paths of renamed entries.
    pub fn rename_targets(&self) -> BTreeSet<RepoPath> {
        self.renamed.iter().map(|e| e.path.clone()).collect()
    }
}

/// Every context for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnifiedChanges {
    /// Local commits not on the remote.
    pub committed: RenameOutcome,
    /// HEAD against the working tree.
    pub working: RenameOutcome,
    /// Remote commits a pull would merge.
    pub incoming: RenameOutcome,
}

impl UnifiedChanges {
    /// Combine the outgoing contexts, folding committed additions that the
    /// working tree has since renamed into the working rename.
    pub fn new(mut committed: RenameOutcome, working: RenameOutcome) -> Self {
        let moved: HashSet<&RepoPath> = working
            .renamed
            .iter()
            .filter_map(|e| e.source.as_ref())
            .collect();
        committed.added.retain(|entry| {
            let folded = moved.contains(&entry.path);
            if folded {
                tracing::debug!(path = %entry.path, "unpushed addition renamed in working tree");
            }
            !folded
        });

        Self {
            committed,
            working,
            incoming: RenameOutcome::default(),
        }
    }

    pub fn with_incoming(mut self, incoming: RenameOutcome) -> Self {
        self.incoming = incoming;
        self
    }

    /// Every outgoing entry, committed context first.
    pub fn entries(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.committed.entries().chain(self.working.entries())
    }

    /// Number of entries of `kind` across both contexts.
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.entries().filter(|e| e.kind == kind).count()
    }

    /// The union of renamed entries, committed first.
    pub fn renamed(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.committed.renamed.iter().chain(&self.working.renamed)
    }
}

/// Unify one context's deltas.
pub fn unify(deltas: &[DiffDelta], pairing: RenamePairing) -> RenameOutcome {
    let mut outcome = RenameOutcome::default();
    let mut claimed: HashSet<&RepoPath> = HashSet::new();

    for delta in deltas {
        if let (DeltaKind::Renamed | DeltaKind::Copied, Some(source)) =
            (delta.kind, delta.source.as_ref())
        {
            if claimed.contains(&delta.path) {
                continue;
            }
            outcome
                .renamed
                .push(ChangeEntry::renamed(source.clone(), delta.path.clone()));
            claimed.insert(&delta.path);
            if delta.kind == DeltaKind::Renamed {
                claimed.insert(source);
            }
        }
    }

    let mut added = Vec::new();
    let mut untracked = Vec::new();
    let mut deleted = Vec::new();
    for delta in deltas {
        if claimed.contains(&delta.path) {
            continue;
        }
        match delta.kind {
            DeltaKind::Added => added.push(&delta.path),
            DeltaKind::Untracked => untracked.push(&delta.path),
            DeltaKind::Deleted => deleted.push(&delta.path),
            DeltaKind::Modified => {
                claimed.insert(&delta.path);
                outcome.modified.push(ChangeEntry::modified(delta.path.clone()));
            }
            DeltaKind::Renamed | DeltaKind::Copied => {
                tracing::debug!(path = %delta.path, "rename delta without a source; treated as added");
                added.push(&delta.path);
            }
        }
    }
    dedup_in_order(&mut added);
    dedup_in_order(&mut untracked);
    dedup_in_order(&mut deleted);

    let mut candidates: Vec<(&RepoPath, bool)> = added
        .iter()
        .map(|p| (*p, true))
        .chain(untracked.iter().map(|p| (*p, false)))
        .collect();

    if pairing == RenamePairing::Order {
        let pairs = candidates.len().min(deleted.len());
        for ((target, _), source) in candidates.drain(..pairs).zip(deleted.drain(..pairs)) {
            tracing::debug!(from = %source, to = %target, "paired add and delete as rename");
            outcome
                .renamed
                .push(ChangeEntry::renamed(source.clone(), target.clone()));
        }
    }

    outcome.added = candidates
        .into_iter()
        .filter(|(_, is_added)| *is_added)
        .map(|(p, _)| ChangeEntry::added(p.clone()))
        .collect();
    outcome.deleted = deleted
        .into_iter()
        .map(|p| ChangeEntry::deleted(p.clone()))
        .collect();
    outcome
}

fn dedup_in_order(paths: &mut Vec<&RepoPath>) {
    let mut seen = HashSet::new();
    paths.retain(|p| seen.insert(*p));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> RepoPath {
        RepoPath::new(s).unwrap()
    }

    fn d(kind: DeltaKind, path: &str) -> DiffDelta {
        DiffDelta::new(kind, p(path))
    }

    fn moved(kind: DeltaKind, from: &str, to: &str) -> DiffDelta {
        DiffDelta::moved(kind, p(from), p(to))
    }

    mod native {
        use super::*;

        #[test]
        fn accepts_native_renames_and_strips_endpoints() {
            let deltas = vec![
                moved(DeltaKind::Renamed, "old.rs", "new.rs"),
                d(DeltaKind::Added, "new.rs"),
                d(DeltaKind::Deleted, "old.rs"),
                d(DeltaKind::Modified, "lib.rs"),
            ];
            let out = unify(&deltas, RenamePairing::Order);

            assert_eq!(out.renamed, vec![ChangeEntry::renamed(p("old.rs"), p("new.rs"))]);
            assert!(out.added.is_empty());
            assert!(out.deleted.is_empty());
            assert_eq!(out.modified, vec![ChangeEntry::modified(p("lib.rs"))]);
        }

        #[test]
        fn copies_reported_as_renames() {
            let deltas = vec![
                d(DeltaKind::Modified, "a.rs"),
                moved(DeltaKind::Copied, "a.rs", "b.rs"),
            ];
            let out = unify(&deltas, RenamePairing::Order);

            assert_eq!(out.renamed, vec![ChangeEntry::renamed(p("a.rs"), p("b.rs"))]);
            assert_eq!(out.modified, vec![ChangeEntry::modified(p("a.rs"))]);
        }
    }

    mod pairing {
        use super::*;

        #[test]
        fn order_pairs_leftovers() {
            let deltas = vec![
                d(DeltaKind::Added, "x.bin"),
                d(DeltaKind::Added, "y.bin"),
                d(DeltaKind::Deleted, "a.bin"),
            ];
            let out = unify(&deltas, RenamePairing::Order);

            assert_eq!(out.renamed, vec![ChangeEntry::renamed(p("a.bin"), p("x.bin"))]);
            assert_eq!(out.added, vec![ChangeEntry::added(p("y.bin"))]);
            assert!(out.deleted.is_empty());
        }

        #[test]
        fn off_keeps_adds_and_deletes() {
            let deltas = vec![d(DeltaKind::Added, "x"), d(DeltaKind::Deleted, "a")];
            let out = unify(&deltas, RenamePairing::Off);

            assert!(out.renamed.is_empty());
            assert_eq!(out.added, vec![ChangeEntry::added(p("x"))]);
            assert_eq!(out.deleted, vec![ChangeEntry::deleted(p("a"))]);
        }

        #[test]
        fn untracked_pairs_after_added_and_never_reported_alone() {
            let deltas = vec![
                d(DeltaKind::Deleted, "a.txt"),
                d(DeltaKind::Untracked, "b.txt"),
                d(DeltaKind::Untracked, "notes.txt"),
            ];
            let out = unify(&deltas, RenamePairing::Order);

            assert_eq!(out.renamed, vec![ChangeEntry::renamed(p("a.txt"), p("b.txt"))]);
            assert!(out.added.is_empty());
            assert!(out.deleted.is_empty());
            assert_eq!(out.len(), 1);
        }

        #[test]
        fn more_deletes_than_adds() {
            let deltas = vec![
                d(DeltaKind::Deleted, "a"),
                d(DeltaKind::Deleted, "b"),
                d(DeltaKind::Added, "c"),
            ];
            let out = unify(&deltas, RenamePairing::Order);

            assert_eq!(out.renamed, vec![ChangeEntry::renamed(p("a"), p("c"))]);
            assert_eq!(out.deleted, vec![ChangeEntry::deleted(p("b"))]);
        }
    }

    mod unified {
        use super::*;

        #[test]
        fn contexts_are_never_merged() {
            let committed = unify(
                &[moved(DeltaKind::Renamed, "a.txt", "b.txt")],
                RenamePairing::Order,
            );
            let working = unify(
                &[moved(DeltaKind::Renamed, "b.txt", "c.txt")],
                RenamePairing::Order,
            );
            let changes = UnifiedChanges::new(committed, working);

            let renamed: Vec<String> = changes.renamed().map(|e| e.to_string()).collect();
            assert_eq!(renamed, vec!["R a.txt -> b.txt", "R b.txt -> c.txt"]);
            assert_eq!(changes.count(ChangeKind::Renamed), 2);
            assert_eq!(changes.count(ChangeKind::Added), 0);
        }

        #[test]
        fn unpushed_addition_renamed_in_working_tree_is_one_rename() {
            let committed = unify(
                &[d(DeltaKind::Added, "a.txt"), d(DeltaKind::Added, "keep.txt")],
                RenamePairing::Order,
            );
            let working = unify(
                &[moved(DeltaKind::Renamed, "a.txt", "b.txt")],
                RenamePairing::Order,
            );
            let changes = UnifiedChanges::new(committed, working);

            let entries: Vec<String> = changes.entries().map(|e| e.to_string()).collect();
            assert_eq!(entries, vec!["A keep.txt", "R a.txt -> b.txt"]);
            assert_eq!(changes.count(ChangeKind::Added), 1);
            assert_eq!(changes.count(ChangeKind::Renamed), 1);
        }

        #[test]
        fn committed_modification_survives_working_rename() {
            let committed = unify(&[d(DeltaKind::Modified, "a.txt")], RenamePairing::Order);
            let working = unify(
                &[moved(DeltaKind::Renamed, "a.txt", "b.txt")],
                RenamePairing::Order,
            );
            let changes = UnifiedChanges::new(committed, working);
            assert_eq!(changes.count(ChangeKind::Modified), 1);
            assert_eq!(changes.count(ChangeKind::Renamed), 1);
        }

        #[test]
        fn incoming_is_not_counted() {
            let incoming = unify(&[d(DeltaKind::Added, "theirs.txt")], RenamePairing::Order);
            let changes = UnifiedChanges::default().with_incoming(incoming);
            assert_eq!(changes.count(ChangeKind::Added), 0);
            assert_eq!(changes.entries().count(), 0);
            assert_eq!(changes.incoming.added.len(), 1);
        }

        #[test]
        fn unify_is_idempotent() {
            let deltas = vec![
                d(DeltaKind::Added, "n1"),
                d(DeltaKind::Deleted, "o1"),
                moved(DeltaKind::Renamed, "o2", "n2"),
                d(DeltaKind::Modified, "m"),
            ];
            assert_eq!(
                unify(&deltas, RenamePairing::Order),
                unify(&deltas, RenamePairing::Order)
            );
        }

        #[test]
        fn targets_listed() {
            let out = unify(
                &[d(DeltaKind::Deleted, "a"), d(DeltaKind::Untracked, "b")],
                RenamePairing::Order,
            );
            assert_eq!(out.rename_targets(), [p("b")].into_iter().collect::<BTreeSet<_>>());
        }
    }
}
