//! Snapshot differencer
//!
//! Compares two snapshots by object address:
//!
//! 1. **Added**: objects of `after` whose address is absent from `before`
//! 2. **Removed**: objects of `before` whose address is absent from `after`
//! 3. **Pairing**: an added and a removed object of the same type with the same
//!    decoded value cancel out (content reallocated at a new address)
//! 4. **Deltas**: per-type `+1` / `-1` counts, zero deltas dropped, largest first

mod filter;

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::graph::{ManagedObject, ObjectId};
use crate::snapshot::Snapshot;

pub use filter::{AssemblyFilter, TypeFilter};

/// Net change of one type between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDelta {
    pub type_address: u64,
    pub type_name: String,
    pub delta: i64,
}

/// Identity used to pair an added object with a removed one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PairKey {
    Value(String),
    Address(u64),
}

impl PairKey {
    fn of(object: &ManagedObject) -> Self {
        match object.value() {
            Some(value) => PairKey::Value(value.to_string()),
            None => PairKey::Address(object.address()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiffResult<'a> {
    before: &'a Snapshot,
    after: &'a Snapshot,
    /// Ids into `after`
    added: Vec<ObjectId>,
    /// Ids into `before`
    removed: Vec<ObjectId>,
    deltas: HashMap<u64, i64>,
    sorted_deltas: Vec<TypeDelta>,
}

impl<'a> DiffResult<'a> {
    /// Objects only present in the later snapshot
    pub fn added(&self) -> impl Iterator<Item = &'a ManagedObject> + '_ {
        let after = self.after;
        self.added.iter().filter_map(move |&id| after.object_by_id(id))
    }

    /// Objects only present in the earlier snapshot
    pub fn removed(&self) -> impl Iterator<Item = &'a ManagedObject> + '_ {
        let before = self.before;
        self.removed.iter().filter_map(move |&id| before.object_by_id(id))
    }

    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Net delta keyed by type-info address (zero entries removed)
    pub fn delta_map(&self) -> &HashMap<u64, i64> {
        &self.deltas
    }

    pub fn delta_for(&self, type_address: u64) -> Option<i64> {
        self.deltas.get(&type_address).copied()
    }

    /// Deltas sorted by magnitude, largest first
    pub fn deltas(&self) -> &[TypeDelta] {
        &self.sorted_deltas
    }

    pub fn before(&self) -> &'a Snapshot {
        self.before
    }

    pub fn after(&self) -> &'a Snapshot {
        self.after
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare two snapshots, optionally restricted to types accepted by `filter`
pub fn compare<'a>(
    before: &'a Snapshot,
    after: &'a Snapshot,
    filter: Option<&dyn TypeFilter>,
) -> DiffResult<'a> {
    let passes = |snapshot: &Snapshot, object: &ManagedObject| {
        filter.is_none_or(|filter| snapshot.type_of(object).is_some_and(|ty| filter.accepts(ty)))
    };

    let mut added: Vec<ObjectId> = after
        .object_ids()
        .filter(|&id| {
            let object = after.get(id);
            !before.contains(object.address) && passes(after, object)
        })
        .collect();

    let removed_all: Vec<ObjectId> = before
        .object_ids()
        .filter(|&id| {
            let object = before.get(id);
            !after.contains(object.address) && passes(before, object)
        })
        .collect();

    debug!(
        "Diff before pairing: {} added, {} removed",
        added.len(),
        removed_all.len()
    );

    // Removed objects grouped by (type address, pair key), in discovery order
    let mut candidates: HashMap<(u64, PairKey), VecDeque<usize>> = HashMap::new();
    for (position, &id) in removed_all.iter().enumerate() {
        let object = before.get(id);
        candidates
            .entry((type_address(before, object), PairKey::of(object)))
            .or_default()
            .push_back(position);
    }

    let mut cancelled = vec![false; removed_all.len()];
    added.retain(|&id| {
        let object = after.get(id);
        let key = (type_address(after, object), PairKey::of(object));
        match candidates.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(position) => {
                cancelled[position] = true;
                false
            }
            None => true,
        }
    });

    let mut removed: Vec<ObjectId> = removed_all
        .into_iter()
        .zip(cancelled)
        .filter_map(|(id, cancelled)| (!cancelled).then_some(id))
        .collect();

    sort_by_type_then_address(after, &mut added);
    sort_by_type_then_address(before, &mut removed);

    let mut deltas: HashMap<u64, i64> = HashMap::new();
    let mut names: HashMap<u64, String> = HashMap::new();
    for (snapshot, ids, step) in [(after, &added, 1), (before, &removed, -1)] {
        for &id in ids {
            let object = snapshot.get(id);
            let address = type_address(snapshot, object);
            *deltas.entry(address).or_default() += step;
            names
                .entry(address)
                .or_insert_with(|| snapshot.type_name(object).to_string());
        }
    }
    deltas.retain(|_, delta| *delta != 0);

    let mut sorted_deltas: Vec<TypeDelta> = deltas
        .iter()
        .map(|(&type_address, &delta)| TypeDelta {
            type_address,
            type_name: names.remove(&type_address).unwrap_or_default(),
            delta,
        })
        .collect();
    sorted_deltas.sort_by(|a, b| {
        b.delta
            .unsigned_abs()
            .cmp(&a.delta.unsigned_abs())
            .then_with(|| a.type_name.cmp(&b.type_name))
            .then_with(|| a.type_address.cmp(&b.type_address))
    });

    debug!(
        "Diff complete: {} added, {} removed, {} types changed",
        added.len(),
        removed.len(),
        sorted_deltas.len()
    );

    DiffResult {
        before,
        after,
        added,
        removed,
        deltas,
        sorted_deltas,
    }
}

fn type_address(snapshot: &Snapshot, object: &ManagedObject) -> u64 {
    snapshot
        .type_of(object)
        .map_or(0, |ty| ty.type_info_address())
}

fn sort_by_type_then_address(snapshot: &Snapshot, ids: &mut [ObjectId]) {
    ids.sort_by(|&a, &b| {
        let (a, b) = (snapshot.get(a), snapshot.get(b));
        snapshot
            .type_name(a)
            .cmp(snapshot.type_name(b))
            .then_with(|| a.address().cmp(&b.address()))
    });
}
