//! Cross-source conflict detection
//!
//! Every file in the target must come from exactly one source. Ownership is
//! established by folding over the sources in the order they were given; the
//! first file seen under a second source aborts the fold.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};
use crate::path::{RelativeId, Root};
use crate::scanner::TreeSnapshot;

/// Which source owns each file, by index into the source list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owners: BTreeMap<RelativeId, usize>,
}

impl Ownership {
    /// Index of the source that owns `id`
    pub fn owner(&self, id: &RelativeId) -> Option<usize> {
        self.owners.get(id).copied()
    }

    pub fn contains(&self, id: &RelativeId) -> bool {
        self.owners.contains_key(id)
    }

    /// Union of all source file ids, sorted
    pub fn files(&self) -> impl Iterator<Item = &RelativeId> {
        self.owners.keys()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Assign every source file to its source, failing on the first file that
/// two sources both contain.
pub fn detect_conflicts(sources: &[TreeSnapshot], target: &Root) -> Result<Ownership> {
    sources
        .iter()
        .enumerate()
        .flat_map(|(index, tree)| tree.files.iter().map(move |id| (index, id)))
        .try_fold(BTreeMap::<RelativeId, usize>::new(), |mut owners, (index, id)| {
            match owners.entry(id.clone()) {
                Entry::Occupied(owner) => Err(MirrorError::Conflict {
                    first_source: sources[*owner.get()].root.clone(),
                    second_source: sources[index].root.clone(),
                    target: target.clone(),
                    relative_id: id.clone(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert(index);
                    Ok(owners)
                }
            }
        })
        .map(|owners| Ownership { owners })
}
