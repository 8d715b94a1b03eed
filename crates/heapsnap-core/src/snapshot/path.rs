use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use super::Snapshot;
use crate::graph::{ObjectId, ReferenceFrom};

/// One hop of a retention path: the object at `address` is held by `edge`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub address: u64,
    pub edge: ReferenceFrom,
}

impl Snapshot {
    /// Shortest chain of incoming references from `address` to a GC root or static.
    ///
    /// Steps run from the queried object outwards; the last step's edge is the
    /// root itself. `None` if the address is not an object of this snapshot.
    pub fn path_to_root(&self, address: u64) -> Option<Vec<PathStep>> {
        let start = self.object_id(address)?;

        // object -> (referencing object, edge used to reach it)
        let mut came_from: HashMap<ObjectId, Option<(ObjectId, &ReferenceFrom)>> = HashMap::new();
        let mut queue = VecDeque::new();
        came_from.insert(start, None);
        queue.push_back(start);

        while let Some(id) = queue.pop_front() {
            let object = &self.objects[id.0];

            if let Some(root) = object.references_from.iter().find(|edge| edge.is_root()) {
                let mut steps = vec![PathStep {
                    address: object.address,
                    edge: root.clone(),
                }];
                let mut current = id;
                while let Some(Some((next, edge))) = came_from.get(&current) {
                    steps.push(PathStep {
                        address: self.objects[next.0].address,
                        edge: (*edge).clone(),
                    });
                    current = *next;
                }
                steps.reverse();
                return Some(steps);
            }

            for edge in &object.references_from {
                let Some(source) = self.object_id(edge.source_address()) else {
                    continue;
                };
                if !came_from.contains_key(&source) {
                    came_from.insert(source, Some((id, edge)));
                    queue.push_back(source);
                }
            }
        }

        None
    }
}
