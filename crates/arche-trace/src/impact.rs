//! Impact analysis and dependency matrix report types.
//!
//! An [`ImpactReport`] describes everything reachable from a seed set over
//! filtered trace edges, with the depth and edge through which each object
//! was first reached. A [`DependencyMatrix`] records direct dependencies
//! between two ordered object lists, as rendered in traceability tables.

use serde::{Deserialize, Serialize};

use arche_types::ObjectId;

use crate::edge::TraceEdge;

/// One object reached during impact analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactEntry {
    /// The affected object.
    pub id: ObjectId,
    /// Number of trace hops from the nearest seed (1 = direct).
    pub depth: usize,
    /// The edge through which the object was first discovered.
    pub via: TraceEdge,
}

/// Result of an impact analysis over a seed set.
///
/// Entries are in discovery order. Seeds never appear in `affected`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// The seed objects, de-duplicated, in the order given.
    pub seeds: Vec<ObjectId>,
    /// Indirectly affected objects.
    pub affected: Vec<ImpactEntry>,
    /// Deepest hop count reached.
    pub cascade_depth: usize,
}

impl ImpactReport {
    pub fn new(seeds: Vec<ObjectId>) -> Self {
        Self {
            seeds,
            affected: Vec::new(),
            cascade_depth: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.affected.len()
    }

    /// Returns `true` if nothing beyond the seeds is affected.
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }

    /// Affected identifiers in discovery order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.affected.iter().map(|e| e.id).collect()
    }

    /// Affected objects reached directly from a seed.
    pub fn direct(&self) -> impl Iterator<Item = &ImpactEntry> {
        self.affected.iter().filter(|e| e.depth == 1)
    }

    /// Reconstruct the chain of edges from a seed to `id`, seed first.
    pub fn path_to(&self, id: &ObjectId) -> Option<Vec<&TraceEdge>> {
        let mut path = Vec::new();
        let mut current = *id;
        loop {
            let entry = self.affected.iter().find(|e| e.id == current)?;
            path.push(&entry.via);
            if entry.depth == 1 {
                break;
            }
            current = entry.via.source;
        }
        path.reverse();
        Some(path)
    }
}

/// Direct-dependency matrix between two ordered object lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyMatrix {
    pub rows: Vec<ObjectId>,
    pub columns: Vec<ObjectId>,
    /// `cells[r][c]` is `true` when `rows[r]` traces to `columns[c]`.
    pub cells: Vec<Vec<bool>>,
}

impl DependencyMatrix {
    /// Cell value by position. Out-of-range positions read as `false`.
    pub fn get(&self, row: usize, column: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(false)
    }

    /// Cell value by object identifiers.
    pub fn depends(&self, row: &ObjectId, column: &ObjectId) -> bool {
        let r = self.rows.iter().position(|id| id == row);
        let c = self.columns.iter().position(|id| id == column);
        match (r, c) {
            (Some(r), Some(c)) => self.get(r, c),
            _ => false,
        }
    }

    /// Number of `true` cells.
    pub fn count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| **c).count()
    }

    /// Rows with no dependency at all (uncovered items in a trace matrix).
    pub fn uncovered_rows(&self) -> Vec<ObjectId> {
        self.rows
            .iter()
            .zip(&self.cells)
            .filter(|(_, cells)| !cells.iter().any(|c| *c))
            .map(|(id, _)| *id)
            .collect()
    }
}
