//! Relationships between clusters, and aggregate statistics.

use serde::{Deserialize, Serialize};

use super::bitset::BitSet;

/// How two clusters with shared items relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// The cluster is properly contained in the related one.
    Subset,
    /// The cluster properly contains the related one.
    Superset,
    /// They share items but neither contains the other.
    Overlap,
}

/// A relationship between two returned clusters, by position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRelationship {
    /// Position of the cluster.
    pub cluster_id: usize,
    /// Position of the related cluster.
    pub related_cluster_id: usize,
    /// How `cluster_id` relates to `related_cluster_id`.
    pub relationship_type: RelationshipType,
    /// Number of shared items.
    pub overlap_size: usize,
}

/// One record per pair of sets with a non-empty intersection, with
/// `cluster_id < related_cluster_id`.
pub(crate) fn relationships(sets: &[BitSet]) -> Vec<ClusterRelationship> {
    let sizes: Vec<usize> = sets.iter().map(BitSet::len).collect();
    let mut out = Vec::new();

    for (i, a) in sets.iter().enumerate() {
        for (j, b) in sets.iter().enumerate().skip(i + 1) {
            let overlap_size = a.intersection_len(b);
            if overlap_size == 0 {
                continue;
            }
            let relationship_type = if overlap_size == sizes[i] && sizes[i] < sizes[j] {
                RelationshipType::Subset
            } else if overlap_size == sizes[j] && sizes[j] < sizes[i] {
                RelationshipType::Superset
            } else {
                RelationshipType::Overlap
            };
            out.push(ClusterRelationship {
                cluster_id: i,
                related_cluster_id: j,
                relationship_type,
                overlap_size,
            });
        }
    }
    out
}

/// Aggregate statistics over a cluster list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Aggregates {
    pub total: usize,
    pub max_size: usize,
    pub avg_size: f64,
    pub items_covered: usize,
}

pub(crate) fn aggregates(sets: &[BitSet], capacity: usize) -> Aggregates {
    let mut union = BitSet::new(capacity);
    let mut max_size = 0;
    let mut sum = 0;
    for set in sets {
        let size = set.len();
        max_size = max_size.max(size);
        sum += size;
        union.union_with(set);
    }

    #[allow(clippy::cast_precision_loss)]
    let avg_size = if sets.is_empty() {
        0.0
    } else {
        sum as f64 / sets.len() as f64
    };

    Aggregates {
        total: sets.len(),
        max_size,
        avg_size,
        items_covered: union.len(),
    }
}
