//! Coverage-layer conflict detection.
//!
//! Two garments conflict when they would have to pass through each other:
//! either they sit on the same layer over a shared part, or one is above the
//! other on some parts and below it on others.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// How two flattened coverage maps relate.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerVerdict {
    /// No covered part in common.
    Disjoint,
    /// Every shared part is ordered the same way.
    Ordered {
        /// Shared parts, sorted.
        shared: Vec<Arc<str>>,
        /// True if the first map is the outer one.
        first_outer: bool,
    },
    /// At least one shared part sits on the same layer in both maps.
    SameLayer {
        /// The offending parts, sorted.
        parts: Vec<Arc<str>>,
    },
    /// Shared parts are ordered inconsistently.
    Phasing {
        /// Parts where the first map is outer.
        first_outer: Vec<Arc<str>>,
        /// Parts where the first map is inner.
        first_inner: Vec<Arc<str>>,
    },
}

impl LayerVerdict {
    /// Returns true for verdicts that allow both items together.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::Disjoint | Self::Ordered { .. })
    }

    /// Describes the verdict, naming the parts involved.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Disjoint => "no shared coverage".to_string(),
            Self::Ordered { shared, first_outer } => format!(
                "{} layer consistently over {}",
                if *first_outer { "first item is the outer" } else { "second item is the outer" },
                join(shared)
            ),
            Self::SameLayer { parts } => format!("same-layer stacking on {}", join(parts)),
            Self::Phasing {
                first_outer,
                first_inner,
            } => format!(
                "phasing violation: first item is outer on {} but inner on {}",
                join(first_outer),
                join(first_inner)
            ),
        }
    }
}

/// Compares two part → layer maps.
///
/// The verdict only depends on shared parts: for each, the sign of
/// `layer_a - layer_b` must be nonzero and the same across all of them.
#[must_use]
pub fn layer_verdict(a: &BTreeMap<Arc<str>, f64>, b: &BTreeMap<Arc<str>, f64>) -> LayerVerdict {
    let mut same = Vec::new();
    let mut outer = Vec::new();
    let mut inner = Vec::new();

    for (part, layer_a) in a {
        let Some(layer_b) = b.get(part) else {
            continue;
        };
        // Numeric comparison: -0.0 and 0.0 are the same layer.
        match layer_a.partial_cmp(layer_b) {
            Some(Ordering::Greater) => outer.push(Arc::clone(part)),
            Some(Ordering::Less) => inner.push(Arc::clone(part)),
            Some(Ordering::Equal) | None => same.push(Arc::clone(part)),
        }
    }

    if !same.is_empty() {
        LayerVerdict::SameLayer { parts: same }
    } else if !outer.is_empty() && !inner.is_empty() {
        LayerVerdict::Phasing {
            first_outer: outer,
            first_inner: inner,
        }
    } else if outer.is_empty() && inner.is_empty() {
        LayerVerdict::Disjoint
    } else {
        let first_outer = !outer.is_empty();
        outer.extend(inner);
        LayerVerdict::Ordered {
            shared: outer,
            first_outer,
        }
    }
}

fn join(parts: &[Arc<str>]) -> String {
    parts.iter().map(|p| &**p).collect::<Vec<&str>>().join(", ")
}
