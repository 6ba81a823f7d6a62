use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Constraint priority. Ordered so that `Low < High < Critical`; the SMT
/// tier drops constraints in ascending order when unsatisfiable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSpec {
    Exact(f64),
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl DistanceSpec {
    /// A concrete target distance usable for seeding and nudging.
    pub fn target(&self) -> Option<f64> {
        match self {
            DistanceSpec::Exact(v) => Some(*v),
            DistanceSpec::Range { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
                (Some(lo), None) => Some(*lo),
                (None, Some(hi)) => Some(*hi),
                (None, None) => None,
            },
        }
    }

    pub fn satisfied_by(&self, d: f64, tolerance: f64) -> bool {
        match self {
            DistanceSpec::Exact(v) => (d - v).abs() <= tolerance,
            DistanceSpec::Range { min, max } => {
                min.map_or(true, |lo| d + tolerance >= lo)
                    && max.map_or(true, |hi| d - tolerance <= hi)
            }
        }
    }
}

/// The universal spatial constraint vocabulary. Layout tiers interpret
/// these; interpreters and the planner only emit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintKind {
    AlignedHorizontally { ids: Vec<String> },
    AlignedVertically { ids: Vec<String> },
    Parallel { a: String, b: String },
    Distance { a: String, b: String, spec: DistanceSpec },
    Between { inner: String, first: String, second: String },
    Adjacent { a: String, b: String },
    Above { a: String, b: String, min_gap: f64 },
    Below { a: String, b: String, min_gap: f64 },
    LeftOf { a: String, b: String, min_gap: f64 },
    RightOf { a: String, b: String, min_gap: f64 },
    StackedVertically { ids: Vec<String> },
    StackedHorizontally { ids: Vec<String> },
    Containment { inner: String, outers: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(flatten)]
    pub kind: ConstraintKind,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, priority: Priority) -> Self {
        Self {
            kind,
            priority,
            weight: None,
        }
    }

    pub fn critical(kind: ConstraintKind) -> Self {
        Self::new(kind, Priority::Critical)
    }

    pub fn high(kind: ConstraintKind) -> Self {
        Self::new(kind, Priority::High)
    }

    pub fn low(kind: ConstraintKind) -> Self {
        Self::new(kind, Priority::Low)
    }

    /// All object ids this constraint references.
    pub fn object_ids(&self) -> Vec<&str> {
        match &self.kind {
            ConstraintKind::AlignedHorizontally { ids }
            | ConstraintKind::AlignedVertically { ids }
            | ConstraintKind::StackedVertically { ids }
            | ConstraintKind::StackedHorizontally { ids } => {
                ids.iter().map(String::as_str).collect()
            }
            ConstraintKind::Parallel { a, b }
            | ConstraintKind::Distance { a, b, .. }
            | ConstraintKind::Adjacent { a, b }
            | ConstraintKind::Above { a, b, .. }
            | ConstraintKind::Below { a, b, .. }
            | ConstraintKind::LeftOf { a, b, .. }
            | ConstraintKind::RightOf { a, b, .. } => vec![a, b],
            ConstraintKind::Between {
                inner,
                first,
                second,
            } => vec![inner, first, second],
            ConstraintKind::Containment { inner, outers } => {
                let mut ids: Vec<&str> = vec![inner];
                ids.extend(outers.iter().map(String::as_str));
                ids
            }
        }
    }

    /// The axis a constraint is allowed to move objects along, when it has
    /// a single governed axis. Alignment and vertical ordering govern y;
    /// horizontal ordering governs x. Distance, containment and between
    /// have no single axis.
    pub fn governed_axis(&self) -> Option<Axis> {
        match &self.kind {
            ConstraintKind::AlignedHorizontally { .. }
            | ConstraintKind::Above { .. }
            | ConstraintKind::Below { .. }
            | ConstraintKind::StackedVertically { .. } => Some(Axis::Y),
            ConstraintKind::AlignedVertically { .. }
            | ConstraintKind::LeftOf { .. }
            | ConstraintKind::RightOf { .. }
            | ConstraintKind::StackedHorizontally { .. } => Some(Axis::X),
            _ => None,
        }
    }

    /// True for constraints that relax the pairwise no-overlap default
    /// between the ids they cover.
    pub fn relaxes_overlap(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::Containment { .. } | ConstraintKind::Adjacent { .. }
        )
    }
}

/// Order-insensitive pair key for constraint bookkeeping.
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Pairs covered by an explicit `Distance` constraint. Alignment between
/// any such pair must be skipped: a same-axis alignment would collapse the
/// separation the distance encodes.
pub fn distance_pairs(constraints: &[Constraint]) -> BTreeSet<(String, String)> {
    constraints
        .iter()
        .filter_map(|c| match &c.kind {
            ConstraintKind::Distance { a, b, .. } => Some(pair_key(a, b)),
            _ => None,
        })
        .collect()
}

/// Consecutive pairs of an alignment/stacking id list.
pub fn consecutive_pairs(ids: &[String]) -> Vec<(&str, &str)> {
    ids.windows(2).map(|w| (w[0].as_str(), w[1].as_str())).collect()
}

/// Whether an alignment constraint must defer entirely: true when every
/// consecutive pair it would pin is already governed by a distance
/// constraint, or when any pair is governed (conservative skip for the
/// governed pairs is handled by the solvers via `distance_pairs`).
pub fn alignment_deferred(
    constraint: &Constraint,
    governed: &BTreeSet<(String, String)>,
) -> bool {
    let ids = match &constraint.kind {
        ConstraintKind::AlignedHorizontally { ids } | ConstraintKind::AlignedVertically { ids } => {
            ids
        }
        _ => return false,
    };
    consecutive_pairs(ids)
        .iter()
        .any(|(a, b)| governed.contains(&pair_key(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn align_h(ids: &[&str]) -> Constraint {
        Constraint::high(ConstraintKind::AlignedHorizontally {
            ids: ids.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn distance(a: &str, b: &str, v: f64) -> Constraint {
        Constraint::critical(ConstraintKind::Distance {
            a: a.to_string(),
            b: b.to_string(),
            spec: DistanceSpec::Exact(v),
        })
    }

    #[test]
    fn priority_ordering_supports_drop_order() {
        assert!(Priority::Low < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn alignment_defers_to_distance_on_shared_pair() {
        let constraints = vec![distance("a", "b", 100.0), align_h(&["a", "b"])];
        let governed = distance_pairs(&constraints);
        assert!(alignment_deferred(&constraints[1], &governed));
    }

    #[test]
    fn alignment_not_deferred_without_distance() {
        let constraints = vec![align_h(&["a", "b", "c"])];
        let governed = distance_pairs(&constraints);
        assert!(!alignment_deferred(&constraints[0], &governed));
    }

    #[test]
    fn distance_spec_range_target_midpoint() {
        let spec = DistanceSpec::Range {
            min: Some(10.0),
            max: Some(30.0),
        };
        assert_eq!(spec.target(), Some(20.0));
        assert!(spec.satisfied_by(15.0, 0.5));
        assert!(!spec.satisfied_by(40.0, 0.5));
    }

    #[test]
    fn governed_axis_matches_vocabulary() {
        assert_eq!(align_h(&["a", "b"]).governed_axis(), Some(Axis::Y));
        let left = Constraint::high(ConstraintKind::LeftOf {
            a: "a".into(),
            b: "b".into(),
            min_gap: 5.0,
        });
        assert_eq!(left.governed_axis(), Some(Axis::X));
        assert_eq!(distance("a", "b", 1.0).governed_axis(), None);
    }
}
