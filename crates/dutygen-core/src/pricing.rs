use crate::error::PricingError;
use crate::graph::{NodeId, TransferGraph, TripNode};
use crate::rules::DutyRules;
use crate::trip::{Minutes, TripId, TripTable};

/// Values closer than this are ties
const VALUE_TOLERANCE: f64 = 1e-9;

/// Best known duty suffix starting at a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label {
    /// Sum of the dual prices of the suffix's trips, this node included
    pub value: f64,
    /// End of the suffix's last trip
    pub end: Minutes,
    /// End of the suffix's opening driving block (up to its first break)
    pub opening_end: Minutes,
    /// Next node on the suffix; the sink for single-trip suffixes
    pub next: NodeId,
}

/// Per-node labels of one pricing run, indexed by [`NodeId`].
///
/// Owned by the caller and lent to [`PricingSolver::price`] for each call.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: Vec<Option<Label>>,
}

impl LabelTable {
    pub fn new(graph: &TransferGraph) -> Self {
        Self {
            labels: vec![None; graph.node_count()],
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&Label> {
        self.labels.get(node.index()).and_then(Option::as_ref)
    }

    fn reset(&mut self, size: usize) {
        self.labels.clear();
        self.labels.resize(size, None);
    }

    fn set(&mut self, node: NodeId, label: Label) {
        self.labels[node.index()] = Some(label);
    }
}

/// A duty found by the pricing run
#[derive(Debug, Clone, PartialEq)]
pub struct PricedDuty {
    /// Graph nodes in driving order
    pub nodes: Vec<TripNode>,
    /// Sum of the dual prices of the covered trips
    pub price: f64,
}

impl PricedDuty {
    pub fn trips(&self) -> Vec<TripId> {
        self.nodes.iter().map(|n| n.trip()).collect()
    }

    /// Reduced cost of the duty as a unit-cost master column
    pub fn reduced_cost(&self) -> f64 {
        1.0 - self.price
    }
}

/// Longest-path dynamic program over the transfer graph under the duty rules
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingSolver {
    rules: DutyRules,
}

impl PricingSolver {
    pub fn new(rules: DutyRules) -> Self {
        Self { rules }
    }

    /// Find the legal duty with the highest dual price.
    ///
    /// Nodes are labeled in reverse time order. Each node keeps a single label:
    /// the best legal continuation among its successors, ties broken by the
    /// shorter suffix and then by successor order. Returns `None` for an
    /// empty graph.
    pub fn price(
        &self,
        graph: &TransferGraph,
        trips: &TripTable,
        duals: &[f64],
        labels: &mut LabelTable,
    ) -> Result<Option<PricedDuty>, PricingError> {
        if duals.len() != trips.len() {
            return Err(PricingError::DualLength {
                expected: trips.len(),
                found: duals.len(),
            });
        }
        labels.reset(graph.node_count());

        for &node in graph.topological_order().iter().rev() {
            let Some(trip_node) = graph.trip_node(node) else {
                continue;
            };
            let trip = trips.get(trip_node.trip());
            let price = duals[trip.id.index()];

            let mut best: Option<Label> = None;
            let mut reaches_sink = false;
            for &succ in graph.successors(node) {
                let candidate = if succ == NodeId::SINK {
                    reaches_sink = true;
                    Some(Label {
                        value: price,
                        end: trip.end,
                        opening_end: trip.end,
                        next: NodeId::SINK,
                    })
                } else {
                    self.extend(graph, trips, node, succ, labels, price)
                };
                if let Some(candidate) = candidate {
                    if best.is_none_or(|b| is_better(&candidate, &b)) {
                        best = Some(candidate);
                    }
                }
            }

            if !reaches_sink {
                return Err(PricingError::MissingSinkEdge(trip_node));
            }
            if let Some(label) = best {
                labels.set(node, label);
            }
        }

        // Best start among the source's successors
        let mut start: Option<(NodeId, Label, Minutes)> = None;
        for &first in graph.successors(NodeId::SOURCE) {
            let (Some(label), Some(trip_node)) = (labels.get(first), graph.trip_node(first)) else {
                continue;
            };
            let duration = label.end - trips.get(trip_node.trip()).start;
            let better = match &start {
                None => true,
                Some((_, b, d)) => {
                    label.value > b.value + VALUE_TOLERANCE
                        || (label.value >= b.value - VALUE_TOLERANCE && duration < *d)
                }
            };
            if better {
                start = Some((first, *label, duration));
            }
        }
        let Some((first, label, _)) = start else {
            return Ok(None);
        };

        let nodes = reconstruct(graph, labels, first)?;
        Ok(Some(PricedDuty {
            nodes,
            price: label.value,
        }))
    }

    /// Label of `from` when continued by `to`'s label, if the result is legal
    fn extend(
        &self,
        graph: &TransferGraph,
        trips: &TripTable,
        from: NodeId,
        to: NodeId,
        labels: &LabelTable,
        price: f64,
    ) -> Option<Label> {
        let suffix = labels.get(to)?;
        let head = trips.get(graph.trip_node(from)?.trip());
        let next = trips.get(graph.trip_node(to)?.trip());

        if suffix.end - head.start > self.rules.max_span {
            return None;
        }

        let opening_end = if self.rules.is_break(next.start - head.end) {
            // The successor's opening block now follows a break
            if suffix.opening_end - next.start > self.rules.max_continuous_driving {
                return None;
            }
            head.end
        } else {
            suffix.opening_end
        };

        Some(Label {
            value: price + suffix.value,
            end: suffix.end,
            opening_end,
            next: to,
        })
    }
}

/// Higher value wins; on a tie the shorter suffix; otherwise the earlier candidate stays
fn is_better(candidate: &Label, best: &Label) -> bool {
    if candidate.value > best.value + VALUE_TOLERANCE {
        return true;
    }
    candidate.value >= best.value - VALUE_TOLERANCE && candidate.end < best.end
}

fn reconstruct(
    graph: &TransferGraph,
    labels: &LabelTable,
    first: NodeId,
) -> Result<Vec<TripNode>, PricingError> {
    let mut nodes = Vec::new();
    let mut seen = vec![false; graph.node_count()];
    let mut current = first;
    while current != NodeId::SINK {
        let Some(trip_node) = graph.trip_node(current) else {
            break;
        };
        let trip = trip_node.trip();
        if seen[trip.index()] {
            return Err(PricingError::RepeatedTrip(trip));
        }
        seen[trip.index()] = true;
        nodes.push(trip_node);
        match labels.get(current) {
            Some(label) => current = label.next,
            None => return Err(PricingError::MissingSinkEdge(trip_node)),
        }
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DriverMode, GraphBuilder};
    use crate::trip::fixtures::table;
    use crate::trip::Trip;
    use proptest::prelude::*;

    fn price(
        mode: DriverMode,
        rows: &[(&str, Minutes, Minutes, u32, u32)],
        duals: &[f64],
    ) -> (TripTable, Option<PricedDuty>) {
        let trips = table(rows);
        let graph = GraphBuilder::new(mode, DutyRules::default()).build(&trips).unwrap();
        let mut labels = LabelTable::new(&graph);
        let duty = PricingSolver::new(DutyRules::default())
            .price(&graph, &trips, duals, &mut labels)
            .unwrap();
        (trips, duty)
    }

    #[test]
    fn test_empty_graph_prices_nothing() {
        let (_, duty) = price(DriverMode::Single, &[], &[]);
        assert_eq!(duty, None);
    }

    #[test]
    fn test_chain_without_gaps() {
        let rows = [
            ("a", 0, 125, 1, 2),
            ("a", 125, 250, 2, 1),
            ("a", 250, 375, 1, 2),
            ("a", 375, 500, 2, 1),
        ];
        let (_, duty) = price(DriverMode::Single, &rows, &[1.0; 4]);
        let duty = duty.unwrap();

        assert_eq!(duty.trips(), vec![TripId(0), TripId(1), TripId(2), TripId(3)]);
        assert!((duty.price - 4.0).abs() < 1e-12);
        assert!((duty.reduced_cost() + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_span_cap_splits_pair() {
        // 30 minute break, 560 minutes overall
        let (_, duty) = price(
            DriverMode::Single,
            &[("a", 0, 320, 1, 2), ("a", 350, 560, 2, 1)],
            &[1.0, 1.0],
        );
        let duty = duty.unwrap();
        assert_eq!(duty.nodes.len(), 1);
        assert!((duty.price - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_block_after_break_is_capped() {
        // Break after the first trip, then 250 minutes of driving
        let rows = [("a", 0, 60, 1, 2), ("a", 90, 200, 2, 1), ("a", 210, 340, 1, 2)];
        let (_, duty) = price(DriverMode::Single, &rows, &[1.0, 1.0, 1.0]);
        let duty = duty.unwrap();

        // Trip 1 keeps trip 2 in its label, so trip 0 cannot join after its break
        assert_eq!(duty.nodes.len(), 2);
        assert_eq!(duty.trips(), vec![TripId(1), TripId(2)]);
    }

    #[test]
    fn test_tie_prefers_shorter_duty() {
        // Trip 2 has a zero dual: stopping after trip 1 prices the same and is shorter
        let rows = [("a", 0, 60, 1, 2), ("a", 60, 120, 2, 1), ("a", 120, 180, 1, 2)];
        let (_, duty) = price(DriverMode::Single, &rows, &[0.7, 0.7, 0.0]);
        assert_eq!(duty.unwrap().trips(), vec![TripId(0), TripId(1)]);
    }

    #[test]
    fn test_negative_duals_are_skipped_at_the_end() {
        let rows = [("a", 0, 60, 1, 2), ("a", 60, 120, 2, 1)];
        let (_, duty) = price(DriverMode::Single, &rows, &[1.0, -0.5]);
        assert_eq!(duty.unwrap().trips(), vec![TripId(0)]);
    }

    #[test]
    fn test_relay_uses_one_handover() {
        let rows = [
            ("a", 0, 100, 1, 2),
            ("b", 100, 200, 2, 3),
            ("b", 200, 300, 3, 4),
            ("a", 100, 150, 2, 7),
        ];
        let (_, duty) = price(DriverMode::Relay, &rows, &[1.0, 1.0, 1.0, 0.1]);
        let duty = duty.unwrap();

        assert_eq!(
            duty.nodes,
            vec![
                TripNode::Primary(TripId(0)),
                TripNode::Secondary(TripId(1)),
                TripNode::Secondary(TripId(2)),
            ]
        );
        assert!((duty.price - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_dual_length() {
        let trips = table(&[("a", 0, 10, 1, 1)]);
        let graph = GraphBuilder::default().build(&trips).unwrap();
        let mut labels = LabelTable::new(&graph);
        let err = PricingSolver::default()
            .price(&graph, &trips, &[], &mut labels)
            .unwrap_err();
        assert_eq!(err, PricingError::DualLength { expected: 1, found: 0 });
    }

    fn arb_rows() -> impl Strategy<Value = Vec<(u8, i64, i64, u32, u32)>> {
        prop::collection::vec((0u8..3, 0i64..60, 5i64..150, 1u32..4, 1u32..4), 1..12)
    }

    /// Give every vehicle's trips increasing start times from random gaps and durations
    fn to_table(rows: &[(u8, i64, i64, u32, u32)]) -> TripTable {
        let mut clock = [0i64; 3];
        let owned: Vec<(String, i64, i64, u32, u32)> = rows
            .iter()
            .map(|&(v, gap, len, o, d)| {
                let start = clock[v as usize] + gap;
                clock[v as usize] = start + len;
                (format!("v{}", v), start, start + len, o, d)
            })
            .collect();
        let borrowed: Vec<(&str, i64, i64, u32, u32)> = owned
            .iter()
            .map(|(v, s, e, o, d)| (v.as_str(), *s, *e, *o, *d))
            .collect();
        table(&borrowed)
    }

    proptest! {
        #[test]
        fn prop_priced_duty_is_legal_and_deterministic(
            rows in arb_rows(),
            raw_duals in prop::collection::vec(-1.0f64..1.5, 12),
            relay in any::<bool>(),
        ) {
            let trips = to_table(&rows);
            let mode = if relay { DriverMode::Relay } else { DriverMode::Single };
            let rules = DutyRules::default();
            let graph = GraphBuilder::new(mode, rules).build(&trips).unwrap();
            let duals = &raw_duals[..trips.len()];
            let solver = PricingSolver::new(rules);

            let mut labels = LabelTable::new(&graph);
            let first = solver.price(&graph, &trips, duals, &mut labels).unwrap().unwrap();
            let mut fresh = LabelTable::new(&graph);
            let second = solver.price(&graph, &trips, duals, &mut fresh).unwrap().unwrap();
            prop_assert_eq!(&first, &second);

            let sequence: Vec<&Trip> = first.nodes.iter().map(|n| trips.get(n.trip())).collect();
            prop_assert!(rules.check_sequence(&sequence).is_empty());

            let expected: f64 = first.nodes.iter().map(|n| duals[n.trip().index()]).sum();
            prop_assert!((first.price - expected).abs() < 1e-9);

            let vehicle_changes = sequence
                .windows(2)
                .filter(|pair| pair[0].vehicle != pair[1].vehicle)
                .count();
            let allowed = if relay { 1 } else { 0 };
            prop_assert!(vehicle_changes <= allowed);
        }
    }
}
