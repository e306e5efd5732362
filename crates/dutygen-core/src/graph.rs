use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphConstructionError;
use crate::rules::DutyRules;
use crate::trip::{TripId, TripTable};

/// How many vehicles a duty may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverMode {
    /// A duty stays on one vehicle
    #[default]
    Single,
    /// A duty may hand its vehicle over once and continue on another
    Relay,
}

/// A trip as seen by the graph. `Secondary` copies exist only in relay mode and
/// stand for the same trip driven after the duty's vehicle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripNode {
    Primary(TripId),
    Secondary(TripId),
}

impl TripNode {
    pub fn trip(self) -> TripId {
        match self {
            TripNode::Primary(t) | TripNode::Secondary(t) => t,
        }
    }

    fn level(self) -> u8 {
        match self {
            TripNode::Primary(_) => 0,
            TripNode::Secondary(_) => 1,
        }
    }
}

/// Ascending trip id, primary before secondary
impl Ord for TripNode {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.trip(), self.level()).cmp(&(other.trip(), other.level()))
    }
}

impl PartialOrd for TripNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Source,
    Sink,
    Trip(TripNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const SOURCE: NodeId = NodeId(0);
    pub const SINK: NodeId = NodeId(1);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    pub trip_nodes: usize,
    /// Same-vehicle continuations, both levels
    pub transfer_edges: usize,
    /// Cross-vehicle edges into the secondary level
    pub handover_edges: usize,
}

/// Directed acyclic graph of trips that may follow each other in a duty.
///
/// Read-only once built.
#[derive(Debug, Clone)]
pub struct TransferGraph {
    nodes: Vec<Node>,
    successors: Vec<Vec<NodeId>>,
    primary: Vec<NodeId>,
    secondary: Vec<Option<NodeId>>,
    /// Trip nodes in time order; every edge between trip nodes points forward in it
    order: Vec<NodeId>,
    mode: DriverMode,
    stats: GraphStats,
}

impl TransferGraph {
    pub fn node(&self, id: NodeId) -> Node {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn trip_node(&self, id: NodeId) -> Option<TripNode> {
        match self.node(id) {
            Node::Trip(t) => Some(t),
            Node::Source | Node::Sink => None,
        }
    }

    /// Successors sorted by ascending trip node, sink last
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.successors[id.index()]
    }

    pub fn primary(&self, trip: TripId) -> NodeId {
        self.primary[trip.index()]
    }

    pub fn secondary(&self, trip: TripId) -> Option<NodeId> {
        self.secondary[trip.index()]
    }

    pub fn topological_order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn mode(&self) -> DriverMode {
        self.mode
    }

    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.successors(from).contains(&to)
    }
}

/// Builds the transfer graph of a [`TripTable`]
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    mode: DriverMode,
    rules: DutyRules,
}

impl GraphBuilder {
    pub fn new(mode: DriverMode, rules: DutyRules) -> Self {
        Self { mode, rules }
    }

    pub fn build(&self, trips: &TripTable) -> Result<TransferGraph, GraphConstructionError> {
        for trip in trips.trips() {
            if trip.duration() > self.rules.max_span {
                return Err(GraphConstructionError::TripTooLong {
                    trip: trip.id,
                    duration: trip.duration(),
                    max_span: self.rules.max_span,
                });
            }
        }

        let n = trips.len();
        let mut graph = TransferGraph {
            nodes: vec![Node::Source, Node::Sink],
            successors: vec![Vec::new(), Vec::new()],
            primary: Vec::with_capacity(n),
            secondary: vec![None; n],
            order: Vec::new(),
            mode: self.mode,
            stats: GraphStats::default(),
        };

        for trip in trips.trips() {
            let id = graph.add_node(TripNode::Primary(trip.id));
            graph.primary.push(id);
        }
        if self.mode == DriverMode::Relay {
            for trip in trips.trips() {
                let id = graph.add_node(TripNode::Secondary(trip.id));
                graph.secondary[trip.id.index()] = Some(id);
            }
        }

        // Same-vehicle continuations: only the vehicle's next trip, on both levels
        for trip in trips.trips() {
            let Some(next) = trips.next_on_vehicle(trip.id) else {
                continue;
            };
            if !trip.can_precede(trips.get(next)) {
                continue;
            }
            graph.add_edge(graph.primary(trip.id), graph.primary(next));
            graph.stats.transfer_edges += 1;
            if let (Some(from), Some(to)) = (graph.secondary(trip.id), graph.secondary(next)) {
                graph.add_edge(from, to);
                graph.stats.transfer_edges += 1;
            }
        }

        // Handovers: any trip of another vehicle leaving from where and after this one ends
        if self.mode == DriverMode::Relay {
            for from in trips.trips() {
                for to in trips.trips() {
                    if from.vehicle == to.vehicle || !from.can_precede(to) {
                        continue;
                    }
                    if let Some(target) = graph.secondary(to.id) {
                        graph.add_edge(graph.primary(from.id), target);
                        graph.stats.handover_edges += 1;
                    }
                }
            }
        }

        for trip_index in 0..n {
            let primary = graph.primary[trip_index];
            graph.add_edge(NodeId::SOURCE, primary);
            graph.add_edge(primary, NodeId::SINK);
            if let Some(secondary) = graph.secondary[trip_index] {
                graph.add_edge(secondary, NodeId::SINK);
            }
        }

        graph.sort_successors();
        graph.order_by_time(trips)?;

        debug!(
            trips = n,
            nodes = graph.node_count(),
            transfers = graph.stats.transfer_edges,
            handovers = graph.stats.handover_edges,
            "transfer graph built"
        );
        Ok(graph)
    }
}

impl TransferGraph {
    fn add_node(&mut self, node: TripNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Trip(node));
        self.successors.push(Vec::new());
        self.stats.trip_nodes += 1;
        id
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.successors[from.index()].push(to);
    }

    fn sort_successors(&mut self) {
        let nodes = &self.nodes;
        for list in &mut self.successors {
            list.sort_by(|a, b| match (nodes[a.index()], nodes[b.index()]) {
                (Node::Trip(x), Node::Trip(y)) => x.cmp(&y),
                (Node::Sink, Node::Sink) => Ordering::Equal,
                (Node::Sink, _) => Ordering::Greater,
                (_, Node::Sink) => Ordering::Less,
                _ => a.cmp(b),
            });
        }
    }

    /// Order trip nodes by (start, end, level, trip) and reject edges pointing backwards
    fn order_by_time(&mut self, trips: &TripTable) -> Result<(), GraphConstructionError> {
        let mut order: Vec<(NodeId, TripNode)> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Trip(t) => Some((NodeId(i), *t)),
                Node::Source | Node::Sink => None,
            })
            .collect();
        order.sort_by_key(|&(_, t)| {
            let trip = trips.get(t.trip());
            (trip.start, trip.end, t.level(), t.trip())
        });

        let mut position = vec![0; self.nodes.len()];
        for (pos, &(id, _)) in order.iter().enumerate() {
            position[id.index()] = pos;
        }
        for &(id, from) in &order {
            for &succ in &self.successors[id.index()] {
                if let Node::Trip(to) = self.nodes[succ.index()] {
                    if position[succ.index()] <= position[id.index()] {
                        return Err(GraphConstructionError::BackwardEdge { from, to });
                    }
                }
            }
        }

        self.order = order.into_iter().map(|(id, _)| id).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::fixtures::table;

    fn build(mode: DriverMode, rows: &[(&str, i64, i64, u32, u32)]) -> (TripTable, TransferGraph) {
        let trips = table(rows);
        let graph = GraphBuilder::new(mode, DutyRules::default()).build(&trips).unwrap();
        (trips, graph)
    }

    #[test]
    fn test_empty_trip_list() {
        let (_, graph) = build(DriverMode::Relay, &[]);
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 2);
        assert!(graph.successors(NodeId::SOURCE).is_empty());
    }

    #[test]
    fn test_location_mismatch_creates_no_edge() {
        // A ends at location 1 at minute 300, B starts at location 2 at minute 305
        let (_, graph) = build(DriverMode::Single, &[("v", 200, 300, 5, 1), ("v", 305, 400, 2, 5)]);
        let (a, b) = (graph.primary(TripId(0)), graph.primary(TripId(1)));

        assert!(!graph.has_edge(a, b));
        assert_eq!(graph.stats().transfer_edges, 0);
        assert_eq!(graph.successors(a), &[NodeId::SINK]);
    }

    #[test]
    fn test_only_next_trip_on_vehicle_is_linked() {
        let (_, graph) = build(
            DriverMode::Single,
            &[("v", 0, 10, 1, 1), ("v", 10, 20, 1, 1), ("v", 20, 30, 1, 1)],
        );
        let p: Vec<NodeId> = (0..3).map(|i| graph.primary(TripId(i))).collect();

        assert!(graph.has_edge(p[0], p[1]));
        assert!(graph.has_edge(p[1], p[2]));
        assert!(!graph.has_edge(p[0], p[2]));
        assert_eq!(graph.successors(NodeId::SOURCE), &p[..]);
        assert_eq!(graph.successors(p[0]), &[p[1], NodeId::SINK]);
    }

    #[test]
    fn test_secondary_level_mirrors_transfers() {
        let (_, graph) = build(
            DriverMode::Relay,
            &[
                ("a", 0, 100, 1, 2),
                ("b", 100, 200, 2, 3),
                ("b", 210, 300, 3, 4),
                ("a", 100, 150, 2, 1),
            ],
        );
        assert_eq!(graph.mode(), DriverMode::Relay);
        let pa0 = graph.primary(TripId(0));
        let sb1 = graph.secondary(TripId(1)).unwrap();
        let sb2 = graph.secondary(TripId(2)).unwrap();
        let pb1 = graph.primary(TripId(1));
        let sa3 = graph.secondary(TripId(3)).unwrap();

        assert!(graph.has_edge(pa0, sb1), "handover a0 -> b1");
        assert!(!graph.has_edge(pa0, pb1), "handover never stays on the primary level");
        assert!(graph.has_edge(sb1, sb2), "same-vehicle transfer on the secondary level");
        assert!(!graph.has_edge(sb1, sa3), "no second vehicle change");
        assert!(!graph.successors(NodeId::SOURCE).contains(&sb1));
        assert_eq!(graph.stats().handover_edges, 1);
        assert_eq!(graph.stats().transfer_edges, 4);
    }

    #[test]
    fn test_order_is_topological() {
        let (_, graph) = build(
            DriverMode::Relay,
            &[("a", 0, 0, 1, 1), ("b", 0, 0, 1, 1), ("a", 0, 5, 1, 2)],
        );
        let mut position = vec![usize::MAX; graph.node_count()];
        for (i, id) in graph.topological_order().iter().enumerate() {
            position[id.index()] = i;
        }
        for &id in graph.topological_order() {
            for &succ in graph.successors(id) {
                if succ != NodeId::SINK {
                    assert!(position[succ.index()] > position[id.index()]);
                }
            }
        }
    }

    #[test]
    fn test_trip_longer_than_span_rejected() {
        let trips = table(&[("a", 0, 600, 1, 1)]);
        let err = GraphBuilder::new(DriverMode::Single, DutyRules::default())
            .build(&trips)
            .unwrap_err();
        assert!(matches!(err, GraphConstructionError::TripTooLong { duration: 600, .. }));
    }
}
