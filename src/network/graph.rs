use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use geo::{Coord, Distance, Euclidean, Line, LineString, MultiLineString, Rect};
use rstar::{RTree, RTreeObject, AABB};
use smallvec::SmallVec;
use tracing::warn;

use crate::geom::merge::QCoord;
use crate::geom::project::closest_on_segment;
use crate::geom::{envelope_around, expand, merge_lines};
use crate::network::BoundaryNetwork;

/// Default cap on node expansions for one path search.
pub const DEFAULT_SEARCH_BUDGET: usize = 200_000;

#[derive(Clone, Copy, Debug)]
struct Edge {
    a: usize,
    b: usize,
    length: f64,
}

#[derive(Clone, Debug)]
struct EdgeBox {
    edge: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for EdgeBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { self.envelope }
}

/// Where a query point lands on the network.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Anchor {
    Node(usize),
    OnEdge { edge: usize, point: Coord<f64> },
}

/// Undirected segment graph built from reference lines.
///
/// Vertices shared by several lines (up to quantization) become a single
/// node, so paths can cross from one input line to the next.
#[derive(Clone, Debug)]
pub struct LineNetwork {
    nodes: Vec<Coord<f64>>,
    edges: Vec<Edge>,
    adjacency: Vec<SmallVec<[usize; 4]>>,
    tree: RTree<EdgeBox>,
    budget: usize,
}

impl LineNetwork {
    pub fn new<'a>(lines: impl IntoIterator<Item = &'a LineString<f64>>) -> Self {
        let mut index: AHashMap<QCoord, usize> = AHashMap::new();
        let mut nodes: Vec<Coord<f64>> = Vec::new();
        let mut adjacency: Vec<SmallVec<[usize; 4]>> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut boxes: Vec<EdgeBox> = Vec::new();

        for line in lines {
            for segment in line.lines() {
                let mut node_of = |c: Coord<f64>| {
                    *index.entry(QCoord::new(c)).or_insert_with(|| {
                        nodes.push(c);
                        adjacency.push(SmallVec::new());
                        nodes.len() - 1
                    })
                };
                let (a, b) = (node_of(segment.start), node_of(segment.end));
                if a == b { continue }

                let edge = edges.len();
                edges.push(Edge { a, b, length: Euclidean.distance(nodes[a], nodes[b]) });
                adjacency[a].push(edge);
                adjacency[b].push(edge);
                boxes.push(EdgeBox {
                    edge,
                    envelope: AABB::from_corners(
                        [segment.start.x, segment.start.y],
                        [segment.end.x, segment.end.y],
                    ),
                });
            }
        }

        Self { nodes, edges, adjacency, tree: RTree::bulk_load(boxes), budget: DEFAULT_SEARCH_BUDGET }
    }

    /// Cap the number of node expansions of a single path search.
    pub fn with_search_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    #[inline]
    pub fn num_nodes(&self) -> usize { self.nodes.len() }

    #[inline]
    pub fn num_edges(&self) -> usize { self.edges.len() }

    #[inline]
    fn line(&self, edge: usize) -> Line<f64> {
        let Edge { a, b, .. } = self.edges[edge];
        Line::new(self.nodes[a], self.nodes[b])
    }

    fn edges_in(&self, rect: &Rect<f64>) -> Vec<usize> {
        let query = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        let mut found: Vec<usize> = self.tree.locate_in_envelope_intersecting(&query).map(|b| b.edge).collect();
        found.sort_unstable();
        found
    }

    fn locate(&self, point: Coord<f64>, search: f64, snap: Option<f64>, allowed: &dyn Fn(usize) -> bool) -> Option<Anchor> {
        let mut best: Option<(usize, Coord<f64>, f64, f64)> = None;
        for edge in self.edges_in(&envelope_around(point, search)) {
            if !allowed(edge) { continue }
            let line = self.line(edge);
            let (proj, t) = closest_on_segment(point, line.start, line.end);
            let distance = Euclidean.distance(point, proj);
            if distance <= search && best.is_none_or(|(_, _, _, d)| distance < d) {
                best = Some((edge, proj, t, distance));
            }
        }

        let (edge, proj, t, _) = best?;
        let Edge { a, b, .. } = self.edges[edge];
        if t == 0.0 { return Some(Anchor::Node(a)) }
        if t == 1.0 { return Some(Anchor::Node(b)) }

        if let Some(snap) = snap {
            let (da, db) = (Euclidean.distance(proj, self.nodes[a]), Euclidean.distance(proj, self.nodes[b]));
            let (nearest, d) = if da <= db { (a, da) } else { (b, db) };
            if d <= snap { return Some(Anchor::Node(nearest)) }
        }
        Some(Anchor::OnEdge { edge, point: proj })
    }

    fn anchor_coord(&self, anchor: Anchor) -> Coord<f64> {
        match anchor {
            Anchor::Node(n) => self.nodes[n],
            Anchor::OnEdge { point, .. } => point,
        }
    }

    /// Dijkstra between two anchors over the allowed edges. Anchors lying
    /// inside an edge become virtual nodes linked to the edge's endpoints.
    fn shortest(&self, from: Anchor, to: Anchor, allowed: &dyn Fn(usize) -> bool) -> Option<LineString<f64>> {
        let (start, goal) = (self.anchor_coord(from), self.anchor_coord(to));
        if start == goal { return Some(LineString(vec![start, goal])) }

        let n = self.nodes.len();
        let (source, target) = (n, n + 1);
        let mut links: AHashMap<usize, SmallVec<[(usize, f64); 3]>> = AHashMap::new();
        let mut link = |u: usize, v: usize, w: f64| {
            links.entry(u).or_default().push((v, w));
            links.entry(v).or_default().push((u, w));
        };

        let s = self.attach(from, source, &mut link);
        let t = self.attach(to, target, &mut link);
        if let (Anchor::OnEdge { edge: e1, point: p1 }, Anchor::OnEdge { edge: e2, point: p2 }) = (from, to) {
            if e1 == e2 { link(source, target, Euclidean.distance(p1, p2)) }
        }

        #[derive(Copy, Clone, Eq, PartialEq)]
        struct Entry {
            cost_bits: u64, // f64::to_bits() is monotone for non-negative values
            node: usize,
        }

        impl Ord for Entry {
            fn cmp(&self, other: &Self) -> Ordering {
                other.cost_bits.cmp(&self.cost_bits).then_with(|| other.node.cmp(&self.node))
            }
        }

        impl PartialOrd for Entry {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
        }

        let mut dist = vec![f64::INFINITY; n + 2];
        let mut prev = vec![usize::MAX; n + 2];
        let mut heap = BinaryHeap::new();
        dist[s] = 0.0;
        heap.push(Entry { cost_bits: 0f64.to_bits(), node: s });

        let mut expansions = 0usize;
        while let Some(Entry { cost_bits, node }) = heap.pop() {
            let cost = f64::from_bits(cost_bits);
            if cost > dist[node] { continue }
            if node == t { break }

            expansions += 1;
            if expansions > self.budget {
                warn!("[network] path search budget of {} expansions exhausted", self.budget);
                return None;
            }

            let mut relax = |v: usize, w: f64, heap: &mut BinaryHeap<Entry>| {
                let next = cost + w;
                if next < dist[v] {
                    dist[v] = next;
                    prev[v] = node;
                    heap.push(Entry { cost_bits: next.to_bits(), node: v });
                }
            };

            if node < n {
                for &edge in &self.adjacency[node] {
                    if !allowed(edge) { continue }
                    let Edge { a, b, length } = self.edges[edge];
                    relax(if a == node { b } else { a }, length, &mut heap);
                }
            }
            if let Some(extra) = links.get(&node) {
                for &(v, w) in extra {
                    relax(v, w, &mut heap);
                }
            }
        }

        if !dist[t].is_finite() { return None }

        let mut coords = Vec::new();
        let mut cursor = t;
        loop {
            coords.push(match cursor {
                c if c == source => start,
                c if c == target => goal,
                c => self.nodes[c],
            });
            if cursor == s { break }
            cursor = prev[cursor];
        }
        coords.reverse();
        Some(LineString(coords))
    }

    /// Node id standing for `anchor` in the search, linking virtual nodes.
    fn attach(&self, anchor: Anchor, virtual_id: usize, link: &mut impl FnMut(usize, usize, f64)) -> usize {
        match anchor {
            Anchor::Node(node) => node,
            Anchor::OnEdge { edge, point } => {
                let Edge { a, b, .. } = self.edges[edge];
                link(virtual_id, a, Euclidean.distance(point, self.nodes[a]));
                link(virtual_id, b, Euclidean.distance(point, self.nodes[b]));
                virtual_id
            }
        }
    }
}

impl BoundaryNetwork for LineNetwork {
    fn project(&self, point: Coord<f64>, search_distance: f64, snap_distance: Option<f64>) -> Option<Coord<f64>> {
        self.locate(point, search_distance, snap_distance, &|_| true).map(|anchor| self.anchor_coord(anchor))
    }

    fn local(&self, envelope: &Rect<f64>) -> MultiLineString<f64> {
        let segments: Vec<LineString<f64>> = self.edges_in(envelope)
            .into_iter()
            .map(|edge| {
                let line = self.line(edge);
                LineString(vec![line.start, line.end])
            })
            .collect();
        MultiLineString::new(merge_lines(&segments))
    }

    fn path_along(
        &self,
        from: Coord<f64>,
        to: Coord<f64>,
        guide: &LineString<f64>,
        max_distance: f64,
        search_distance: f64,
        snap_distance: f64,
    ) -> Option<LineString<f64>> {
        let Some(corridor) = geo::BoundingRect::bounding_rect(guide) else {
            return self.path(from, to, search_distance, snap_distance);
        };
        let near_guide: AHashSet<usize> = self.edges_in(&expand(&corridor, max_distance))
            .into_iter()
            .filter(|&edge| Euclidean.distance(&self.line(edge), guide) <= max_distance)
            .collect();
        let allowed = |edge: usize| near_guide.contains(&edge);

        let source = self.locate(from, search_distance, Some(snap_distance), &allowed)?;
        let target = self.locate(to, search_distance, Some(snap_distance), &allowed)?;
        self.shortest(source, target, &allowed)
    }

    fn path(&self, from: Coord<f64>, to: Coord<f64>, search_distance: f64, snap_distance: f64) -> Option<LineString<f64>> {
        let source = self.locate(from, search_distance, Some(snap_distance), &|_| true)?;
        let target = self.locate(to, search_distance, Some(snap_distance), &|_| true)?;
        self.shortest(source, target, &|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    /// ```
    /// c-----d
    /// |     |
    /// a--e--b
    /// ```
    fn ladder() -> LineNetwork {
        let bottom = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 10.0, y: 0.0)];
        let left = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0)];
        let top = line_string![(x: 0.0, y: 10.0), (x: 10.0, y: 10.0)];
        let right = line_string![(x: 10.0, y: 10.0), (x: 10.0, y: 0.0)];
        LineNetwork::new([&bottom, &left, &top, &right])
    }

    #[test]
    fn shared_vertices_are_merged() {
        let network = ladder();
        assert_eq!(network.num_nodes(), 5);
        assert_eq!(network.num_edges(), 5);
    }

    #[test]
    fn projection_and_snapping() {
        let network = ladder();
        let p = Coord { x: 3.0, y: 0.5 };
        assert_eq!(network.project(p, 1.0, None), Some(Coord { x: 3.0, y: 0.0 }));
        assert_eq!(network.project(p, 1.0, Some(2.5)), Some(Coord { x: 5.0, y: 0.0 }));
        assert_eq!(network.project(Coord { x: 5.0, y: 5.0 }, 1.0, None), None);
    }

    #[test]
    fn shortest_path_between_edge_interiors() {
        let network = ladder();
        let path = network.path(Coord { x: 0.5, y: 8.0 }, Coord { x: 9.5, y: 8.0 }, 1.0, 0.0).unwrap();
        assert_eq!(
            path,
            line_string![(x: 0.0, y: 8.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 8.0)]
        );
    }

    #[test]
    fn same_edge_is_direct() {
        let network = ladder();
        let path = network.path(Coord { x: 1.0, y: 0.2 }, Coord { x: 4.0, y: -0.2 }, 1.0, 0.0).unwrap();
        assert_eq!(path, line_string![(x: 1.0, y: 0.0), (x: 4.0, y: 0.0)]);
    }

    #[test]
    fn guide_restricts_the_corridor() {
        let network = ladder();
        let from = Coord { x: 0.0, y: 2.0 };
        let to = Coord { x: 10.0, y: 2.0 };
        let over_the_top = line_string![(x: 0.0, y: 2.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 2.0)];
        let path = network.path_along(from, to, &over_the_top, 1.0, 1.0, 0.0).unwrap();
        assert!(path.0.contains(&Coord { x: 0.0, y: 10.0 }));

        let unguided = network.path(from, to, 1.0, 0.0).unwrap();
        assert!(unguided.0.contains(&Coord { x: 5.0, y: 0.0 }));
    }

    #[test]
    fn disconnected_network_has_no_path() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let b = line_string![(x: 5.0, y: 0.0), (x: 6.0, y: 0.0)];
        let network = LineNetwork::new([&a, &b]);
        assert!(network.path(Coord { x: 0.5, y: 0.0 }, Coord { x: 5.5, y: 0.0 }, 1.0, 0.0).is_none());
    }

    #[test]
    fn local_lines_are_merged() {
        let network = ladder();
        let near_corner = Rect::new(Coord { x: 9.0, y: 9.0 }, Coord { x: 11.0, y: 11.0 });
        let local = network.local(&near_corner);
        assert_eq!(local.0.len(), 1);
        assert_eq!(local.0[0].0.len(), 3);
    }
}
