//! Line merging through degree-2 nodes.
//!
//! Lines are treated as edges between their two endpoint nodes. Chains are
//! walked from every node of degree other than two, so each output line ends
//! at a junction or a dangling end. Whatever remains unvisited forms pure
//! cycles, which come out as closed lines.

use ahash::AHashMap;
use geo::{Coord, LineString};
use smallvec::SmallVec;

/// Quantization step for endpoint matching.
const QUANT: f64 = 1e-7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct QCoord {
    x: i64,
    y: i64,
}

impl QCoord {
    pub(crate) fn new(c: Coord<f64>) -> Self {
        Self {
            x: (c.x / QUANT).round() as i64,
            y: (c.y / QUANT).round() as i64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum End { Start, End }

struct Chains<'a> {
    lines: Vec<&'a LineString<f64>>,
    /// `(start node, end node)` per line.
    ends: Vec<(usize, usize)>,
    incident: Vec<SmallVec<[(usize, End); 2]>>,
    visited: Vec<bool>,
}

impl<'a> Chains<'a> {
    fn new(lines: Vec<&'a LineString<f64>>) -> Self {
        let mut nodes: AHashMap<QCoord, usize> = AHashMap::new();
        let mut incident: Vec<SmallVec<[(usize, End); 2]>> = Vec::new();
        let mut node_of = |c: Coord<f64>, incident: &mut Vec<SmallVec<[(usize, End); 2]>>| {
            *nodes.entry(QCoord::new(c)).or_insert_with(|| {
                incident.push(SmallVec::new());
                incident.len() - 1
            })
        };

        let mut ends = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let (Some(&first), Some(&last)) = (line.0.first(), line.0.last()) else { continue };
            let s = node_of(first, &mut incident);
            let e = node_of(last, &mut incident);
            incident[s].push((i, End::Start));
            incident[e].push((i, End::End));
            ends.push((s, e));
        }

        let visited = vec![false; lines.len()];
        Self { lines, ends, incident, visited }
    }

    /// Append line `edge` to `coords`, oriented away from `from`, and return
    /// the node it arrives at.
    fn append(&mut self, coords: &mut Vec<Coord<f64>>, edge: usize, from: End) -> (usize, End) {
        self.visited[edge] = true;
        let line = &self.lines[edge].0;
        let skip = usize::from(!coords.is_empty());
        match from {
            End::Start => coords.extend(line.iter().skip(skip).copied()),
            End::End => coords.extend(line.iter().rev().skip(skip).copied()),
        }
        match from {
            End::Start => (self.ends[edge].1, End::End),
            End::End => (self.ends[edge].0, End::Start),
        }
    }

    fn walk(&mut self, edge: usize, from: End) -> LineString<f64> {
        let mut coords = Vec::new();
        let (mut node, mut arrived) = self.append(&mut coords, edge, from);
        let mut current = edge;

        while self.incident[node].len() == 2 {
            let Some(&(next, next_end)) = self.incident[node]
                .iter()
                .find(|&&(e, end)| (e, end) != (current, arrived))
            else { break };
            if self.visited[next] { break }
            (node, arrived) = self.append(&mut coords, next, next_end);
            current = next;
        }
        LineString(coords)
    }
}

/// Merge lines sharing endpoints into maximal lines.
///
/// Lines with fewer than two coordinates are dropped. Output order follows
/// the first appearance of each chain's starting node.
pub fn merge_lines<'a>(lines: impl IntoIterator<Item = &'a LineString<f64>>) -> Vec<LineString<f64>> {
    let lines: Vec<&LineString<f64>> = lines.into_iter().filter(|l| l.0.len() >= 2).collect();
    let mut chains = Chains::new(lines);
    let mut merged = Vec::new();

    for node in 0..chains.incident.len() {
        if chains.incident[node].len() == 2 { continue }
        for k in 0..chains.incident[node].len() {
            let (edge, end) = chains.incident[node][k];
            if chains.visited[edge] { continue }
            merged.push(chains.walk(edge, end));
        }
    }

    for edge in 0..chains.lines.len() {
        if !chains.visited[edge] {
            merged.push(chains.walk(edge, End::Start));
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn chains_through_degree_two_nodes() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let b = line_string![(x: 2.0, y: 0.0), (x: 1.0, y: 0.0)];
        let c = line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 1.0)];
        let merged = merge_lines([&a, &b, &c]);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0],
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 3.0, y: 1.0)]
        );
    }

    #[test]
    fn stops_at_junctions() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let b = line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        let c = line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert_eq!(merge_lines([&a, &b, &c]).len(), 3);
    }

    #[test]
    fn cycles_become_closed_lines() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let b = line_string![(x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)];
        let merged = merge_lines([&a, &b]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_closed());
        assert_eq!(merged[0].0.len(), 5);
    }

    #[test]
    fn closed_input_is_kept() {
        let ring = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)];
        assert_eq!(merge_lines([&ring]), vec![ring.clone()]);
    }
}
