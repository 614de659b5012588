use geo::{Line, Rect};
use rstar::{RTree, RTreeObject, AABB};

use crate::group::{Group, GroupSet};
use crate::index::{to_aabb, IndexedGeometry, Nearest, SegmentIndex};
use crate::probe::Probe;

/// Bounding box of one collection member.
#[derive(Clone, Debug)]
struct MemberBox {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for MemberBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { self.envelope }
}

/// Independently indexed sub-geometries, each tagged with a [`Group`].
///
/// Queries delegate to every member whose envelope is within reach and
/// reduce the answers: the smallest distance wins, and the groups of every
/// member reaching exactly that distance are merged.
#[derive(Clone, Debug, Default)]
pub struct SegmentIndexCollection {
    members: Vec<(SegmentIndex, Group)>,
    boxes: RTree<MemberBox>,
}

impl SegmentIndexCollection {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, index: SegmentIndex, group: Group) {
        let idx = self.members.len();
        if let Some(rect) = index.envelope() {
            self.boxes.insert(MemberBox { idx, envelope: to_aabb(&rect) });
        }
        self.members.push((index, group));
    }

    #[inline]
    pub fn len(&self) -> usize { self.members.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    #[inline]
    pub fn group(&self, idx: usize) -> Group { self.members[idx].1 }

    /// Members whose envelope intersects `query`, in insertion order.
    fn candidates(&self, query: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut found: Vec<usize> = self.boxes
            .locate_in_envelope_intersecting(query)
            .map(|b| b.idx)
            .collect();
        found.sort_unstable();
        found
    }
}

impl IndexedGeometry for SegmentIndexCollection {
    fn nearest_distance(&self, probe: &dyn Probe, threshold: f64) -> Option<Nearest> {
        let rect = probe.probe_envelope()?;
        let (min, max) = (rect.min(), rect.max());
        let query = AABB::from_corners(
            [min.x - threshold, min.y - threshold],
            [max.x + threshold, max.y + threshold],
        );

        let mut best: Option<Nearest> = None;
        for idx in self.candidates(&query) {
            let (index, group) = &self.members[idx];
            let Some(hit) = index.nearest_distance(probe, threshold) else { continue };
            match &mut best {
                Some(current) if hit.distance == current.distance => current.groups.insert(*group),
                Some(current) if hit.distance > current.distance => {}
                _ => best = Some(Nearest { distance: hit.distance, groups: GroupSet::single(*group) }),
            }
        }
        best
    }

    fn segments_in_box(&self, envelope: &Rect<f64>) -> Vec<Line<f64>> {
        self.candidates(&to_aabb(envelope))
            .into_iter()
            .flat_map(|idx| self.members[idx].0.segments_in_box(envelope))
            .collect()
    }
}
