pub mod collection;
pub mod group;
pub mod index;
pub mod probe;

pub use collection::SegmentIndexCollection;
pub use group::{Group, GroupSet};
pub use index::{IndexError, IndexedGeometry, Nearest, PointId, SegmentId, SegmentIndex};
pub use probe::Probe;
