//! Boundary matching of AU rings.
//!
//! Bottom-up: [`touching`] classifies ring segments against the landmask
//! inland boundary, [`substring`] and [`refine`] manipulate ring vertices,
//! [`angles`] relocates gap endpoints on sharp network corners, [`ring`]
//! rebuilds one ring and [`au`] drives a whole AU.

pub mod angles;
pub mod au;
pub mod closed;
pub mod refine;
pub mod ring;
pub mod substring;
pub mod touching;

pub use au::{AuMatcher, AuOutcome, Summary};
pub use closed::ClosedBoundaries;
pub use ring::{References, RingCase, RingMatcher, RingOutcome};
pub use substring::sub_string;
pub use touching::{
    common_group_exists, extract_not_touching_parts, extract_parts, touching_parts, GroupRule, Parts,
    TouchingParts, TOUCHING_THRESHOLD,
};
