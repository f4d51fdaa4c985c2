//! Sequence sources and combinators.
//!
//! # Organization
//!
//! - [`sequence`] - the `Sequence`/`Cursor`/`DirectAccess` capability traits
//! - [`buffer`] - contiguous sources (`SliceSequence`, `ArenaBuffer`)
//! - [`segmented_list`] - the lock-free concurrently appendable list
//! - [`map`], [`reverse`], [`set_operation`] - combinators
//! - [`average`] - averaging folds

pub mod average;
pub mod buffer;
pub mod map;
pub mod reverse;
pub mod segmented_list;
pub mod sequence;
pub mod set_operation;

// Re-exports for convenience
pub use average::{Averager, OptionAverager, ToMean, average, average_optional};
pub use buffer::{ArenaBuffer, SliceCursor, SliceSequence};
pub use map::{Map, Transform};
pub use reverse::Reverse;
pub use segmented_list::{DEFAULT_SEGMENT_CAPACITY, Segment, SegmentedList};
pub use sequence::{Cursor, DirectAccess, Sequence};
pub use set_operation::{
    Comparer, Except, ExceptMode, Intersect, IntersectMode, SetMode, SetSequence, except,
    except_slices, intersect, intersect_slices,
};
