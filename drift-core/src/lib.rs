//! Sequence combinators and a lock-free segmented list over arena memory.
//!
//! Everything composes through the `Sequence`/`Cursor` capability traits with
//! monomorphized pipelines: no boxing, no dynamic dispatch, no per-element
//! heap allocation. The segmented list is the one structure safe for
//! concurrent mutation, and only on its append path.

pub mod arena;
pub mod common_tests;
pub mod sequences;

pub use arena::{Arena, SystemArena};
pub use sequences::{
    ArenaBuffer, Averager, Comparer, Cursor, DirectAccess, Map, OptionAverager, Reverse, Segment,
    SegmentedList, Sequence, SliceSequence, ToMean, Transform, average, average_optional, except,
    except_slices, intersect, intersect_slices,
};
