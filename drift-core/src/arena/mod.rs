//! Arena trait for explicit memory ownership.
//!
//! This module defines the `Arena` trait that abstracts over allocators from
//! which containers obtain their backing blocks. Every allocation-bearing
//! operation in this crate takes an explicit arena value; there is no default
//! global arena.
//!
//! # Design
//!
//! The trait enables containers to be generic over their allocation strategy:
//!
//! ```text
//! SegmentedList<T, A: Arena>
//!     │
//!     ├── SegmentedList<T, SystemArena>     (std allocator)
//!     └── SegmentedList<T, MimallocArena>   (drift-mimalloc)
//! ```
//!
//! Arenas are small copyable handles, not owning pools: a block allocated
//! from one arena value must be released through a value of the same arena
//! identity. Release paths check `is_valid` first so that a container whose
//! arena handle has been invalidated simply leaks instead of corrupting a
//! foreign allocator.

mod system_arena;

use std::alloc::Layout;
use std::ptr::NonNull;

pub use system_arena::SystemArena;

/// An allocator identity from which contiguous element blocks are obtained
/// and later released.
///
/// # Safety Contract
///
/// Implementations must ensure:
/// 1. `allocate` returns a block valid for `count` elements of `T`, aligned
///    for `T`, and exclusively owned by the caller.
/// 2. A block passed to `release` with the same `count` it was allocated
///    with is fully reclaimed and never handed out again while still in use.
///
/// Allocation failure is not a recoverable condition at this layer: it goes
/// through `std::alloc::handle_alloc_error` and propagates to the caller
/// unchanged.
///
pub trait Arena: Copy + Default + Send + Sync + 'static {
    /// Allocate an uninitialized block of `count` elements.
    ///
    /// A `count` of zero (or a zero-sized `T`) yields a dangling,
    /// well-aligned pointer that must still be paired with `release`.
    ///
    fn allocate<T>(&self, count: usize) -> NonNull<T>;

    /// Release a block previously obtained from `allocate` on this arena.
    ///
    /// # Safety
    ///
    /// - `block` must come from `allocate::<T>` on an arena of this identity
    /// - `count` must equal the count it was allocated with
    /// - Must only be called once per block; the block must no longer be
    ///   referenced
    ///
    unsafe fn release<T>(&self, block: NonNull<T>, count: usize);

    /// Whether blocks can currently be obtained from and returned to this
    /// arena. Containers skip their release walk when this is false.
    ///
    fn is_valid(&self) -> bool {
        true
    }
}

/// Layout of a `count`-element array of `T`.
///
/// # Panics
///
/// Panics if the total size overflows `isize`, which indicates a caller bug
/// rather than an allocation failure.
///
pub fn array_layout<T>(count: usize) -> Layout {
    match Layout::array::<T>(count) {
        Ok(layout) => layout,
        Err(_) => panic!(
            "array layout overflow: {} elements of {}",
            count,
            std::any::type_name::<T>()
        ),
    }
}
