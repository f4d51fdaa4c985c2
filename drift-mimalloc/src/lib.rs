//! mimalloc-backed arena for drift collections.
//!
//! This crate provides `MimallocArena`, an implementation of the `Arena`
//! trait routing block allocation through mimalloc.
//!
//! # Usage
//!
//! ```ignore
//! use drift_core::SegmentedList;
//! use drift_mimalloc::MimallocArena;
//!
//! let list: SegmentedList<i64, MimallocArena> = SegmentedList::new(MimallocArena);
//! list.push(42);
//! ```

use std::alloc::GlobalAlloc;
use std::ptr::NonNull;

use drift_core::arena::{Arena, array_layout};
use mimalloc::MiMalloc;

static MI: MiMalloc = MiMalloc;

/// An arena backed by mimalloc.
///
/// Zero-sized and always valid: every value shares one identity, so blocks
/// may be released through any instance. All state lives in the mimalloc
/// heap itself.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct MimallocArena;

impl Arena for MimallocArena {
    fn allocate<T>(&self, count: usize) -> NonNull<T> {
        let layout = array_layout::<T>(count);
        if layout.size() == 0 {
            return NonNull::dangling();
        }

        // SAFETY: layout has non-zero size
        let ptr = unsafe { MI.alloc(layout) };

        match NonNull::new(ptr as *mut T) {
            Some(block) => block,
            None => std::alloc::handle_alloc_error(layout),
        }
    }

    unsafe fn release<T>(&self, block: NonNull<T>, count: usize) {
        let layout = array_layout::<T>(count);
        if layout.size() == 0 {
            return;
        }

        // SAFETY: caller guarantees block came from allocate::<T> with count
        unsafe { MI.dealloc(block.as_ptr() as *mut u8, layout) }
    }
}
