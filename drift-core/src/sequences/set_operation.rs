//! Set combinators: intersection and difference under a caller ordering.
//!
//! Only a three-way comparison is guaranteed by the contract - no hashing -
//! so both operations are computed by sort-then-merge: cursor construction
//! materializes each source into arena working storage, sorts by the
//! comparer, deduplicates the first stream, and the cursor then lazily
//! merge-walks the two sorted buffers.
//!
//! Semantics are set semantics over the first source: a distinct value of A
//! appears in the output at most once no matter how often A repeats it.
//! Output order is ascending per the comparer.
//!
//! The comparer must be a consistent total ordering over the elements that
//! actually occur; the output membership is unspecified otherwise.

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::slice;

use crate::arena::Arena;
use crate::sequences::buffer::SliceSequence;
use crate::sequences::sequence::{Cursor, Sequence};

// ============================================================================
// Comparer - caller-supplied three-way ordering
// ============================================================================

/// A pure three-way ordering of two elements. Blanket-implemented for
/// closures.
pub trait Comparer<T>: Clone {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparer<T> for F
where
    F: Fn(&T, &T) -> Ordering + Clone,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

// ============================================================================
// Set modes
// ============================================================================

/// Whether an element of A that matches some element of B is kept.
pub trait SetMode {
    const KEEP_MATCHED: bool;
}

/// Keep elements of A found in B.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntersectMode;

/// Keep elements of A absent from B.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptMode;

impl SetMode for IntersectMode {
    const KEEP_MATCHED: bool = true;
}

impl SetMode for ExceptMode {
    const KEEP_MATCHED: bool = false;
}

// ============================================================================
// SetSequence
// ============================================================================

/// Lazy set operation over two sequences sharing an element type.
///
/// The wrapper owns nothing but its sources, the comparer and the arena
/// handle; all working storage belongs to the cursor and is released to the
/// arena when the cursor drops.
///
pub struct SetSequence<A, B, C, Ar, M> {
    first: A,
    second: B,
    comparer: C,
    arena: Ar,
    _mode: PhantomData<M>,
}

pub type Intersect<A, B, C, Ar> = SetSequence<A, B, C, Ar, IntersectMode>;
pub type Except<A, B, C, Ar> = SetSequence<A, B, C, Ar, ExceptMode>;

/// Elements of `first` that compare equal to some element of `second`, each
/// distinct value at most once.
pub fn intersect<T, A, B, C, Ar>(first: A, second: B, comparer: C, arena: Ar) -> Intersect<A, B, C, Ar>
where
    T: Copy,
    A: Sequence<Item = T>,
    B: Sequence<Item = T>,
    C: Comparer<T>,
    Ar: Arena,
{
    SetSequence {
        first,
        second,
        comparer,
        arena,
        _mode: PhantomData,
    }
}

/// Elements of `first` that compare equal to no element of `second`, each
/// distinct value at most once.
pub fn except<T, A, B, C, Ar>(first: A, second: B, comparer: C, arena: Ar) -> Except<A, B, C, Ar>
where
    T: Copy,
    A: Sequence<Item = T>,
    B: Sequence<Item = T>,
    C: Comparer<T>,
    Ar: Arena,
{
    SetSequence {
        first,
        second,
        comparer,
        arena,
        _mode: PhantomData,
    }
}

/// [`intersect`] over two raw buffers, skipping the wrapper indirection.
pub fn intersect_slices<'a, T, C, Ar>(
    first: &'a [T],
    second: &'a [T],
    comparer: C,
    arena: Ar,
) -> Intersect<SliceSequence<'a, T>, SliceSequence<'a, T>, C, Ar>
where
    T: Copy,
    C: Comparer<T>,
    Ar: Arena,
{
    intersect(
        SliceSequence::from_slice(first),
        SliceSequence::from_slice(second),
        comparer,
        arena,
    )
}

/// [`except`] over two raw buffers, skipping the wrapper indirection.
pub fn except_slices<'a, T, C, Ar>(
    first: &'a [T],
    second: &'a [T],
    comparer: C,
    arena: Ar,
) -> Except<SliceSequence<'a, T>, SliceSequence<'a, T>, C, Ar>
where
    T: Copy,
    C: Comparer<T>,
    Ar: Arena,
{
    except(
        SliceSequence::from_slice(first),
        SliceSequence::from_slice(second),
        comparer,
        arena,
    )
}

// ============================================================================
// Working storage
// ============================================================================

/// A sorted run in arena memory. `cap` is the allocated count and what gets
/// released; `len` may be smaller after deduplication.
struct SortedRun<T> {
    block: NonNull<T>,
    len: usize,
    cap: usize,
}

impl<T: Copy> SortedRun<T> {
    fn collect<S, C, Ar>(sequence: &S, comparer: &C, arena: Ar, dedup: bool) -> Self
    where
        S: Sequence<Item = T>,
        C: Comparer<T>,
        Ar: Arena,
    {
        let cap = sequence.count();
        let block = arena.allocate::<T>(cap);

        let mut len = 0;
        let mut cursor = sequence.cursor();
        while len < cap {
            match cursor.try_advance_copy() {
                // SAFETY: len < cap, inside the allocated block
                Some(value) => unsafe {
                    block.as_ptr().add(len).write(value);
                    len += 1;
                },
                None => break,
            }
        }

        // SAFETY: [0, len) initialized above, exclusively owned
        let items = unsafe { slice::from_raw_parts_mut(block.as_ptr(), len) };
        items.sort_unstable_by(|a, b| comparer.compare(a, b));

        if dedup {
            len = dedup_sorted(items, comparer);
        }

        SortedRun { block, len, cap }
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        debug_assert!(index < self.len);
        // SAFETY: index < len <= cap, initialized at collect
        unsafe { *self.block.as_ptr().add(index) }
    }
}

/// Compact a sorted slice so each equivalence class keeps its first element;
/// returns the new length.
fn dedup_sorted<T: Copy, C: Comparer<T>>(items: &mut [T], comparer: &C) -> usize {
    if items.is_empty() {
        return 0;
    }
    let mut write = 0;
    for read in 1..items.len() {
        if comparer.compare(&items[write], &items[read]) != Ordering::Equal {
            write += 1;
            items[write] = items[read];
        }
    }
    write + 1
}

// ============================================================================
// SetCursor
// ============================================================================

/// Merge cursor over the two sorted runs.
///
/// Owns the working storage and returns it to the arena on drop. `reset` is
/// supported: the runs stay sorted, only the merge positions rewind.
///
pub struct SetCursor<T, C, Ar: Arena, M> {
    first: SortedRun<T>,
    second: SortedRun<T>,
    comparer: C,
    arena: Ar,
    /// Next candidate index into `first`.
    i: usize,
    /// Low watermark into `second`; never moves backwards because `first`
    /// is deduplicated ascending.
    j: usize,
    /// Index of the current element; `usize::MAX` outside the valid window.
    pos: usize,
    _mode: PhantomData<M>,
}

impl<T, C, Ar: Arena, M> Drop for SetCursor<T, C, Ar, M> {
    fn drop(&mut self) {
        if !self.arena.is_valid() {
            return;
        }
        if self.first.cap > 0 {
            // SAFETY: block came from this arena with capacity cap
            unsafe { self.arena.release(self.first.block, self.first.cap) }
        }
        if self.second.cap > 0 {
            // SAFETY: as above
            unsafe { self.arena.release(self.second.block, self.second.cap) }
        }
    }
}

impl<T, C, Ar, M> Cursor for SetCursor<T, C, Ar, M>
where
    T: Copy,
    C: Comparer<T>,
    Ar: Arena,
    M: SetMode,
{
    type Item = T;

    fn advance(&mut self) -> bool {
        while self.i < self.first.len {
            let index = self.i;
            self.i += 1;
            let candidate = self.first.get(index);

            while self.j < self.second.len
                && self.comparer.compare(&self.second.get(self.j), &candidate) == Ordering::Less
            {
                self.j += 1;
            }

            let matched = self.j < self.second.len
                && self.comparer.compare(&self.second.get(self.j), &candidate) == Ordering::Equal;

            if matched == M::KEEP_MATCHED {
                self.pos = index;
                return true;
            }
        }
        self.pos = usize::MAX;
        false
    }

    fn current(&self) -> &T {
        assert!(self.pos < self.first.len, "set cursor has no current element");
        // SAFETY: pos < len, initialized at collect
        unsafe { &*self.first.block.as_ptr().add(self.pos) }
    }

    fn reset(&mut self) {
        self.i = 0;
        self.j = 0;
        self.pos = usize::MAX;
    }
}

impl<T, A, B, C, Ar, M> Sequence for SetSequence<A, B, C, Ar, M>
where
    T: Copy,
    A: Sequence<Item = T>,
    B: Sequence<Item = T>,
    C: Comparer<T>,
    Ar: Arena,
    M: SetMode,
{
    type Item = T;
    // The cursor owns its working storage, so it borrows nothing.
    type Cursor<'a>
        = SetCursor<T, C, Ar, M>
    where
        Self: 'a;

    fn cursor(&self) -> Self::Cursor<'_> {
        let first = SortedRun::collect(&self.first, &self.comparer, self.arena, true);
        let second = SortedRun::collect(&self.second, &self.comparer, self.arena, false);
        SetCursor {
            first,
            second,
            comparer: self.comparer.clone(),
            arena: self.arena,
            i: 0,
            j: 0,
            pos: usize::MAX,
            _mode: PhantomData,
        }
    }

    // Result cardinality is data-dependent; counting pays the full pass.
    fn is_counted(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::SystemArena;

    fn numeric(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn test_except_drops_matches_and_duplicates() {
        let result = except_slices(&[1, 2, 2, 3], &[2], numeric, SystemArena);
        assert_eq!(result.to_vec(), vec![1, 3]);
    }

    #[test]
    fn test_intersect_keeps_each_match_once() {
        let result = intersect_slices(&[3, 1, 2, 3, 3], &[3, 4, 2], numeric, SystemArena);
        assert_eq!(result.to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_empty_sources() {
        let empty: [i32; 0] = [];

        let result = intersect_slices(&empty, &[1, 2], numeric, SystemArena);
        assert!(!result.any());
        assert_eq!(result.count(), 0);

        let result = except_slices(&[1, 2], &empty, numeric, SystemArena);
        assert_eq!(result.to_vec(), vec![1, 2]);

        let result = except_slices(&empty, &empty, numeric, SystemArena);
        assert!(result.to_vec().is_empty());
    }

    #[test]
    fn test_duplicates_in_second_are_harmless() {
        let result = intersect_slices(&[1, 2, 3], &[2, 2, 2, 3], numeric, SystemArena);
        assert_eq!(result.to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_not_counted() {
        let result = intersect_slices(&[1], &[1], numeric, SystemArena);
        assert!(!result.is_counted());
        assert_eq!(result.count(), 1);
    }

    #[test]
    fn test_custom_ordering() {
        // Compare by absolute value: -2 and 2 are the same element.
        let by_abs = |a: &i32, b: &i32| a.abs().cmp(&b.abs());
        let result = intersect_slices(&[-2, 1, 5], &[2, 5], by_abs, SystemArena);
        assert_eq!(result.to_vec(), vec![-2, 5]);
    }

    #[test]
    fn test_cursor_reset() {
        let seq = except_slices(&[4, 1, 3], &[3], numeric, SystemArena);
        let mut cursor = seq.cursor();

        assert_eq!(cursor.try_advance_copy(), Some(1));
        assert_eq!(cursor.try_advance_copy(), Some(4));
        cursor.reset();
        assert_eq!(cursor.try_advance_copy(), Some(1));
        assert_eq!(cursor.try_advance_copy(), Some(4));
        assert_eq!(cursor.try_advance_copy(), None);
    }

    #[test]
    #[should_panic(expected = "no current element")]
    fn test_current_before_advance_panics() {
        let seq = intersect_slices(&[1], &[1], numeric, SystemArena);
        let cursor = seq.cursor();
        let _ = cursor.current();
    }

    #[test]
    fn test_abandoned_cursor_releases_storage() {
        let seq = intersect_slices(&[1, 2, 3, 4], &[2, 4], numeric, SystemArena);
        let mut cursor = seq.cursor();
        // Partial iteration then drop must be safe.
        assert!(cursor.advance());
        drop(cursor);
    }
}
