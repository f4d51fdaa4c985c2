//! Lock-free segmented append-only list.

use std::ptr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use crate::arena::Arena;
use crate::sequences::buffer::SliceCursor;
use crate::sequences::sequence::{Cursor, DirectAccess, Sequence};

/// First-segment capacity used by [`SegmentedList::new`].
pub const DEFAULT_SEGMENT_CAPACITY: usize = 16;

//
// A growable chain of fixed-capacity segments supporting lock-free concurrent
// appends and single-pass enumeration without copying.
//
// List structure (first segment capacity 4):
// ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
// │ 10 20 30 40 │───►│ 50 60 __ __ │───►│    NULL     │
// │  (full)     │    │ (committed  │    │             │
// └─────────────┘    │  = 2)       │    └─────────────┘
//       ▲            └─────────────┘
//   last_full (frontier hint, optimization only)
//
// INVARIANTS:
// 1. Once a segment is linked as `next` of another, that link is never unset
//    or rewritten; the chain only grows forward.
// 2. Per segment: committed <= reserved <= capacity. Both only increase while
//    the segment is shared; `clear` requires exclusive access.
// 3. Elements below a `committed` value observed with Acquire are fully
//    written; readers never see a torn element.
// 4. A newly linked segment already carries its first element before the
//    `next` CAS publishes it, so any reader that can reach it sees a valid
//    state.
//
// =============================================================================
// APPEND (per segment, lock-free)
// =============================================================================
//
// Phase 1: RESERVE - CAS `reserved` from the observed index to index+1.
//          Fails the whole append (returns false) when the observed index is
//          at capacity; "segment full" is an expected outcome, not a fault.
// Phase 2: WRITE   - store the element into the reserved slot.
// Phase 3: PUBLISH - advance `committed` from index to index+1 with Release.
//          Only the reserver of `index` can perform that exact transition, so
//          publication happens in slot order; a writer briefly spins while
//          earlier slots finish. Readers load `committed` with Acquire and
//          therefore only see completed writes.
//
// The original single-counter variant (reserve and publish in one CAS, write
// after) lets a reader observe a count covering an unwritten slot; splitting
// reservation from publication is what makes invariant 3 hold.
//
// =============================================================================
// SEGMENT LINKING (list-level append past a full tail)
// =============================================================================
//
// The adder builds a fully initialized segment with the element committed at
// slot 0, then CASes the tail's `next` from null. Exactly one contender wins;
// each loser advances to the successor it observed and retries the link
// there, so every prebuilt segment ends up linked at the eventual tail and
// none is lost or linked twice.
//
pub struct SegmentedList<T, A: Arena> {
    first: NonNull<Segment<T>>,
    /// Latest segment discovered full; where appends start looking.
    last_full: AtomicPtr<Segment<T>>,
    arena: A,
}

// SAFETY: the list owns its chain; appends move T by value, enumeration
// hands out &T. Atomics order all cross-thread publication.
unsafe impl<T: Copy + Send, A: Arena> Send for SegmentedList<T, A> {}
unsafe impl<T: Copy + Send + Sync, A: Arena> Sync for SegmentedList<T, A> {}

/// One fixed-capacity block in the chain.
pub struct Segment<T> {
    next: AtomicPtr<Segment<T>>,
    values: NonNull<T>,
    capacity: usize,
    reserved: AtomicUsize,
    committed: AtomicUsize,
}

// SAFETY: see SegmentedList; a shared segment only supports append/read
unsafe impl<T: Copy + Send> Send for Segment<T> {}
unsafe impl<T: Copy + Send + Sync> Sync for Segment<T> {}

impl<T: Copy> Segment<T> {
    /// Load the successor segment (Acquire ordering).
    #[inline]
    pub fn next(&self) -> Option<&Segment<T>> {
        // SAFETY: a published next pointer stays valid for the chain's life
        unsafe { self.next.load(Ordering::Acquire).as_ref() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Published element count (Acquire ordering).
    pub fn len(&self) -> usize {
        self.committed.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every slot has been reserved. A full segment can still be
    /// publishing its last elements.
    pub fn is_full(&self) -> bool {
        self.reserved.load(Ordering::Relaxed) >= self.capacity
    }

    /// Snapshot of the published prefix.
    pub fn as_slice(&self) -> &[T] {
        let len = self.len();
        // SAFETY: invariant 3 - elements below committed are fully written
        unsafe { std::slice::from_raw_parts(self.values.as_ptr(), len) }
    }

    /// Lock-free bounded append of one element.
    ///
    /// Returns `false` when the segment is full at the observed reservation
    /// index; the caller moves on to the next segment. May retry under
    /// contention.
    ///
    pub fn try_push(&self, value: T) -> bool {
        let mut index = self.reserved.load(Ordering::Relaxed);
        loop {
            if index >= self.capacity {
                return false;
            }
            match self.reserved.compare_exchange_weak(
                index,
                index + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => index = observed,
            }
        }

        // SAFETY: the CAS above made [index] ours exclusively
        unsafe { self.values.as_ptr().add(index).write(value) };

        self.publish(index, 1);
        true
    }

    /// Lock-free bounded append of a contiguous run, reserved in one CAS.
    ///
    /// Avoids per-element contention for batch inserts. All-or-nothing:
    /// returns `false` when the run does not fit in the remaining capacity.
    ///
    pub fn try_push_slice(&self, values: &[T]) -> bool {
        if values.is_empty() {
            return true;
        }

        let mut index = self.reserved.load(Ordering::Relaxed);
        loop {
            if index + values.len() > self.capacity {
                return false;
            }
            match self.reserved.compare_exchange_weak(
                index,
                index + values.len(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => index = observed,
            }
        }

        // SAFETY: the CAS reserved [index, index + len) exclusively
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), self.values.as_ptr().add(index), values.len())
        };

        self.publish(index, values.len());
        true
    }

    /// Reset the segment to empty. Exclusive access makes this safe with
    /// plain stores.
    pub fn clear(&mut self) {
        *self.reserved.get_mut() = 0;
        *self.committed.get_mut() = 0;
    }

    /// Advance the published watermark over our freshly written run.
    ///
    /// Only the reserver of `index` can move committed from `index`, so this
    /// resolves in reservation order; the spin covers writers still filling
    /// earlier slots.
    fn publish(&self, index: usize, len: usize) {
        while self
            .committed
            .compare_exchange_weak(index, index + len, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
    }
}

impl<T: Copy, A: Arena> SegmentedList<T, A> {
    /// List with the default first-segment capacity.
    pub fn new(arena: A) -> Self {
        Self::with_capacity(DEFAULT_SEGMENT_CAPACITY, arena)
    }

    /// List whose first segment holds `capacity` elements (minimum 1).
    /// Segments spawned on overflow reuse the capacity of the segment that
    /// overflowed.
    pub fn with_capacity(capacity: usize, arena: A) -> Self {
        let first = Self::new_segment(arena, capacity.max(1));
        SegmentedList {
            first,
            last_full: AtomicPtr::new(ptr::null_mut()),
            arena,
        }
    }

    pub fn arena(&self) -> A {
        self.arena
    }

    pub fn first_segment(&self) -> &Segment<T> {
        // SAFETY: first is allocated at construction and lives until drop
        unsafe { self.first.as_ref() }
    }

    /// Walk the segment chain from the head.
    pub fn segments(&self) -> Segments<'_, T> {
        Segments {
            next: Some(self.first_segment()),
        }
    }

    /// Append one element, growing the chain when the tail is full.
    ///
    /// Safe to call from any number of threads concurrently; enumeration
    /// running alongside observes some, all, or none of the concurrent
    /// appends, never a torn element.
    ///
    pub fn push(&self, value: T) {
        let hint = self.last_full.load(Ordering::Acquire);
        let mut seek = if hint.is_null() {
            self.first.as_ptr()
        } else {
            hint
        };

        loop {
            // SAFETY: seek always points into the live chain
            let segment = unsafe { &*seek };

            if segment.try_push(value) {
                return;
            }

            // Segment observed full; remember it so later appends skip ahead.
            self.last_full.store(seek, Ordering::Release);

            let next = segment.next.load(Ordering::Acquire);
            if next.is_null() {
                self.push_linking(seek, value);
                return;
            }
            seek = next;
        }
    }

    /// Build a new segment carrying `value` and link it at the chain's tail.
    fn push_linking(&self, mut seek: *mut Segment<T>, value: T) {
        // SAFETY: seek is in the live chain
        let capacity = unsafe { (*seek).capacity };
        let node = Self::new_segment_with(self.arena, capacity, value);

        loop {
            // SAFETY: seek walks only published segments
            let segment = unsafe { &*seek };
            match segment.next.compare_exchange(
                ptr::null_mut(),
                node.as_ptr(),
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                // Lost the race: another adder linked here first. Its segment
                // is now the tail candidate; retry the link there.
                Err(observed) => seek = observed,
            }
        }
    }

    /// Release the whole chain back to the arena.
    ///
    /// The explicit spelling of dropping the list; must not run concurrently
    /// with appends or cursors, which exclusive ownership guarantees.
    ///
    pub fn dispose(self) {
        drop(self);
    }

    fn new_segment(arena: A, capacity: usize) -> NonNull<Segment<T>> {
        let values = arena.allocate::<T>(capacity);
        let segment = arena.allocate::<Segment<T>>(1);
        // SAFETY: segment is a fresh uninitialized allocation of one Segment
        unsafe {
            segment.as_ptr().write(Segment {
                next: AtomicPtr::new(ptr::null_mut()),
                values,
                capacity,
                reserved: AtomicUsize::new(0),
                committed: AtomicUsize::new(0),
            });
        }
        segment
    }

    /// A segment with `value` already committed in slot 0, ready to be
    /// published via a `next` link.
    fn new_segment_with(arena: A, capacity: usize, value: T) -> NonNull<Segment<T>> {
        let segment = Self::new_segment(arena, capacity);
        // SAFETY: not yet linked, we are the only owner
        unsafe {
            let node = segment.as_ref();
            node.values.as_ptr().write(value);
            node.reserved.store(1, Ordering::Relaxed);
            node.committed.store(1, Ordering::Relaxed);
        }
        segment
    }
}

impl<T, A: Arena> Drop for SegmentedList<T, A> {
    fn drop(&mut self) {
        if !self.arena.is_valid() {
            return;
        }

        // Exclusive access: plain walk, each segment released exactly once.
        let mut current = self.first.as_ptr();
        while !current.is_null() {
            // SAFETY: current came from the chain we own
            unsafe {
                let next = (*current).next.load(Ordering::Acquire);
                let capacity = (*current).capacity;
                self.arena.release((*current).values, capacity);
                self.arena.release(NonNull::new_unchecked(current), 1);
                current = next;
            }
        }
    }
}

// ============================================================================
// Enumeration
// ============================================================================

/// Iterator over the segment chain.
pub struct Segments<'a, T> {
    next: Option<&'a Segment<T>>,
}

impl<'a, T: Copy> Iterator for Segments<'a, T> {
    type Item = &'a Segment<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.next?;
        self.next = segment.next();
        Some(segment)
    }
}

/// Cursor over every published element, segment by segment.
///
/// Each segment's length is snapshotted on entry, so elements published into
/// an already-passed position are not revisited.
///
pub struct SegmentedListCursor<'a, T> {
    /// Next segment to enter.
    segment: Option<&'a Segment<T>>,
    inner: SliceCursor<'a, T>,
}

impl<T: Copy> Cursor for SegmentedListCursor<'_, T> {
    type Item = T;

    fn advance(&mut self) -> bool {
        if self.inner.advance() {
            return true;
        }
        while let Some(segment) = self.segment {
            self.segment = segment.next();
            self.inner = SliceCursor::new(segment.as_slice());
            if self.inner.advance() {
                return true;
            }
        }
        false
    }

    fn current(&self) -> &T {
        self.inner.current()
    }

    fn reset(&mut self) {
        // The cursor no longer knows the chain's head.
        panic!("a segmented list cursor cannot be rewound");
    }
}

impl<T: Copy, A: Arena> Sequence for SegmentedList<T, A> {
    type Item = T;
    type Cursor<'a>
        = SegmentedListCursor<'a, T>
    where
        Self: 'a;

    fn cursor(&self) -> Self::Cursor<'_> {
        SegmentedListCursor {
            segment: Some(self.first_segment()),
            inner: SliceCursor::new(&[]),
        }
    }

    // Length lives scattered across segments; counting walks the chain.
    fn is_counted(&self) -> bool {
        false
    }

    fn any(&self) -> bool {
        self.segments().any(|segment| !segment.is_empty())
    }

    fn count(&self) -> usize {
        self.segments().map(|segment| segment.len()).sum()
    }
}

impl<T: Copy> Sequence for Segment<T> {
    type Item = T;
    type Cursor<'a>
        = SliceCursor<'a, T>
    where
        Self: 'a;

    fn cursor(&self) -> Self::Cursor<'_> {
        SliceCursor::new(self.as_slice())
    }

    fn is_counted(&self) -> bool {
        true
    }

    fn any(&self) -> bool {
        !self.is_empty()
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn copy_to(&self, dest: &mut [T]) -> usize {
        let source = self.as_slice();
        assert!(
            dest.len() >= source.len(),
            "copy_to: destination holds {} elements but the segment has {}",
            dest.len(),
            source.len()
        );
        dest[..source.len()].copy_from_slice(source);
        source.len()
    }
}

impl<T: Copy> DirectAccess for Segment<T> {
    fn len(&self) -> usize {
        Segment::len(self)
    }

    fn get(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

// ============================================================================
// Tests - single-threaded behavior; concurrency lives in common_tests
// ============================================================================
