//! One-to-one transform combinator.

use std::marker::PhantomData;

use crate::sequences::sequence::{Cursor, Sequence};

/// An in-place element transform.
///
/// `apply` writes the transformed value into `output` rather than returning
/// it, so a cursor can reuse one output slot across the whole traversal with
/// no per-element allocation. Blanket-implemented for closures.
///
pub trait Transform<In: Copy, Out: Copy>: Clone {
    fn apply(&mut self, input: &In, output: &mut Out);
}

impl<In: Copy, Out: Copy, F> Transform<In, Out> for F
where
    F: FnMut(&In, &mut Out) + Clone,
{
    #[inline]
    fn apply(&mut self, input: &In, output: &mut Out) {
        self(input, output)
    }
}

/// Lazy one-to-one transform over a source sequence.
///
/// Structure-preserving: one input yields exactly one output, so `count`,
/// `any` and `is_counted` forward to the source unchanged.
///
pub struct Map<S, Op, Out> {
    source: S,
    op: Op,
    _out: PhantomData<fn() -> Out>,
}

impl<S, Op, Out> Map<S, Op, Out>
where
    S: Sequence,
    Op: Transform<S::Item, Out>,
    Out: Copy + Default,
{
    pub fn new(source: S, op: Op) -> Self {
        Map {
            source,
            op,
            _out: PhantomData,
        }
    }
}

/// Cursor holding one output slot reused across advances.
///
/// `current` borrows the slot, which the next advance overwrites; the borrow
/// rules already forbid holding it that long, and `try_advance_copy` is the
/// pattern for keeping values around.
///
pub struct MapCursor<C, Op, Out> {
    inner: C,
    op: Op,
    slot: Out,
    live: bool,
}

impl<C, Op, Out> Cursor for MapCursor<C, Op, Out>
where
    C: Cursor,
    Op: Transform<C::Item, Out>,
    Out: Copy + Default,
{
    type Item = Out;

    fn advance(&mut self) -> bool {
        match self.inner.try_advance() {
            Some(input) => {
                self.op.apply(input, &mut self.slot);
                self.live = true;
                true
            }
            None => {
                self.live = false;
                false
            }
        }
    }

    fn current(&self) -> &Out {
        assert!(self.live, "map cursor has no current element");
        &self.slot
    }

    fn reset(&mut self) {
        // Transform state cannot be rewound in general.
        panic!("a mapped cursor cannot be rewound");
    }
}

impl<S, Op, Out> Sequence for Map<S, Op, Out>
where
    S: Sequence,
    Op: Transform<S::Item, Out>,
    Out: Copy + Default,
{
    type Item = Out;
    type Cursor<'a>
        = MapCursor<S::Cursor<'a>, Op, Out>
    where
        Self: 'a;

    fn cursor(&self) -> Self::Cursor<'_> {
        MapCursor {
            inner: self.source.cursor(),
            op: self.op.clone(),
            slot: Out::default(),
            live: false,
        }
    }

    fn is_counted(&self) -> bool {
        self.source.is_counted()
    }

    fn any(&self) -> bool {
        self.source.any()
    }

    fn count(&self) -> usize {
        self.source.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequences::buffer::SliceSequence;

    #[test]
    fn test_map_doubles() {
        let data = [1, 2, 3];
        let map = Map::new(SliceSequence::from_slice(&data), |input: &i32, output: &mut i64| {
            *output = (*input as i64) * 2;
        });

        assert_eq!(map.to_vec(), vec![2, 4, 6]);
    }

    #[test]
    fn test_map_forwards_introspection() {
        let data = [5, 6, 7, 8];
        let seq = SliceSequence::from_slice(&data);
        let map = Map::new(seq, |input: &i32, output: &mut i32| *output = input + 1);

        assert!(map.is_counted());
        assert_eq!(map.count(), seq.count());
        assert_eq!(map.any(), seq.any());
    }

    #[test]
    fn test_map_slot_is_overwritten() {
        let data = [10, 20];
        let map = Map::new(SliceSequence::from_slice(&data), |input: &i32, output: &mut i32| {
            *output = *input;
        });

        let mut cursor = map.cursor();
        let first = cursor.try_advance_copy();
        let second = cursor.try_advance_copy();
        assert_eq!(first, Some(10));
        assert_eq!(second, Some(20));
        assert_eq!(cursor.try_advance_copy(), None);
    }

    #[test]
    #[should_panic(expected = "cannot be rewound")]
    fn test_map_reset_unsupported() {
        let data = [1];
        let map = Map::new(SliceSequence::from_slice(&data), |input: &i32, output: &mut i32| {
            *output = *input;
        });
        let mut cursor = map.cursor();
        cursor.advance();
        cursor.reset();
    }

    #[test]
    #[should_panic(expected = "no current element")]
    fn test_map_current_before_advance_panics() {
        let data = [1];
        let map = Map::new(SliceSequence::from_slice(&data), |input: &i32, output: &mut i32| {
            *output = *input;
        });
        let cursor = map.cursor();
        let _ = cursor.current();
    }

    #[test]
    fn test_map_stateful_transform() {
        // A transform may carry state (a running index).
        let data = [100, 200, 300];
        let mut index = 0i32;
        let map = Map::new(
            SliceSequence::from_slice(&data),
            move |input: &i32, output: &mut i32| {
                *output = *input + index;
                index += 1;
            },
        );

        assert_eq!(map.to_vec(), vec![100, 201, 302]);
    }
}
