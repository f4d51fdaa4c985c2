use rstest::rstest;
use serial_test::serial;

use drift_core::arena::{Arena, SystemArena};
use drift_core::common_tests::segmented_list_stress_tests::*;

// Trait for type-level parametrization over arenas
trait TestArena {
    type ArenaType: Arena;
}

struct UseSystemArena;

impl TestArena for UseSystemArena {
    type ArenaType = SystemArena;
}

#[rstest]
#[serial(stress_tests)]
#[case::system_arena(UseSystemArena)]
fn stress_concurrent_push_multiset<T: TestArena>(#[case] _arena: T) {
    test_concurrent_push_multiset::<T::ArenaType>(Default::default());
}

#[rstest]
#[serial(stress_tests)]
#[case::system_arena(UseSystemArena)]
fn stress_segment_contention_exact_capacity<T: TestArena>(#[case] _arena: T) {
    test_segment_contention_exact_capacity::<T::ArenaType>(Default::default());
}

#[rstest]
#[serial(stress_tests)]
#[case::system_arena(UseSystemArena)]
fn stress_concurrent_push_batches<T: TestArena>(#[case] _arena: T) {
    test_concurrent_push_batches::<T::ArenaType>(Default::default());
}

#[rstest]
#[serial(stress_tests)]
#[case::system_arena(UseSystemArena)]
fn stress_enumeration_during_appends_no_torn_reads<T: TestArena>(#[case] _arena: T) {
    test_enumeration_during_appends_no_torn_reads::<T::ArenaType>(Default::default());
}

#[rstest]
#[serial(stress_tests)]
#[case::system_arena(UseSystemArena)]
fn stress_enumeration_sees_bounded_prefix<T: TestArena>(#[case] _arena: T) {
    test_enumeration_sees_bounded_prefix::<T::ArenaType>(Default::default());
}
