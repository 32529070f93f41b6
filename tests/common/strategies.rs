use proptest::prelude::*;

/// Strategy for selection sizes seen on the console grids
pub fn selection_size_strategy() -> impl Strategy<Value = usize> {
    1usize..=300
}

/// Strategy for batch sizes, including degenerate single-item batches
pub fn batch_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(25usize), 2usize..=60]
}

/// Strategy for per-item outcomes: `true` succeeds, `false` fails
pub fn outcomes_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..=120)
}
