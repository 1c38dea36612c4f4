use std::ops::Range;
use std::sync::Mutex;

/// Caller-injected parallel executor.
///
/// Implementations partition `0..items` into contiguous chunks and run the
/// task once per chunk, returning only after every chunk completed. The core
/// never owns or creates threads itself.
pub trait WorkerPool: Sync {
    /// Number of chunks the pool prefers for a workload of `items`.
    fn preferred_chunks(&self, items: usize) -> usize;

    /// Runs `task` over a contiguous partition of `0..items`.
    fn run(&self, items: usize, task: &(dyn Fn(Range<usize>) + Sync));
}

/// [`WorkerPool`] backed by the global rayon thread pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonPool;

impl RayonPool {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl WorkerPool for RayonPool {
    fn preferred_chunks(&self, items: usize) -> usize {
        rayon::current_num_threads().min(items).max(1)
    }

    fn run(&self, items: usize, task: &(dyn Fn(Range<usize>) + Sync)) {
        if items == 0 {
            return;
        }

        let chunks = self.preferred_chunks(items);
        let chunk_size = items.div_ceil(chunks);

        rayon::scope(|scope| {
            let mut start = 0;
            while start < items {
                let end = (start + chunk_size).min(items);
                scope.spawn(move |_| task(start..end));
                start = end;
            }
        });
    }
}

/// Runs `task` over `0..items`, sharded across `pool` when one is given and
/// the workload is worth splitting, otherwise as one synchronous call.
pub fn run_sharded(
    pool: Option<&dyn WorkerPool>,
    items: usize,
    min_items_per_chunk: usize,
    task: &(dyn Fn(Range<usize>) + Sync),
) {
    if items == 0 {
        return;
    }

    match pool {
        Some(pool) if items >= min_items_per_chunk * 2 => pool.run(items, task),
        _ => task(0..items),
    }
}

/// Sharded map-collect: every chunk produces a private output vector; the
/// chunk outputs are concatenated in chunk order, so the result does not
/// depend on scheduling.
pub fn collect_sharded<T: Send>(
    pool: Option<&dyn WorkerPool>,
    items: usize,
    min_items_per_chunk: usize,
    task: &(dyn Fn(Range<usize>) -> Vec<T> + Sync),
) -> Vec<T> {
    let outputs: Mutex<Vec<(usize, Vec<T>)>> = Mutex::new(Vec::new());

    run_sharded(pool, items, min_items_per_chunk, &|range| {
        let output = task(range.clone());
        outputs.lock().unwrap().push((range.start, output));
    });

    let mut outputs = outputs.into_inner().unwrap();
    outputs.sort_by_key(|(start, _)| *start);
    outputs.into_iter().flat_map(|(_, output)| output).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn run_sharded_covers_the_whole_range() {
        let sum = AtomicUsize::new(0);
        let pool = RayonPool::new();
        run_sharded(Some(&pool), 1000, 8, &|range| {
            sum.fetch_add(range.sum::<usize>(), Ordering::Relaxed);
        });
        assert_eq!(sum.into_inner(), 1000 * 999 / 2);
    }

    #[test]
    fn small_workloads_stay_sequential() {
        let calls = AtomicUsize::new(0);
        let pool = RayonPool::new();
        run_sharded(Some(&pool), 5, 8, &|range| {
            calls.fetch_add(1, Ordering::Relaxed);
            assert_eq!(range, 0..5);
        });
        assert_eq!(calls.into_inner(), 1);
    }

    #[test]
    fn collect_sharded_is_deterministic() {
        let pool = RayonPool::new();
        let collected = collect_sharded(Some(&pool), 256, 4, &|range| range.collect());
        assert_eq!(collected, (0..256).collect::<Vec<_>>());
    }
}
