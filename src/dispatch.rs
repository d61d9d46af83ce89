//! Work partitioning and blocking dispatch of independent workers.
//!
//! Work is always described the same way: the output is a flat buffer, and
//! each worker gets one contiguous range of it together with the matching
//! exclusive sub-slice. With the `rayon` feature the ranges run on a
//! dedicated fixed-size pool that is torn down when the call returns;
//! without it, or when one thread is requested, everything runs inline on
//! the calling thread. Partitioning is a pure function of the buffer length
//! and the thread count, so what gets computed never depends on scheduling.

use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "rayon")]
use crate::util::ConvError;
use crate::util::ConvResult;

/// Splits `0..total` into at most `parts` contiguous ranges.
///
/// Ranges are as even as integer division allows, the remainder going to
/// the first few. No range is ever empty, so fewer than `parts` ranges come
/// back when `total < parts`. `parts` of zero is treated as one.
pub(crate) fn split_ranges(total: usize, parts: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    let parts = parts.clamp(1, total);
    let base = total / parts;
    let remainder = total % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for index in 0..parts {
        let len = base + usize::from(index < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    debug_assert_eq!(start, total);
    ranges
}

/// Runs `worker` over `out` split into `num_threads` contiguous ranges and
/// blocks until all of them finish.
///
/// Each invocation receives the global index range it covers and the
/// matching exclusive sub-slice of `out`. When any worker fails, one of the
/// errors is returned and the contents of `out` are unspecified.
pub(crate) fn run_ranges<T, F>(out: &mut [T], num_threads: usize, worker: F) -> ConvResult<()>
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) -> ConvResult<()> + Sync,
{
    if out.is_empty() {
        return Ok(());
    }
    if num_threads <= 1 {
        return worker(0..out.len(), out);
    }
    run_parallel(out, num_threads, worker)
}

#[cfg(feature = "rayon")]
fn run_parallel<T, F>(out: &mut [T], num_threads: usize, worker: F) -> ConvResult<()>
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) -> ConvResult<()> + Sync,
{
    let ranges = split_ranges(out.len(), num_threads);
    if ranges.len() <= 1 {
        return worker(0..out.len(), out);
    }

    let mut tasks = Vec::with_capacity(ranges.len());
    let mut rest = out;
    for range in &ranges {
        let (chunk, tail) = rest.split_at_mut(range.len());
        tasks.push((range.clone(), chunk));
        rest = tail;
    }

    // A dedicated pool keeps the worker count exactly as requested instead
    // of inheriting whatever the global pool was sized to.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ranges.len())
        .build()
        .map_err(|err| ConvError::ThreadPool {
            reason: err.to_string(),
        })?;
    pool.install(|| {
        tasks
            .into_par_iter()
            .try_for_each(|(range, chunk)| worker(range, chunk))
    })
}

#[cfg(not(feature = "rayon"))]
fn run_parallel<T, F>(out: &mut [T], _num_threads: usize, worker: F) -> ConvResult<()>
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) -> ConvResult<()> + Sync,
{
    // Without rayon every request degrades to the calling thread.
    worker(0..out.len(), out)
}

#[cfg(test)]
mod tests {
    use super::{run_ranges, split_ranges};
    use crate::util::ConvError;

    #[test]
    fn split_covers_every_index_exactly_once() {
        for &(total, parts) in &[(10, 4), (7, 7), (100, 3), (5, 1), (64, 64)] {
            let ranges = split_ranges(total, parts);
            assert!(ranges.len() <= parts);
            assert!(ranges.iter().all(|r| !r.is_empty()));
            let mut next = 0;
            for range in &ranges {
                assert_eq!(range.start, next);
                next = range.end;
            }
            assert_eq!(next, total);
        }
    }

    #[test]
    fn split_gives_the_remainder_to_the_first_ranges() {
        let ranges = split_ranges(10, 4);
        let lens: Vec<usize> = ranges.iter().map(|r| r.len()).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
    }

    #[test]
    fn split_never_produces_empty_ranges() {
        assert_eq!(split_ranges(3, 8).len(), 3);
        assert_eq!(split_ranges(0, 4).len(), 0);
        assert_eq!(split_ranges(5, 0).len(), 1);
    }

    #[test]
    fn sequential_worker_sees_the_whole_buffer() {
        let mut out = vec![0usize; 9];
        run_ranges(&mut out, 1, |range, chunk| {
            assert_eq!(range, 0..9);
            for (slot, index) in chunk.iter_mut().zip(range) {
                *slot = index + 1;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn sequential_worker_errors_surface() {
        let mut out = vec![0u8; 4];
        let result = run_ranges(&mut out, 1, |_range, _chunk| {
            Err(ConvError::ThreadPool {
                reason: "boom".to_string(),
            })
        });
        assert_eq!(
            result,
            Err(ConvError::ThreadPool {
                reason: "boom".to_string(),
            })
        );
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_ranges_tile_the_output() {
        let mut out = vec![0usize; 103];
        run_ranges(&mut out, 5, |range, chunk| {
            assert_eq!(range.len(), chunk.len());
            for (slot, index) in chunk.iter_mut().zip(range) {
                *slot = index * 3;
            }
            Ok(())
        })
        .unwrap();
        for (index, &value) in out.iter().enumerate() {
            assert_eq!(value, index * 3);
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_worker_errors_surface() {
        let mut out = vec![0u32; 100];
        let result = run_ranges(&mut out, 4, |range, _chunk| {
            if range.contains(&42) {
                Err(ConvError::ThreadPool {
                    reason: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        });
        assert_eq!(
            result,
            Err(ConvError::ThreadPool {
                reason: "boom".to_string(),
            })
        );
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn more_threads_than_elements_still_works() {
        let mut out = vec![0usize; 3];
        run_ranges(&mut out, 16, |range, chunk| {
            for (slot, index) in chunk.iter_mut().zip(range) {
                *slot = index;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(out, vec![0, 1, 2]);
    }
}
