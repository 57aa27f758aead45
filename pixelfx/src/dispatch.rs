// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Row dispatch over the rayon pool.
//!
//! Work runs on whatever pool the caller is installed in, which is the
//! global rayon pool unless a custom one was entered with
//! `ThreadPool::install`.

use rayon::prelude::*;

/// Surfaces with more pixels than this are processed in parallel.
pub const POOL_THRESHOLD: u64 = 2048;

/// Checks that a `width` x `height` job is big enough for the pool.
#[inline]
pub fn use_pool(width: u32, height: u32) -> bool {
    width as u64 * height as u64 > POOL_THRESHOLD
}

/// Runs `f` on every item, in parallel when `parallel` is set.
///
/// Each item is owned by exactly one worker.
pub fn dispatch<T, F>(items: Vec<T>, parallel: bool, f: F)
where
    T: Send,
    F: Fn(T) + Sync + Send,
{
    if parallel {
        items.into_par_iter().for_each(f);
    } else {
        items.into_iter().for_each(f);
    }
}

/// Maps `0..len` through `f`, in parallel when `parallel` is set.
///
/// Results keep the index order.
pub fn dispatch_map<R, F>(len: usize, parallel: bool, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    if parallel {
        (0..len).into_par_iter().map(f).collect()
    } else {
        (0..len).map(f).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn threshold() {
        assert!(!use_pool(32, 64));
        assert!(use_pool(33, 64));
    }

    #[test]
    fn visits_every_item() {
        for &parallel in &[false, true] {
            let sum = AtomicUsize::new(0);
            dispatch((1..=100).collect(), parallel, |i: usize| {
                sum.fetch_add(i, Ordering::Relaxed);
            });
            assert_eq!(sum.into_inner(), 5050);
        }
    }

    #[test]
    fn map_keeps_order() {
        let v = dispatch_map(10, true, |i| i * 2);
        assert_eq!(v, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }
}
