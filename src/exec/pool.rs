//! Bounded worker pool.
//!
//! Jobs are indices into a slice, handed out over a channel to at most
//! `max_parallel` scoped threads. Results come back tagged with their index
//! so the output order always equals the input order.

use crossbeam_channel::{bounded, unbounded};

pub fn run_ordered<T, R, F>(items: &[T], max_parallel: usize, job: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let workers = max_parallel.clamp(1, items.len());
    if workers == 1 {
        return items.iter().map(&job).collect();
    }

    let (job_tx, job_rx) = bounded::<usize>(items.len());
    for index in 0..items.len() {
        // Capacity equals the job count, so this never blocks
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    let (result_tx, result_rx) = unbounded::<(usize, R)>();
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let job = &job;
            scope.spawn(move || {
                for index in job_rx.iter() {
                    let _ = result_tx.send((index, job(&items[index])));
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    for (index, result) in result_rx.try_iter() {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}
