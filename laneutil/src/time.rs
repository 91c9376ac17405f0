use std::time::Instant;

/// The work fed through parallelize() is memory-bound; more workers than this
/// don't help.
const MAX_WORKERS: usize = 10;

pub fn elapsed_seconds(since: Instant) -> f64 {
    since.elapsed().as_secs_f64()
}

/// Hierarchical measurement of how long expensive operations take, with
/// progress logging for long loops.
pub struct Timer {
    outermost_name: String,
    started_at: Instant,
    spans: Vec<(String, Instant)>,
    progress: Option<Progress>,
}

struct Progress {
    label: String,
    processed: usize,
    total: usize,
    last_logged: Instant,
}

impl Timer {
    pub fn new<S: Into<String>>(name: S) -> Timer {
        let name = name.into();
        info!("{}...", name);
        Timer {
            outermost_name: name,
            started_at: Instant::now(),
            spans: Vec::new(),
            progress: None,
        }
    }

    /// For when a Timer is required, but nobody cares about the results.
    pub fn throwaway() -> Timer {
        Timer::new("throwaway")
    }

    pub fn start<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        info!("- {}...", name);
        self.spans.push((name, Instant::now()));
    }

    pub fn stop(&mut self, name: &str) {
        let (span_name, started) = self.spans.pop().expect("stop() with no matching start()");
        assert_eq!(span_name, name, "stop({}) but a {} span is open", name, span_name);
        info!("- {} took {:.2}s", name, elapsed_seconds(started));
    }

    pub fn start_iter<S: Into<String>>(&mut self, label: S, total: usize) {
        self.progress = Some(Progress {
            label: label.into(),
            processed: 0,
            total,
            last_logged: Instant::now(),
        });
    }

    pub fn next(&mut self) {
        let progress = self.progress.as_mut().expect("next() with no start_iter()");
        progress.processed += 1;
        if elapsed_seconds(progress.last_logged) >= 1.0 || progress.processed == progress.total {
            info!(
                "- {}: {}/{}",
                progress.label, progress.processed, progress.total
            );
            progress.last_logged = Instant::now();
        }
    }

    /// Executes the callback over all requests in parallel, on a bounded pool
    /// of workers. Results come back in the order of the requests.
    pub fn parallelize<I, O, F: Fn(I) -> O>(
        &mut self,
        timer_name: &str,
        requests: Vec<I>,
        cb: F,
    ) -> Vec<O>
    where
        I: Send,
        O: Send,
        F: Send + Clone + Copy,
    {
        let num_workers = MAX_WORKERS.min(num_cpus::get()).max(1);
        scoped_threadpool::Pool::new(num_workers as u32).scoped(|scope| {
            let (tx, rx) = std::sync::mpsc::channel();
            let mut results: Vec<Option<O>> = std::iter::repeat_with(|| None)
                .take(requests.len())
                .collect();
            for (idx, req) in requests.into_iter().enumerate() {
                let tx = tx.clone();
                scope.execute(move || {
                    tx.send((idx, cb(req))).unwrap();
                });
            }
            drop(tx);

            self.start_iter(timer_name, results.len());
            for (idx, result) in rx.iter() {
                self.next();
                results[idx] = Some(result);
            }
            results.into_iter().map(|x| x.unwrap()).collect()
        })
    }
}

impl std::ops::Drop for Timer {
    fn drop(&mut self) {
        if let Some((name, _)) = self.spans.last() {
            warn!("dropping Timer with an open span {}", name);
        }
        info!(
            "{} done in {:.2}s",
            self.outermost_name,
            elapsed_seconds(self.started_at)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallelize_preserves_order() {
        let mut timer = Timer::throwaway();
        let results = timer.parallelize("squares", (0..100usize).collect(), |x| x * x);
        assert_eq!(results.len(), 100);
        for (idx, x) in results.into_iter().enumerate() {
            assert_eq!(x, idx * idx);
        }
    }
}
