//! Bounded worker pool that drains key-check jobs.
//!
//! Workers pull jobs from a shared queue, pass the rate gate, issue the
//! request and classify it. Results come back over a channel; the calling
//! thread sees them in completion order and gets them back in input order.

use crate::client::{KeyCheckRequest, KeyCheckTransport};
use crate::clock::Clock;
use crate::gate::RateGate;
use crate::keys::key_fingerprint;
use crate::policy::classify::{classify, excerpt, Verdict};
use crate::report::KeyCheckResult;
use crate::KeycheckError;
use std::collections::VecDeque;
use std::sync::{mpsc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

/// A request tagged with its 1-based input position.
#[derive(Debug, Clone)]
pub struct Job {
    /// 1-based input position.
    pub index: usize,
    /// The request to issue.
    pub request: KeyCheckRequest,
}

/// Fixed-size pool of worker threads.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: usize,
}

impl WorkerPool {
    /// Create a pool with at most `max_workers` workers (minimum one).
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Configured worker limit.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every job and block until all results are in.
    ///
    /// `on_result` runs on the calling thread once per finished job, in
    /// completion order. The returned results are in input order. A
    /// failing job never affects the others.
    pub fn run<F>(
        &self,
        jobs: Vec<Job>,
        transport: &dyn KeyCheckTransport,
        gate: &RateGate,
        clock: &dyn Clock,
        mut on_result: F,
    ) -> Vec<KeyCheckResult>
    where
        F: FnMut(&KeyCheckResult),
    {
        let total = jobs.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.max_workers.min(total);
        let queue = Mutex::new(jobs.into_iter().collect::<VecDeque<_>>());
        let (tx, rx) = mpsc::channel();

        debug!(workers, jobs = total, "starting worker pool");

        let mut results = thread::scope(|s| {
            for worker in 0..workers {
                let tx = tx.clone();
                let queue = &queue;
                s.spawn(move || {
                    while let Some(job) = next_job(queue) {
                        let result = run_job(job, transport, gate, clock);
                        if tx.send(result).is_err() {
                            break;
                        }
                    }
                    debug!(worker, "worker finished");
                });
            }
            // Only worker senders remain, so the receive loop ends when they do.
            drop(tx);

            let mut results = Vec::with_capacity(total);
            for result in rx {
                on_result(&result);
                results.push(result);
            }
            results
        });

        results.sort_by_key(|r| r.index);
        results
    }
}

fn next_job(queue: &Mutex<VecDeque<Job>>) -> Option<Job> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}

/// Gate, send and classify one job. Never fails: errors become verdicts.
fn run_job(
    job: Job,
    transport: &dyn KeyCheckTransport,
    gate: &RateGate,
    clock: &dyn Clock,
) -> KeyCheckResult {
    let fingerprint = key_fingerprint(&job.request.key);

    gate.acquire();
    debug!(index = job.index, key = %fingerprint, "dispatching key check");

    let verdict = match transport.check(&job.request) {
        Ok(response) => classify(response.status, &response.body, response.remaining_quota),
        Err(KeycheckError::Protocol(detail)) => Verdict::Parse {
            detail: excerpt(&detail),
        },
        Err(e) => {
            warn!(index = job.index, key = %fingerprint, error = %e, "key check transport failure");
            Verdict::Transport {
                reason: e.to_string(),
            }
        }
    };

    info!(
        index = job.index,
        key = %fingerprint,
        verdict = verdict.kind(),
        "key check finished"
    );

    KeyCheckResult::new(job.index, job.request.key, verdict, clock.now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RawResponse;
    use crate::clock::{MockClock, SystemClock};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Answers by key: "ok*" passes, "bad*" is 401, "slow*" times out.
    struct ScriptedTransport {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedTransport {
        fn new(delay: Duration) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    impl KeyCheckTransport for ScriptedTransport {
        fn check(&self, request: &KeyCheckRequest) -> Result<RawResponse, KeycheckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if request.key.starts_with("ok") {
                Ok(RawResponse::new(200, format!(r#"{{"text": "hello {}"}}"#, request.key)))
            } else if request.key.starts_with("bad") {
                Ok(RawResponse::new(401, ""))
            } else if request.key.starts_with("garbled") {
                Err(KeycheckError::Protocol("bad request body".to_string()))
            } else {
                Err(KeycheckError::Transport("request timed out after 30.0s".to_string()))
            }
        }
    }

    fn jobs(keys: &[&str]) -> Vec<Job> {
        keys.iter()
            .enumerate()
            .map(|(i, key)| Job {
                index: i + 1,
                request: KeyCheckRequest::new(*key, "gemini-test", "ping"),
            })
            .collect()
    }

    #[test]
    fn test_one_result_per_job_in_input_order() {
        let transport = ScriptedTransport::new(Duration::from_millis(5));
        let clock = Arc::new(SystemClock);
        let gate = RateGate::new(Duration::ZERO, clock.clone());
        let keys = ["ok1", "bad1", "ok2", "slow1", "ok3", "bad2", "ok4"];

        let mut seen = 0;
        let results = WorkerPool::new(3).run(jobs(&keys), &transport, &gate, clock.as_ref(), |_| {
            seen += 1
        });

        assert_eq!(seen, keys.len());
        assert_eq!(results.len(), keys.len());
        for (result, key) in results.iter().zip(keys.iter()) {
            assert_eq!(&result.key, key);
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), keys.len());
    }

    #[test]
    fn test_in_flight_bounded_by_max_workers() {
        let transport = ScriptedTransport::new(Duration::from_millis(20));
        let clock = Arc::new(SystemClock);
        let gate = RateGate::new(Duration::ZERO, clock.clone());
        let keys: Vec<String> = (0..12).map(|i| format!("ok{}", i)).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();

        WorkerPool::new(3).run(jobs(&key_refs), &transport, &gate, clock.as_ref(), |_| {});

        let max = transport.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "observed {} in flight", max);
        assert!(max >= 1);
    }

    #[test]
    fn test_failures_do_not_abort_siblings() {
        let transport = ScriptedTransport::new(Duration::ZERO);
        let clock = Arc::new(SystemClock);
        let gate = RateGate::new(Duration::ZERO, clock.clone());

        let results = WorkerPool::new(2).run(
            jobs(&["slow1", "ok1", "garbled1", "ok2"]),
            &transport,
            &gate,
            clock.as_ref(),
            |_| {},
        );

        let kinds: Vec<&str> = results.iter().map(|r| r.verdict.kind()).collect();
        assert_eq!(kinds, vec!["transport", "passed", "parse", "passed"]);
        assert!(results[0].message.starts_with("transport failure"));
        assert!(results[1].message.contains("hello ok1"));
    }

    #[test]
    fn test_rate_gate_applies_across_workers() {
        let transport = ScriptedTransport::new(Duration::ZERO);
        let clock = Arc::new(MockClock::from_rfc3339("2025-01-15T12:00:00Z"));
        let gate = RateGate::new(Duration::from_secs(1), clock.clone());

        let results = WorkerPool::new(4).run(
            jobs(&["ok1", "ok2", "ok3", "ok4", "ok5"]),
            &transport,
            &gate,
            clock.as_ref(),
            |_| {},
        );

        assert_eq!(results.len(), 5);
        // Five starts one second apart: four waits.
        assert_eq!(clock.elapsed(), Duration::from_secs(4));
    }

    #[test]
    fn test_empty_job_list() {
        let transport = ScriptedTransport::new(Duration::ZERO);
        let clock = Arc::new(SystemClock);
        let gate = RateGate::new(Duration::ZERO, clock.clone());

        let results = WorkerPool::new(4).run(Vec::new(), &transport, &gate, clock.as_ref(), |_| {});
        assert!(results.is_empty());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pool_minimum_one_worker() {
        assert_eq!(WorkerPool::new(0).max_workers(), 1);
        assert_eq!(WorkerPool::new(8).max_workers(), 8);
    }
}
