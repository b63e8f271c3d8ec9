//! Key Checker - the main public API.
//!
//! The `KeyChecker` ties the pieces together:
//! - Local validation of every key before any network call
//! - Rate-gated, bounded-concurrency dispatch
//! - Classification into pass/fail results and a final report

use crate::client::http::GeminiClient;
use crate::client::{KeyCheckRequest, KeyCheckTransport};
use crate::clock::{Clock, SystemClock};
use crate::config::CheckerConfig;
use crate::dispatch::pool::{Job, WorkerPool};
use crate::gate::RateGate;
use crate::keys::{key_fingerprint, validate_key};
use crate::policy::classify::Verdict;
use crate::report::{KeyCheckResult, Report};
use crate::KeycheckError;
use std::sync::Arc;
use tracing::{debug, info};

/// Main entry point for checking a batch of keys.
///
/// Create one instance per run. Each call to [`KeyChecker::check_keys`]
/// shares the same rate gate, so spacing holds across calls too.
pub struct KeyChecker {
    config: CheckerConfig,
    clock: Arc<dyn Clock>,
    transport: Arc<dyn KeyCheckTransport>,
    gate: RateGate,
}

impl KeyChecker {
    /// Create a checker that talks to the real API.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    pub fn new(config: CheckerConfig) -> Result<Self, KeycheckError> {
        config.validate()?;
        let transport = Arc::new(GeminiClient::new(&config)?);
        Ok(Self::build(config, transport, Arc::new(SystemClock)))
    }

    /// Create a checker with a custom transport and clock.
    pub fn with_transport(
        config: CheckerConfig,
        transport: Arc<dyn KeyCheckTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KeycheckError> {
        config.validate()?;
        Ok(Self::build(config, transport, clock))
    }

    fn build(
        config: CheckerConfig,
        transport: Arc<dyn KeyCheckTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = RateGate::new(config.min_interval, clock.clone());
        Self {
            config,
            clock,
            transport,
            gate,
        }
    }

    /// Check every key and return the report.
    ///
    /// # Errors
    /// - `NoKeys` - `keys` is empty
    /// - `NoValidKeys` - every key failed local validation (no request sent)
    pub fn check_keys(&self, keys: &[String]) -> Result<Report, KeycheckError> {
        self.check_keys_with_progress(keys, |_| {})
    }

    /// Like [`KeyChecker::check_keys`], calling `on_result` as each key finishes.
    ///
    /// Locally rejected keys are reported first, then network results in
    /// completion order.
    pub fn check_keys_with_progress<F>(
        &self,
        keys: &[String],
        mut on_result: F,
    ) -> Result<Report, KeycheckError>
    where
        F: FnMut(&KeyCheckResult),
    {
        if keys.is_empty() {
            return Err(KeycheckError::NoKeys);
        }

        let (jobs, rejected) = self.prepare(keys);
        for result in &rejected {
            on_result(result);
        }
        if jobs.is_empty() {
            return Err(KeycheckError::NoValidKeys {
                rejected: rejected.len(),
            });
        }

        info!(
            keys = keys.len(),
            dispatched = jobs.len(),
            rejected = rejected.len(),
            model = %self.config.model,
            max_workers = self.config.max_workers,
            min_interval_ms = self.config.min_interval.as_millis() as u64,
            "checking keys"
        );

        let pool = WorkerPool::new(self.config.max_workers);
        let mut results = pool.run(
            jobs,
            self.transport.as_ref(),
            &self.gate,
            self.clock.as_ref(),
            &mut on_result,
        );
        results.extend(rejected);

        let report = Report::new(results);
        info!(
            passed = report.passed,
            failed = report.failed,
            "key check run complete"
        );
        Ok(report)
    }

    /// Split keys into dispatchable jobs and locally rejected results.
    fn prepare(&self, keys: &[String]) -> (Vec<Job>, Vec<KeyCheckResult>) {
        let mut jobs = Vec::new();
        let mut rejected = Vec::new();

        for (i, key) in keys.iter().enumerate() {
            let index = i + 1;
            match validate_key(key, self.config.strict_key_format) {
                Ok(()) => jobs.push(Job {
                    index,
                    request: KeyCheckRequest::new(
                        key.as_str(),
                        self.config.model.as_str(),
                        self.config.prompt.as_str(),
                    ),
                }),
                Err(e) => {
                    debug!(index, key = %key_fingerprint(key), reason = %e, "key rejected locally");
                    rejected.push(KeyCheckResult::new(
                        index,
                        key.as_str(),
                        Verdict::InvalidInput {
                            reason: e.to_string(),
                        },
                        self.clock.now_utc(),
                    ));
                }
            }
        }

        (jobs, rejected)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }
}
