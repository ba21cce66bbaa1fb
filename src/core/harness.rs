//! Measurement harness
//!
//! This module provides the instrumentation layer used to time arbitrary
//! operations, tag them with metadata and accumulate the outcome as
//! [`MeasurementRecord`]s for later aggregation.
//!
//! The harness is single-threaded: its log lives in a `RefCell` so that
//! instrumented closures can share the harness by reference while it keeps
//! exclusive ownership of the records.

use std::cell::RefCell;
use std::hint::black_box;
use std::time::Instant;

use log::debug;

use crate::core::errors::{BenchError, Result};
use crate::core::record::{MeasurementRecord, OperationTag, ResultCount};

/// How the value handed back to the caller is obtained.
///
/// With [`ResultCapture::ExtraRun`] the operation runs `trial_count + 1`
/// times: every timed trial result is discarded and one more untimed run
/// produces the returned value. Operations with side effects (writes,
/// counters...) will see those effects applied on every run.
///
/// [`ResultCapture::FirstTrial`] keeps the value of the first timed trial
/// instead, so the operation runs exactly `trial_count` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultCapture {
    #[default]
    ExtraRun,
    FirstTrial,
}

/// Times operations and keeps an append-only log of the measurements
#[derive(Debug)]
pub struct MeasurementHarness {
    /// Number of timed trials per invocation
    trial_count: u32,
    /// Where the returned value comes from
    capture: ResultCapture,
    /// Records accumulated so far, in invocation order
    records: RefCell<Vec<MeasurementRecord>>,
}

impl Default for MeasurementHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementHarness {
    /// Trial count used by [`MeasurementHarness::new`]
    pub const DEFAULT_TRIALS: u32 = 10;

    /// Create an empty harness running 10 trials per invocation
    pub fn new() -> Self {
        MeasurementHarness {
            trial_count: Self::DEFAULT_TRIALS,
            capture: ResultCapture::default(),
            records: RefCell::new(Vec::new()),
        }
    }

    /// Create an empty harness with a custom trial count
    pub fn with_trials(trial_count: u32) -> Result<Self> {
        if trial_count == 0 {
            return Err(BenchError::Config("trial count must be at least 1".to_string()));
        }

        Ok(MeasurementHarness {
            trial_count,
            ..Self::new()
        })
    }

    /// Change how the returned value is captured
    pub fn with_capture(mut self, capture: ResultCapture) -> Self {
        self.capture = capture;
        self
    }

    pub fn trial_count(&self) -> u32 {
        self.trial_count
    }

    pub fn capture(&self) -> ResultCapture {
        self.capture
    }

    /// Time `operation`, log a record for it and return its result.
    ///
    /// Any failure, including one during a timed trial, is returned as-is
    /// and leaves the log untouched.
    pub fn measure<T, E, F>(&self, tag: &OperationTag, mut operation: F) -> std::result::Result<T, E>
    where
        T: ResultCount,
        F: FnMut() -> std::result::Result<T, E>,
    {
        let mut captured = None;

        let start = Instant::now();
        for trial in 0..self.trial_count {
            let value = operation()?;
            if trial == 0 && self.capture == ResultCapture::FirstTrial {
                captured = Some(value);
            } else {
                black_box(value);
            }
        }
        let elapsed = start.elapsed();

        let mean_duration = elapsed.as_secs_f64() / f64::from(self.trial_count);

        let result = match captured {
            Some(value) => value,
            None => operation()?,
        };

        let record = MeasurementRecord {
            operation: tag.operation.clone(),
            engine: tag.engine.clone(),
            mean_duration,
            result_count: result.result_count(),
            complexity_score: tag.complexity_score,
        };

        debug!("Recorded {}/{}: {:.6}s, {} results",
            record.engine, record.operation, record.mean_duration, record.result_count);

        self.records.borrow_mut().push(record);

        Ok(result)
    }

    /// Prepare a decorator for the given tags.
    ///
    /// ```
    /// use storebench::MeasurementHarness;
    ///
    /// let harness = MeasurementHarness::new();
    /// let mut lookup = harness
    ///     .instrument("lookup", "EngineA", 2)
    ///     .wrap(|| Ok::<_, std::convert::Infallible>(vec![1, 2, 3]));
    ///
    /// assert_eq!(lookup().unwrap(), vec![1, 2, 3]);
    /// assert_eq!(harness.collected_records()[0].result_count, 3);
    /// ```
    pub fn instrument<O, E>(&self, operation: O, engine: E, complexity_score: u32) -> Instrument<'_>
    where
        O: Into<String>,
        E: Into<String>,
    {
        Instrument {
            harness: self,
            tag: OperationTag::new(operation, engine).with_complexity(complexity_score),
        }
    }

    /// Snapshot of every record accumulated so far, in insertion order
    pub fn collected_records(&self) -> Vec<MeasurementRecord> {
        self.records.borrow().clone()
    }

    /// Number of records accumulated so far
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// End the session, handing the whole log over to the caller
    pub fn into_records(self) -> Vec<MeasurementRecord> {
        self.records.into_inner()
    }
}

/// A decorator bound to a harness and a set of tags
#[derive(Debug, Clone)]
pub struct Instrument<'h> {
    harness: &'h MeasurementHarness,
    tag: OperationTag,
}

impl<'h> Instrument<'h> {
    pub fn tag(&self) -> &OperationTag {
        &self.tag
    }

    /// Wrap `operation` so every call through the wrapper is measured
    pub fn wrap<T, E, F>(self, mut operation: F) -> impl FnMut() -> std::result::Result<T, E> + 'h
    where
        T: ResultCount,
        F: FnMut() -> std::result::Result<T, E> + 'h,
    {
        let Instrument { harness, tag } = self;
        move || harness.measure(&tag, &mut operation)
    }

    /// Measure `operation` once, without keeping a wrapper around
    pub fn call<T, E, F>(&self, operation: F) -> std::result::Result<T, E>
    where
        T: ResultCount,
        F: FnMut() -> std::result::Result<T, E>,
    {
        self.harness.measure(&self.tag, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_records_in_invocation_order() {
        let harness = MeasurementHarness::with_trials(2).unwrap();

        for i in 0..5u64 {
            let tag = OperationTag::new(format!("op-{}", i), "EngineA");
            harness.measure(&tag, || Ok::<_, Infallible>(i)).unwrap();
        }

        let records = harness.collected_records();
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.operation, format!("op-{}", i));
            assert_eq!(record.engine, "EngineA");
            assert_eq!(record.result_count, 1);
            assert!(record.mean_duration >= 0.0);
        }
    }

    #[test]
    fn test_result_is_returned_unchanged() {
        let harness = MeasurementHarness::with_trials(3).unwrap();
        let mut wrapped = harness
            .instrument("list", "EngineB", 1)
            .wrap(|| Ok::<_, Infallible>(vec!["a", "b"]));

        assert_eq!(wrapped().unwrap(), vec!["a", "b"]);
        assert_eq!(harness.collected_records()[0].result_count, 2);
    }

    #[test]
    fn test_extra_run_executes_trials_plus_one() {
        let harness = MeasurementHarness::with_trials(4).unwrap();
        let calls = Cell::new(0u32);

        let value = harness
            .instrument("count", "EngineA", 1)
            .call(|| {
                calls.set(calls.get() + 1);
                Ok::<_, Infallible>(calls.get())
            })
            .unwrap();

        assert_eq!(calls.get(), 5);
        // The returned value comes from the untimed run
        assert_eq!(value, 5);
    }

    #[test]
    fn test_first_trial_capture() {
        let harness = MeasurementHarness::with_trials(4)
            .unwrap()
            .with_capture(ResultCapture::FirstTrial);
        let calls = Cell::new(0u32);

        let value = harness
            .instrument("count", "EngineA", 1)
            .call(|| {
                calls.set(calls.get() + 1);
                Ok::<_, Infallible>(calls.get())
            })
            .unwrap();

        assert_eq!(calls.get(), 4);
        assert_eq!(value, 1);
        assert_eq!(harness.len(), 1);
    }

    #[test]
    fn test_failure_leaves_log_unchanged() {
        let harness = MeasurementHarness::with_trials(5).unwrap();
        harness
            .instrument("ok", "EngineA", 1)
            .call(|| Ok::<_, String>(1u32))
            .unwrap();

        // Fails on the third timed trial
        let calls = Cell::new(0u32);
        let result = harness.instrument("flaky", "EngineA", 1).call(|| {
            calls.set(calls.get() + 1);
            if calls.get() == 3 {
                Err("backend unavailable".to_string())
            } else {
                Ok(vec![1, 2])
            }
        });

        assert_eq!(result.unwrap_err(), "backend unavailable");
        assert_eq!(calls.get(), 3);
        assert_eq!(harness.len(), 1);
        assert_eq!(harness.collected_records()[0].operation, "ok");
    }

    #[test]
    fn test_failure_on_result_run() {
        let harness = MeasurementHarness::with_trials(2).unwrap();
        let calls = Cell::new(0u32);

        let result = harness.instrument("late", "EngineA", 1).call(|| {
            calls.set(calls.get() + 1);
            if calls.get() > 2 {
                Err(BenchError::Operation("query error".to_string()))
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(BenchError::Operation(_))));
        assert!(harness.is_empty());
    }

    #[test]
    fn test_mean_duration_tracks_fixed_delay() {
        let harness = MeasurementHarness::with_trials(5).unwrap();
        harness
            .instrument("sleep", "EngineA", 1)
            .call(|| {
                thread::sleep(Duration::from_millis(5));
                Ok::<_, Infallible>(())
            })
            .unwrap();

        let record = &harness.collected_records()[0];
        assert!(record.mean_duration >= 0.005);
        assert!(record.mean_duration < 0.05);
    }

    #[test]
    fn test_snapshots_are_stable() {
        let harness = MeasurementHarness::with_trials(1).unwrap();
        harness.instrument("a", "EngineA", 3).call(|| Ok::<_, Infallible>(0u8)).unwrap();

        let first = harness.collected_records();
        let second = harness.collected_records();
        assert_eq!(first, second);
        assert_eq!(first[0].complexity_score, 3);
    }

    #[test]
    fn test_zero_trials_is_rejected() {
        assert!(matches!(MeasurementHarness::with_trials(0), Err(BenchError::Config(_))));
        assert_eq!(MeasurementHarness::new().trial_count(), 10);
    }

    #[test]
    fn test_into_records_drains_log() {
        let harness = MeasurementHarness::with_trials(1).unwrap();
        let mut wrapped = harness.instrument("a", "EngineA", 1).wrap(|| Ok::<_, Infallible>(()));
        wrapped().unwrap();
        wrapped().unwrap();
        drop(wrapped);

        let records = harness.into_records();
        assert_eq!(records.len(), 2);
    }
}
