//! Measurement records
//!
//! A record is the immutable outcome of one instrumented invocation.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

/// The outcome of one instrumented invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Logical name of the operation, stable across engines
    pub operation: String,
    /// Label of the backend that executed the operation
    pub engine: String,
    /// Average wall-clock time over the timed trials, in seconds
    pub mean_duration: f64,
    /// Number of items returned, or 1 for a non-sequence value
    pub result_count: u64,
    /// Caller-assigned complexity tag, opaque to the harness
    pub complexity_score: u32,
}

impl fmt::Display for MeasurementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:10} | {:34} | {:.4}s | {:4} results",
            self.engine, self.operation, self.mean_duration, self.result_count)
    }
}

/// Tags attached to an instrumented operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTag {
    pub operation: String,
    pub engine: String,
    pub complexity_score: u32,
}

impl OperationTag {
    /// Create a tag with the default complexity of 1
    pub fn new<O: Into<String>, E: Into<String>>(operation: O, engine: E) -> Self {
        OperationTag {
            operation: operation.into(),
            engine: engine.into(),
            complexity_score: 1,
        }
    }

    /// Set the complexity score (clamped to at least 1)
    pub fn with_complexity(mut self, complexity_score: u32) -> Self {
        self.complexity_score = complexity_score.max(1);
        self
    }
}

/// Number of items an operation result stands for.
///
/// Sequences report their length, anything else counts as a single item.
pub trait ResultCount {
    fn result_count(&self) -> u64;
}

macro_rules! scalar_result_count {
    ($($t:ty),* $(,)?) => {
        $(
            impl ResultCount for $t {
                fn result_count(&self) -> u64 {
                    1
                }
            }
        )*
    };
}

scalar_result_count!(
    (), bool, char, u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize, f32, f64, String, str,
);

impl<T> ResultCount for Vec<T> {
    fn result_count(&self) -> u64 {
        self.len() as u64
    }
}

impl<T> ResultCount for [T] {
    fn result_count(&self) -> u64 {
        self.len() as u64
    }
}

impl<T, const N: usize> ResultCount for [T; N] {
    fn result_count(&self) -> u64 {
        N as u64
    }
}

impl<T> ResultCount for VecDeque<T> {
    fn result_count(&self) -> u64 {
        self.len() as u64
    }
}

impl<K, V> ResultCount for BTreeMap<K, V> {
    fn result_count(&self) -> u64 {
        self.len() as u64
    }
}

impl<K, V, S> ResultCount for HashMap<K, V, S> {
    fn result_count(&self) -> u64 {
        self.len() as u64
    }
}

impl<T, S> ResultCount for HashSet<T, S> {
    fn result_count(&self) -> u64 {
        self.len() as u64
    }
}

// An optional value is still a single (possibly empty) value, not a sequence.
impl<T> ResultCount for Option<T> {
    fn result_count(&self) -> u64 {
        1
    }
}

impl<T: ResultCount + ?Sized> ResultCount for &T {
    fn result_count(&self) -> u64 {
        (**self).result_count()
    }
}

impl<T: ResultCount + ?Sized> ResultCount for Box<T> {
    fn result_count(&self) -> u64 {
        (**self).result_count()
    }
}

impl ResultCount for serde_json::Value {
    fn result_count(&self) -> u64 {
        match self {
            serde_json::Value::Array(items) => items.len() as u64,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sequence_counts() {
        assert_eq!(vec![1, 2, 3].result_count(), 3);
        assert_eq!(Vec::<u8>::new().result_count(), 0);
        assert_eq!([0u8; 4].result_count(), 4);
        assert_eq!((&[1, 2][..]).result_count(), 2);
        assert_eq!(json!([1, 2, 3, 4]).result_count(), 4);
    }

    #[test]
    fn test_scalar_counts() {
        assert_eq!(42i64.result_count(), 1);
        assert_eq!(3.5f64.result_count(), 1);
        assert_eq!("hello".to_string().result_count(), 1);
        assert_eq!(().result_count(), 1);
        assert_eq!(None::<Vec<u8>>.result_count(), 1);
        assert_eq!(json!({"a": 1}).result_count(), 1);
    }

    #[test]
    fn test_tag_complexity_is_positive() {
        let tag = OperationTag::new("lookup", "EngineA").with_complexity(0);
        assert_eq!(tag.complexity_score, 1);
        assert_eq!(OperationTag::new("lookup", "EngineA").complexity_score, 1);
    }
}
