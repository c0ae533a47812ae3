use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Result of a PUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Added,
    AlreadyExists,
}

/// Shared in-memory tuple space.
///
/// One mutex guards the map and every counter, so each operation's
/// existence check and mutation happen as a single step.
pub struct TupleStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tuples: HashMap<String, String>,
    key_bytes: usize,
    value_bytes: usize,
    counters: Counters,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    clients: u64,
    operations: u64,
    reads: u64,
    gets: u64,
    puts: u64,
    errors: u64,
}

/// Point-in-time view of the store
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tuple_count: usize,
    pub avg_tuple_size: f64,
    pub avg_key_size: f64,
    pub avg_value_size: f64,
    pub total_clients: u64,
    pub total_operations: u64,
    pub total_reads: u64,
    pub total_gets: u64,
    pub total_puts: u64,
    pub total_errors: u64,
}

impl TupleStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    // Every operation leaves `Inner` consistent before it can panic, so a
    // poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Non-destructive lookup
    pub fn read(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();
        inner.counters.operations += 1;
        inner.counters.reads += 1;

        let value = inner.tuples.get(key).cloned();
        if value.is_none() {
            inner.counters.errors += 1;
        }
        value
    }

    /// Destructive lookup: a hit removes the key
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();
        inner.counters.operations += 1;
        inner.counters.gets += 1;

        match inner.tuples.remove_entry(key) {
            Some((key, value)) => {
                inner.key_bytes -= key.len();
                inner.value_bytes -= value.len();
                Some(value)
            }
            None => {
                inner.counters.errors += 1;
                None
            }
        }
    }

    /// Insert `key` unless it is already present
    pub fn put(&self, key: String, value: String) -> PutOutcome {
        let mut inner = self.lock();
        inner.counters.operations += 1;
        inner.counters.puts += 1;

        if inner.tuples.contains_key(&key) {
            inner.counters.errors += 1;
            return PutOutcome::AlreadyExists;
        }

        inner.key_bytes += key.len();
        inner.value_bytes += value.len();
        inner.tuples.insert(key, value);
        PutOutcome::Added
    }

    /// Count one accepted connection
    pub fn register_client(&self) {
        self.lock().counters.clients += 1;
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        let count = inner.tuples.len();
        let avg = |bytes: usize| {
            if count == 0 {
                0.0
            } else {
                bytes as f64 / count as f64
            }
        };
        let c = inner.counters;

        Snapshot {
            tuple_count: count,
            avg_tuple_size: avg(inner.key_bytes + inner.value_bytes),
            avg_key_size: avg(inner.key_bytes),
            avg_value_size: avg(inner.value_bytes),
            total_clients: c.clients,
            total_operations: c.operations,
            total_reads: c.reads,
            total_gets: c.gets,
            total_puts: c.puts,
            total_errors: c.errors,
        }
    }
}

impl Default for TupleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "______________________________")?;
        writeln!(f, "Total Tuples       |{}", self.tuple_count)?;
        writeln!(f, "Average Tuple Size |{:.2}", self.avg_tuple_size)?;
        writeln!(f, "Average Key Size   |{:.2}", self.avg_key_size)?;
        writeln!(f, "Average Value Size |{:.2}", self.avg_value_size)?;
        writeln!(f, "Total Clients      |{}", self.total_clients)?;
        writeln!(f, "Total Operations   |{}", self.total_operations)?;
        writeln!(f, "Total READs        |{}", self.total_reads)?;
        writeln!(f, "Total GETs         |{}", self.total_gets)?;
        writeln!(f, "Total PUTs         |{}", self.total_puts)?;
        write!(f, "Total Errors       |{}", self.total_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_put_read_get() {
        let store = TupleStore::new();

        assert_eq!(store.put("A".into(), "1".into()), PutOutcome::Added);
        assert_eq!(store.read("A"), Some("1".to_string()));
        assert_eq!(store.read("A"), Some("1".to_string()));
        assert_eq!(store.get("A"), Some("1".to_string()));
        assert_eq!(store.read("A"), None);
        assert_eq!(store.get("A"), None);
    }

    #[test]
    fn test_put_conflict_keeps_first_value() {
        let store = TupleStore::new();

        assert_eq!(store.put("A".into(), "1".into()), PutOutcome::Added);
        assert_eq!(store.put("A".into(), "2".into()), PutOutcome::AlreadyExists);
        assert_eq!(store.read("A"), Some("1".to_string()));
    }

    #[test]
    fn test_value_with_spaces_round_trips() {
        let store = TupleStore::new();
        store.put("k".into(), "hello  big world ".into());
        assert_eq!(store.read("k").as_deref(), Some("hello  big world "));
    }

    #[test]
    fn test_counters() {
        let store = TupleStore::new();
        store.register_client();

        store.put("A".into(), "1".into());
        store.put("A".into(), "2".into()); // error
        store.read("A");
        store.read("B"); // error
        store.get("A");
        store.get("A"); // error

        let s = store.snapshot();
        assert_eq!(s.total_clients, 1);
        assert_eq!(s.total_operations, 6);
        assert_eq!(s.total_puts, 2);
        assert_eq!(s.total_reads, 2);
        assert_eq!(s.total_gets, 2);
        assert_eq!(s.total_errors, 3);
        assert_eq!(s.total_operations, s.total_reads + s.total_gets + s.total_puts);
    }

    #[test]
    fn test_snapshot_empty() {
        let s = TupleStore::new().snapshot();
        assert_eq!(s.tuple_count, 0);
        assert_eq!(s.avg_tuple_size, 0.0);
        assert_eq!(s.avg_key_size, 0.0);
        assert_eq!(s.avg_value_size, 0.0);
    }

    #[test]
    fn test_snapshot_averages() {
        let store = TupleStore::new();
        store.put("ab".into(), "1234".into());
        store.put("abcd".into(), "12".into());
        store.put("x".into(), "gone".into());
        store.get("x");

        let s = store.snapshot();
        assert_eq!(s.tuple_count, 2);
        assert_eq!(s.avg_key_size, 3.0);
        assert_eq!(s.avg_value_size, 3.0);
        assert_eq!(s.avg_tuple_size, 6.0);
    }

    #[test]
    fn test_snapshot_display() {
        let store = TupleStore::new();
        store.put("ab".into(), "1234".into());

        let report = store.snapshot().to_string();
        assert!(report.contains("Total Tuples       |1"));
        assert!(report.contains("Average Tuple Size |6.00"));
        assert!(report.contains("Total PUTs         |1"));
        assert!(report.ends_with("Total Errors       |0"));
    }

    #[test]
    fn test_concurrent_put_single_winner() {
        let store = Arc::new(TupleStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.put("k".into(), i.to_string()))
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let added = outcomes.iter().filter(|o| **o == PutOutcome::Added).count();
        assert_eq!(added, 1);

        let s = store.snapshot();
        assert_eq!(s.tuple_count, 1);
        assert_eq!(s.total_errors, 15);
    }

    #[test]
    fn test_concurrent_get_single_winner() {
        let store = Arc::new(TupleStore::new());
        store.put("k".into(), "v".into());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.get("k"))
            })
            .collect();

        let hits = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .count();
        assert_eq!(hits, 1);
        assert_eq!(store.read("k"), None);
    }
}
