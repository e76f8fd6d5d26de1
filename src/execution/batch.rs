use std::mem;

use crate::types::{CommitGroup, Record};

/// Buffers records and cuts them into [`CommitGroup`]s of at most `capacity` records.
#[derive(Debug)]
pub struct BatchAccumulator {
    buf: Vec<Record>,
    capacity: usize,
}

impl BatchAccumulator {
    /// Create an accumulator yielding groups of `capacity` records.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be > 0");
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Records currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a record. Returns a full group once the buffer reaches capacity.
    pub fn add(&mut self, record: Record) -> Option<CommitGroup> {
        self.buf.push(record);
        if self.buf.len() >= self.capacity {
            Some(self.take())
        } else {
            None
        }
    }

    /// Yield the remaining records as a final partial group, if any.
    pub fn flush(&mut self) -> Option<CommitGroup> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    fn take(&mut self) -> CommitGroup {
        let records = mem::replace(&mut self.buf, Vec::with_capacity(self.capacity));
        CommitGroup::new(records)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::BatchAccumulator;
    use crate::store::MAX_BATCH_SIZE;
    use crate::types::{CommitGroup, Record};

    fn record(i: usize) -> Record {
        let mut fields = Map::new();
        fields.insert("i".to_string(), Value::from(i as u64));
        Record::new(fields)
    }

    fn groups_for(n: usize, capacity: usize) -> Vec<CommitGroup> {
        let mut acc = BatchAccumulator::new(capacity);
        let mut out = Vec::new();
        for i in 0..n {
            out.extend(acc.add(record(i)));
        }
        out.extend(acc.flush());
        out
    }

    #[test]
    fn group_sizes_follow_ceiling_division() {
        for n in [0, 1, 499, 500, 501, 1000, 1234] {
            let groups = groups_for(n, MAX_BATCH_SIZE);
            assert_eq!(groups.len(), n.div_ceil(MAX_BATCH_SIZE), "n={n}");

            let sizes: Vec<usize> = groups.iter().map(CommitGroup::len).collect();
            if let Some((last, full)) = sizes.split_last() {
                assert!(full.iter().all(|&s| s == MAX_BATCH_SIZE), "n={n}");
                let expected_last = match n % MAX_BATCH_SIZE {
                    0 => MAX_BATCH_SIZE,
                    r => r,
                };
                assert_eq!(*last, expected_last, "n={n}");
            }
            assert_eq!(sizes.iter().sum::<usize>(), n);
        }
    }

    #[test]
    fn add_yields_exactly_at_capacity_and_resets() {
        let mut acc = BatchAccumulator::new(2);
        assert!(acc.add(record(0)).is_none());
        assert_eq!(acc.len(), 1);

        let group = acc.add(record(1)).unwrap();
        assert_eq!(group.len(), 2);
        assert!(acc.is_empty());
        assert!(acc.flush().is_none());
    }

    #[test]
    fn groups_preserve_record_order() {
        let groups = groups_for(5, 2);
        let order: Vec<u64> = groups
            .into_iter()
            .flat_map(CommitGroup::into_records)
            .map(|r| r.get("i").and_then(Value::as_u64).unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "batch capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = BatchAccumulator::new(0);
    }
}
