//! Enumeration table attached to a signal by a `VAL_` record.

use serde::{Deserialize, Serialize};

/// Sorted `(code, label)` pairs of a signal. Codes are unique; lookups bisect the array.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    entries: Vec<(i64, String)>,
}

impl ValueTable {
    /// Inserts `code` keeping the table sorted.
    ///
    /// Returns the label previously stored for `code`, which is replaced.
    pub fn insert(&mut self, code: i64, label: impl Into<String>) -> Option<String> {
        let label: String = label.into();
        match self.position(code) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i].1, label)),
            Err(i) => {
                self.entries.insert(i, (code, label));
                None
            }
        }
    }

    /// Label for `code`, or `None` when the code was never inserted.
    pub fn lookup(&self, code: i64) -> Option<&str> {
        self.position(code).ok().map(|i| self.entries[i].1.as_str())
    }

    /// Reverse lookup used when encoding by label. Linear; tables are short.
    pub fn code_of(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, l)| l == label)
            .map(|(code, _)| *code)
    }

    /// Entries in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.entries.iter().map(|(code, label)| (*code, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Midpoint bisection over the sorted codes.
    // Ok(i): code found at i. Err(i): insertion point.
    fn position(&self, code: i64) -> Result<usize, usize> {
        let mut lo: usize = 0;
        let mut hi: usize = self.entries.len();
        while lo < hi {
            let mid: usize = lo + (hi - lo) / 2;
            let mid_code: i64 = self.entries[mid].0;
            if mid_code == code {
                return Ok(mid);
            }
            if mid_code < code {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Err(lo)
    }
}
