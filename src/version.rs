/*!
Generation of unique, lexicographically sortable version strings.

A [VersionGenerator] holds the process-wide `(last_millis, seq)` counter
described by the specification. The default [next_version] uses a single
process-wide generator guarded by a mutex, since this crate runs on a
multi-threaded async runtime rather than the single-threaded cooperative
model the algorithm was originally designed for.
*/

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lazy_static::lazy_static;

/// Generates unique, time-sortable version strings.
///
/// Two calls `a` before `b` on the same generator always satisfy `a < b`
/// under lexicographic order. Uniqueness is only guaranteed within a
/// single generator (and therefore within a single process when the
/// default shared generator is used).
pub struct VersionGenerator {
    state: Mutex<(u64, u32)>,
}

impl Default for VersionGenerator {
    fn default() -> Self {
        VersionGenerator {
            state: Mutex::new((0, 0)),
        }
    }
}

impl VersionGenerator {
    /// Create a fresh generator with no prior calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next version string, using `now_millis` as the
    /// current wall-clock millisecond.
    pub fn next_with_millis(&self, now_millis: u64) -> String {
        let mut state = self.state.lock().unwrap();
        let (last_millis, seq) = *state;
        let seq = if now_millis == last_millis { seq + 1 } else { 0 };
        *state = (now_millis, seq);
        encode_version(now_millis, seq)
    }

    /// Produce the next version string using the real wall clock.
    pub fn next(&self) -> String {
        self.next_with_millis(now_millis())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis() as u64
}

fn encode_version(millis: u64, seq: u32) -> String {
    let bytes = millis.to_be_bytes();
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    let trimmed = &bytes[first_nonzero.min(bytes.len() - 1)..];
    let token = URL_SAFE_NO_PAD.encode(trimmed);
    if seq > 0 {
        format!("{token}.{seq}")
    } else {
        token
    }
}

lazy_static! {
    static ref SHARED: VersionGenerator = VersionGenerator::new();
}

/// Produce the next version string from the process-wide generator.
pub fn next_version() -> String {
    SHARED.next()
}
