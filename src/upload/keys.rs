use chrono::Utc;
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use std::sync::Arc;

use super::KEY_PREFIX;

/// Bytes of randomness per key, rendered as twice as many hex chars
pub const ENTROPY_BYTES: usize = 8;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Always reports the same instant
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);
}

pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) {
        rand::thread_rng().fill_bytes(buf);
    }
}

/// Repeats the given bytes
pub struct FixedEntropy(pub Vec<u8>);

impl EntropySource for FixedEntropy {
    fn fill(&self, buf: &mut [u8]) {
        if self.0.is_empty() {
            buf.fill(0);
            return;
        }
        for (slot, byte) in buf.iter_mut().zip(self.0.iter().cycle()) {
            *slot = *byte;
        }
    }
}

/// Whitespace runs become `_`, everything outside `[A-Za-z0-9_.-]` is dropped
pub fn sanitize_name(original: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(original, "_");
    let cleaned: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Builds `uploads/<millis>-<hex>-<name>` keys
#[derive(Clone)]
pub struct KeyGenerator {
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
}

impl KeyGenerator {
    pub fn new(clock: Arc<dyn Clock>, entropy: Arc<dyn EntropySource>) -> Self {
        Self { clock, entropy }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(OsEntropy))
    }

    pub fn generate(&self, original_name: &str) -> String {
        let mut suffix = [0u8; ENTROPY_BYTES];
        self.entropy.fill(&mut suffix);
        format!(
            "{}/{}-{}-{}",
            KEY_PREFIX,
            self.clock.now_millis(),
            hex::encode(suffix),
            sanitize_name(original_name)
        )
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::system()
    }
}
