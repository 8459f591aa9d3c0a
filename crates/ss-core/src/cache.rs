//! Integrity-verified response cache.
//!
//! Content-addressed key/value store for oracle response payloads. Each
//! record on disk is `HMAC-SHA256(secret, payload) || payload`, where the
//! secret is generated fresh every process start and never persisted. A
//! record from a previous process therefore fails verification and is
//! treated as absent, which bounds trust in cached data to one process
//! lifetime underneath the nominal 24-hour TTL.
//!
//! Every failure mode — missing record, expired record, truncated record,
//! MAC mismatch — degrades to a cache miss; bad records are deleted on the
//! way out. Write failures are swallowed: caching is an optimization, never
//! a correctness dependency.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Nominal record lifetime; the process-lifetime secret is the harder bound.
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Width of the MAC prefix on every record.
const MAC_LEN: usize = 32;

pub struct ResponseCache {
    dir: PathBuf,
    secret: [u8; 32],
    ttl: Duration,
}

impl ResponseCache {
    /// Open a cache rooted at `dir`, generating a fresh process-lifetime
    /// secret. The directory is created if needed; if that fails, reads
    /// miss and writes are dropped, which is the degraded-but-correct mode.
    pub fn open(dir: PathBuf) -> Self {
        Self::open_with_ttl(dir, CACHE_TTL)
    }

    /// As `open`, with an explicit TTL (configurable via `[cache] ttl_hours`).
    pub fn open_with_ttl(dir: PathBuf, ttl: Duration) -> Self {
        let _ = fs::create_dir_all(&dir);
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self { dir, secret, ttl }
    }

    /// Store a payload under the derived key for (query, context).
    pub fn put(&self, query: &str, context: &str, payload: &[u8]) {
        let path = self.record_path(query, context);

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts any key length");
        mac.update(payload);
        let tag = mac.finalize().into_bytes();

        let mut record = Vec::with_capacity(MAC_LEN + payload.len());
        record.extend_from_slice(&tag);
        record.extend_from_slice(payload);

        let _ = write_restricted(&path, &record);
    }

    /// Fetch the payload for (query, context), or `None` if the record is
    /// missing, expired, truncated, or fails MAC verification. Invalid and
    /// expired records are deleted.
    pub fn get(&self, query: &str, context: &str) -> Option<Vec<u8>> {
        let path = self.record_path(query, context);

        let meta = fs::metadata(&path).ok()?;
        let age = meta
            .modified()
            .ok()
            .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
            .unwrap_or(Duration::ZERO);
        if age > self.ttl {
            let _ = fs::remove_file(&path);
            return None;
        }

        let record = fs::read(&path).ok()?;
        if record.len() < MAC_LEN {
            let _ = fs::remove_file(&path);
            return None;
        }
        let (stored_tag, payload) = record.split_at(MAC_LEN);

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts any key length");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if stored_tag.ct_eq(expected.as_slice()).into() {
            Some(payload.to_vec())
        } else {
            let _ = fs::remove_file(&path);
            None
        }
    }

    /// Drop the record for (query, context), if any. Used by callers whose
    /// verified payload fails to deserialize; such a record is worthless
    /// and would otherwise shadow a good write until the TTL.
    pub fn remove(&self, query: &str, context: &str) {
        let _ = fs::remove_file(self.record_path(query, context));
    }

    /// Derived key: SHA-256 over length-prefixed query then context, so a
    /// (query, context) pair can never collide with a different split of
    /// the same concatenation.
    fn record_path(&self, query: &str, context: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update((query.len() as u64).to_le_bytes());
        hasher.update(query.as_bytes());
        hasher.update(context.as_bytes());
        let digest = hasher.finalize();

        let mut name = String::with_capacity(64);
        for byte in digest {
            name.push_str(&format!("{byte:02x}"));
        }
        self.dir.join(name)
    }
}

/// Write a record that is owner-only from the moment it exists; a record
/// must never be observable with wider permissions, even briefly.
#[cfg(unix)]
fn write_restricted(path: &Path, bytes: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_restricted(path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes)
}
