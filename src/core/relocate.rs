//! Integrity-checked file relocation
//!
//! The single correctness-critical invariant of the whole tool lives here:
//! a source file is deleted only after a byte-for-byte SHA-256 match was
//! observed between source and destination. On mismatch the corrupt
//! destination copy is removed and the source stays untouched.

use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Buffer size for streaming hash computation (64KB)
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// SHA256 hash represented as a fixed-size array
pub type Sha256Hash = [u8; 32];

/// Failure modes of a single relocation
#[derive(Error, Debug)]
pub enum RelocateError {
    /// Source and destination hashes differed after the copy
    #[error("SHA-256 mismatch after copy (src={src_prefix} dst={dst_prefix})")]
    HashMismatch {
        src_prefix: String,
        dst_prefix: String,
    },

    /// I/O failure during copy, hash, or delete
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compute the SHA-256 hash of a file by streaming it in fixed-size chunks.
pub fn hash_file(path: &Path) -> std::io::Result<Sha256Hash> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize().into())
}

/// Format the first `len` hex characters of a hash for log output.
pub fn hash_prefix(hash: &Sha256Hash, len: usize) -> String {
    hash.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
        .chars()
        .take(len)
        .collect()
}

/// Copy `src` to `dst`, verify the copy, then delete the source.
///
/// The source modification time is carried over to the destination. Both
/// files are hashed independently; only a match releases the source for
/// deletion. On mismatch or error the destination is removed best-effort
/// and the source is left untouched.
pub fn verified_move(src: &Path, dst: &Path) -> Result<(), RelocateError> {
    let src_hash = hash_file(src)?;

    if let Err(e) = copy_with_mtime(src, dst) {
        remove_bad_copy(dst);
        return Err(e.into());
    }

    finish_verified(src, dst, &src_hash)
}

/// Copy `src` to `dst`, carrying the source modification time over.
fn copy_with_mtime(src: &Path, dst: &Path) -> std::io::Result<()> {
    let src_modified = fs::metadata(src)?.modified().ok();

    fs::copy(src, dst)?;

    if let Some(mtime) = src_modified {
        // Content integrity gates deletion; a lost mtime is only logged
        match File::options().write(true).open(dst) {
            Ok(file) => {
                if let Err(e) = file.set_modified(mtime) {
                    warn!("Could not preserve mtime on {}: {}", dst.display(), e);
                }
            }
            Err(e) => warn!("Could not reopen {} to set mtime: {}", dst.display(), e),
        }
    }

    Ok(())
}

/// Compare `dst` against the source hash and settle the move: a match
/// releases the source for deletion, anything else removes the copy and
/// keeps the source.
fn finish_verified(src: &Path, dst: &Path, src_hash: &Sha256Hash) -> Result<(), RelocateError> {
    let verdict = match hash_file(dst) {
        Ok(dst_hash) if dst_hash == *src_hash => Ok(()),
        Ok(dst_hash) => Err(RelocateError::HashMismatch {
            src_prefix: hash_prefix(src_hash, 12),
            dst_prefix: hash_prefix(&dst_hash, 12),
        }),
        Err(e) => Err(e.into()),
    };

    match verdict {
        Ok(()) => {
            fs::remove_file(src)?;
            debug!("Moved {} -> {}", src.display(), dst.display());
            Ok(())
        }
        Err(e) => {
            remove_bad_copy(dst);
            Err(e)
        }
    }
}

/// Never leave a partial or corrupt copy behind.
fn remove_bad_copy(dst: &Path) {
    if dst.exists() {
        if let Err(cleanup) = fs::remove_file(dst) {
            warn!("Failed to remove bad copy {}: {}", dst.display(), cleanup);
        }
    }
}
