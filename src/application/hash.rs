//! Content hashing for download verification

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::application::{ApplicationError, ApplicationResult};

/// Compute the SHA-256 of a file's content as lowercase hex.
pub fn file_hash(path: &Path) -> ApplicationResult<String> {
    let mut file = std::fs::File::open(path).map_err(|e| ApplicationError::OperationFailed {
        context: format!("open for hashing: {}", path.display()),
        source: Box::new(e),
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("read for hashing: {}", path.display()),
                source: Box::new(e),
            })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
