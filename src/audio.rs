//! Content sniffing for uploaded payloads.

use std::path::Path;
use tracing::debug;

/// Returns true if the buffer starts with a known audio container signature.
///
/// The declared content type of an upload is never consulted.
pub fn is_audio(bytes: &[u8]) -> bool {
    infer::is_audio(bytes)
}

/// Sniff a staged file. Unreadable files are not audio.
pub fn is_audio_file(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => is_audio(&bytes),
        Err(e) => {
            debug!("Could not read {} for sniffing: {}", path.display(), e);
            false
        }
    }
}
