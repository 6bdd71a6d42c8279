//! Small helpers for the output folder and for log formatting.

use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes on a character boundary,
/// with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Create the output folder if it does not exist yet.
///
/// Failure is logged and returned but callers are expected to carry on:
/// the problem resurfaces as an I/O error at the first store access.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn prepare_output_folder(path: &Path) -> io::Result<()> {
    match fs::create_dir_all(path).await {
        Ok(()) => {
            info!("Output folder ready");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            error!(error = %e, "Permission denied: cannot create output folder");
            Err(e)
        }
        Err(e) => {
            error!(error = %e, "Failed to create output folder");
            Err(e)
        }
    }
}
