use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

use crate::shared::constants::OUTPUT_EXTENSION;

/// Timestamp layout embedded in generated names, e.g. `2024-12-16_14h30m15s`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%Hh%Mm%Ss";

/// Builds `{stem}_{method}_p{padding}_{timestamp}.mp4` next to `input`, or in
/// `output_dir` when given, stamped with the current local time.
pub fn generate_output_path(
    input: &Path,
    method: &str,
    padding: f64,
    output_dir: Option<&Path>,
) -> PathBuf {
    output_path_at(input, method, padding, output_dir, &Local::now())
}

/// [`generate_output_path`] with an explicit timestamp.
pub fn output_path_at<Tz: TimeZone>(
    input: &Path,
    method: &str,
    padding: f64,
    output_dir: Option<&Path>,
    now: &DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    // Debug formatting keeps the decimal point on integral values ("1.0")
    let name = format!(
        "{stem}_{method}_p{padding:?}_{}.{OUTPUT_EXTENSION}",
        now.format(TIMESTAMP_FORMAT)
    );

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(name)
}
