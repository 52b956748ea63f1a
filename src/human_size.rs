//! Human-readable file size formatting
//!
//! Provides consistent size display formatting for hydrated gallery entries.

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Format a byte count as a human-readable size.
///
/// Exact byte counts below 1 KB, one decimal place above.
///
/// # Examples
///
/// ```
/// use gallery_entries::human_size::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(2048), "2.0 KB");
/// assert_eq!(format_size(1_572_864), "1.5 MB");
/// assert_eq!(format_size(3_221_225_472), "3.0 GB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}
