//! Table formatting utilities for CLI output.

use meshgen_core::AssetRecord;

/// Truncates a string to a maximum length, adding "..." if needed.
///
/// # Examples
///
/// ```rust
/// use meshgen_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Human-readable byte count.
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Print assets as `#  created  size  name  path`.
pub fn print_asset_table(records: &[AssetRecord]) {
    println!(
        "{:<4} {:<19} {:>10}  {:<28} {}",
        "#", "Created", "Size", "Name", "Path"
    );
    print_separator(100);
    for (index, record) in records.iter().enumerate() {
        println!(
            "{:<4} {:<19} {:>10}  {:<28} {}",
            index + 1,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            format_bytes(record.size_bytes),
            truncate_string(&record.file_name(), 28),
            record.path.display()
        );
    }
}
