//! Human-readable size descriptors.

/// Formats a byte count the way `ls -lh` on the build host prints it.
///
/// Sizes below 1024 bytes get a `B` suffix. Larger sizes are scaled by
/// powers of 1024 and printed with one decimal while the scaled value is
/// below 10, rounded to the nearest unit otherwise.
///
/// # Examples
///
/// ```
/// use bundledeps::fs::human_size;
///
/// assert_eq!(human_size(512), "512B");
/// assert_eq!(human_size(12 * 1024), "12K");
/// assert_eq!(human_size(1536), "1.5K");
/// assert_eq!(human_size(2 * 1024 * 1024), "2.0M");
/// ```
#[must_use]
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

    if bytes < 1024 {
        return format!("{bytes}B");
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1023.5 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    if value < 9.95 {
        format!("{value:.1}{}", UNITS[unit])
    } else {
        format!("{value:.0}{}", UNITS[unit])
    }
}
