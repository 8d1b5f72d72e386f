//! Progress text for downloads and extraction.

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// Whole percent of `current` over `total`, capped at 100.
pub fn percent(current: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (current.saturating_mul(100) / total).min(100)
}

/// "3.0 MB / 12.0 MB (25%)", or just the size when the total is unknown.
pub fn format_transfer(current: u64, total: Option<u64>) -> String {
    match total.filter(|&t| t > 0) {
        Some(t) => format!(
            "{} / {} ({}%)",
            format_size(current),
            format_size(t),
            percent(current, t)
        ),
        None => format_size(current),
    }
}

/// "12/40 entries", or "12 entries" when the total is unknown.
pub fn format_entries(current: u64, total: Option<u64>) -> String {
    match total {
        Some(t) => format!("{current}/{t} entries"),
        None => format!("{current} entries"),
    }
}
