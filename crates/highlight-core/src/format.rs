//! Display helpers for staged files

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with binary prefixes, e.g. `1536 -> "1.5 KB"`.
///
/// Rounded to two decimals with trailing zeros dropped. Anything past
/// gigabytes is still reported in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Default name for the highlighted download: `invoice.pdf -> invoice-highlighted.pdf`
pub fn default_output_filename(original: &str) -> String {
    let stem = strip_pdf_extension(original.trim());
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{}-highlighted.pdf", stem)
}

fn strip_pdf_extension(name: &str) -> &str {
    let split = name.len().saturating_sub(4);
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case(".pdf") => stem,
        _ => name,
    }
}
