use std::time::Duration;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::Glyphs;

/// Cut `raw` to at most `max` display columns, ending in `...` when shortened.
pub(crate) fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let trimmed = raw.trim();
    if trimmed.width() <= max {
        return trimmed.to_string();
    }

    let budget = max - 3;
    let mut used = 0;
    let mut head = String::new();
    for c in trimmed.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        head.push(c);
    }
    format!("{head}...")
}

/// `30s`, `2m`, `1m30s`, `250ms`.
pub(crate) fn format_interval(interval: Duration) -> String {
    let ms = interval.as_millis();
    if ms < 1000 {
        return format!("{ms}ms");
    }
    let secs = interval.as_secs();
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m{s}s"),
    }
}

/// Fixed-width occupancy bar. Values above 1.0 render full.
pub(crate) fn occupancy_bar(fraction: f64, width: usize, glyphs: &Glyphs) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!(
        "{}{}",
        glyphs.bar_full.repeat(filled),
        glyphs.bar_empty.repeat(width - filled)
    )
}

pub(crate) fn format_percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}
