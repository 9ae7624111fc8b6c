//! Split the listing's level text into study level and credit points.

use tracing::warn;

/// `"Undergraduate Level 1, 12.5 credit points"` → `("Undergraduate Level 1", 12.5)`.
///
/// Text without a parseable points suffix is returned unchanged with zero points.
pub fn split_level_points(raw: &str) -> (String, f64) {
    let stripped = raw.replace("credit points", "");
    let stripped = stripped.trim();

    if let Some((level, points)) = stripped.rsplit_once(", ") {
        if let Ok(points) = points.trim().parse::<f64>() {
            return (level.trim().to_string(), points);
        }
    }

    warn!("unrecognised level format: {raw:?}");
    (raw.trim().to_string(), 0.0)
}
