//! Small helpers shared by the helpdesk crates.

/// Unicode stars for a rating string, capped so oversized values stay readable.
///
/// Ratings are not range-checked when recorded, so anything that does not
/// parse as a whole number renders as zero stars.
#[must_use]
pub fn star_bar(rating: &str, cap: usize) -> String {
    let count = rating.trim().parse::<usize>().unwrap_or(0).min(cap);
    "⭐".repeat(count)
}
