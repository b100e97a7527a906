//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `original` within a square of `max_length` on its longer edge.
///
/// Aspect ratio is preserved and images are never upscaled: an image whose
/// longer edge is already within bounds keeps its dimensions. Neither edge
/// rounds down to zero.
///
/// # Examples
/// ```
/// # use mummy::imaging::calculate_scaled_dimensions;
/// // 1600x1200 landscape limited to 800 → 800x600
/// assert_eq!(calculate_scaled_dimensions((1600, 1200), 800), (800, 600));
///
/// // Already small enough → unchanged
/// assert_eq!(calculate_scaled_dimensions((640, 480), 800), (640, 480));
/// ```
pub fn calculate_scaled_dimensions(original: (u32, u32), max_length: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    if longer_edge <= max_length || longer_edge == 0 {
        return original;
    }

    let ratio = max_length as f64 / longer_edge as f64;
    if orig_w >= orig_h {
        // Landscape or square
        let h = ((orig_h as f64 * ratio).round() as u32).max(1);
        (max_length, h)
    } else {
        // Portrait
        let w = ((orig_w as f64 * ratio).round() as u32).max(1);
        (w, max_length)
    }
}
