/// Estimate how many poster lines a label occupies at the given wrap
/// width.
///
/// Pure character arithmetic: trim, count scalar values, divide
/// rounding up. A blank or whitespace-only label still costs one line;
/// the slot stays visible on the poster. Font metrics are deliberately
/// out of scope, so `chars_per_line` has to be tuned against the line
/// length the themes actually produce.
///
/// # Panics
///
/// Panics if `chars_per_line` is zero. `LayoutOptions::validate`
/// rejects that before any layout runs.
pub fn estimate_lines(text: &str, chars_per_line: u32) -> u32 {
    debug_assert!(chars_per_line > 0, "chars_per_line must be nonzero");

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 1;
    }

    let count = trimmed.chars().count() as u32;
    count.div_ceil(chars_per_line)
}
