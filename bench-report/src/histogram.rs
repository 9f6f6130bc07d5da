//! ASCII rendering of the response-time histogram

use crate::types::Bucket;

/// Bar length of the fullest bucket
pub const BAR_WIDTH: usize = 40;

/// Character used to draw bars
pub const BAR_CHAR: char = '■';

/// Render buckets with the default bar width and character
pub fn render(buckets: &[Bucket]) -> String {
    render_with(buckets, BAR_WIDTH, BAR_CHAR)
}

/// Render one line per bucket: `  <mark> [<count>]\t|<bar>`
///
/// Bars are scaled so the largest count gets exactly `width` characters.
/// Buckets are printed in the order given; callers sort them by mark.
pub fn render_with(buckets: &[Bucket], width: usize, bar_char: char) -> String {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let bar_unit = bar_char.to_string();

    let mut out = String::new();
    for bucket in buckets {
        let len = bar_len(bucket.count, max, width);
        out.push_str(&format!(
            "  {:4.3} [{}]\t|{}\n",
            bucket.mark,
            bucket.count,
            bar_unit.repeat(len)
        ));
    }
    out
}

/// Normalized bar length, rounding half up: `(count * width + max / 2) / max`
///
/// Returns 0 for every bucket when `max` is 0.
pub fn bar_len(count: u64, max: u64, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    let scaled = (count as u128 * width as u128 + max as u128 / 2) / max as u128;
    scaled as usize
}
