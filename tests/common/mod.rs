#![allow(dead_code)]

use lanetrack::BinaryMask;

pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 720;

/// Vertical lane lines, three pixels thick, centred on each column of `xs`.
pub fn vertical_lines(xs: &[u32]) -> BinaryMask {
    BinaryMask::from_fn(WIDTH, HEIGHT, |x, _| {
        xs.iter().any(|&c| (x as i64 - c as i64).abs() <= 1)
    })
    .unwrap()
}

/// Curves `x = f(y) + offset` for every offset, three pixels thick.
pub fn curved_lines<F>(f: F, offsets: &[f64]) -> BinaryMask
where
    F: Fn(f64) -> f64,
{
    BinaryMask::from_fn(WIDTH, HEIGHT, |x, y| {
        let base = f(y as f64);
        offsets
            .iter()
            .any(|off| (x as f64 - (base + off).round()).abs() <= 1.0)
    })
    .unwrap()
}

pub fn blank() -> BinaryMask {
    BinaryMask::from_fn(WIDTH, HEIGHT, |_, _| false).unwrap()
}
