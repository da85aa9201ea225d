/// Maps an out-of-range coordinate with reflect-101 (`dcb|abcd|cba`).
pub fn reflect_101(pos: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let last = len as isize - 1;
    let period = 2 * last;
    let p = pos.rem_euclid(period);
    if p > last {
        (period - p) as usize
    } else {
        p as usize
    }
}

/// Clamps an out-of-range coordinate to the nearest edge pixel.
pub fn replicate(pos: isize, len: usize) -> usize {
    pos.clamp(0, len as isize - 1) as usize
}
