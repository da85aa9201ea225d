use crate::motion::domain::contour::Contour;
use crate::shared::frame::{Frame, PixelFormat};

/// Draws each contour as a closed polyline.
///
/// `color` is given in BGR order and mapped onto the frame's own layout.
/// Lines are stamped with a disc whose diameter is `thickness`.
pub fn draw_contours(frame: &mut Frame, contours: &[Contour], color: [u8; 3], thickness: u32) {
    let pixel = pixel_value(frame.format(), color);
    let radius = (thickness.max(1) / 2) as i32;

    for contour in contours {
        let points = &contour.points;
        match points.len() {
            0 => {}
            1 => stamp(frame, points[0], radius, &pixel),
            n => {
                for i in 0..n {
                    draw_line(frame, points[i], points[(i + 1) % n], radius, &pixel);
                }
            }
        }
    }
}

fn pixel_value(format: PixelFormat, bgr: [u8; 3]) -> Vec<u8> {
    match format {
        PixelFormat::Bgr => bgr.to_vec(),
        PixelFormat::Rgb => vec![bgr[2], bgr[1], bgr[0]],
        PixelFormat::Gray => {
            let y = 0.114 * bgr[0] as f32 + 0.587 * bgr[1] as f32 + 0.299 * bgr[2] as f32;
            vec![y.round().clamp(0.0, 255.0) as u8]
        }
    }
}

/// Bresenham line from `a` to `b`, inclusive.
fn draw_line(frame: &mut Frame, a: (i32, i32), b: (i32, i32), radius: i32, pixel: &[u8]) {
    let (mut x, mut y) = a;
    let dx = (b.0 - a.0).abs();
    let dy = -(b.1 - a.1).abs();
    let sx = if a.0 < b.0 { 1 } else { -1 };
    let sy = if a.1 < b.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(frame, (x, y), radius, pixel);
        if (x, y) == b {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn stamp(frame: &mut Frame, center: (i32, i32), radius: i32, pixel: &[u8]) {
    let width = frame.width() as i32;
    let height = frame.height() as i32;
    let channels = frame.channels();
    let data = frame.data_mut();

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (center.0 + dx, center.1 + dy);
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let offset = (y as usize * width as usize + x as usize) * channels;
            data[offset..offset + channels].copy_from_slice(pixel);
        }
    }
}
