use crate::foundation::core::Point;
use crate::layers::store::MaskLayer;

/// Write `value` into every mask pixel whose centre lies within `radius` of the segment `a..b`.
///
/// This is a round-capped line of width `2 * radius`; with `a == b` it is a filled disc. Edges
/// are hard (no anti-aliasing), so only `value` is ever written. Returns `true` if any pixel was
/// inside the mask.
pub fn paint_capsule(mask: &mut MaskLayer, a: Point, b: Point, radius: f64, value: u8) -> bool {
    if !(a.is_finite() && b.is_finite() && radius.is_finite()) || radius <= 0.0 {
        return false;
    }
    let (w, h) = (mask.width(), mask.height());
    let x0 = (a.x.min(b.x) - radius).floor().max(0.0);
    let y0 = (a.y.min(b.y) - radius).floor().max(0.0);
    let x1 = (a.x.max(b.x) + radius).ceil().min(f64::from(w));
    let y1 = (a.y.max(b.y) + radius).ceil().min(f64::from(h));
    if x0 >= x1 || y0 >= y1 {
        return false;
    }
    let (x0, y0, x1, y1) = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);

    let ab = b - a;
    let len2 = ab.hypot2();
    let r2 = radius * radius;
    let mut touched = false;
    for y in y0..y1 {
        let row = mask.row_mut(y);
        let cy = f64::from(y) + 0.5;
        for x in x0..x1 {
            let p = Point::new(f64::from(x) + 0.5, cy);
            let t = if len2 > 0.0 {
                ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            if (p - (a + ab * t)).hypot2() <= r2 {
                row[x as usize] = value;
                touched = true;
            }
        }
    }
    touched
}

/// Filled disc of the given diameter.
pub fn fill_circle(mask: &mut MaskLayer, center: Point, diameter: f64, value: u8) -> bool {
    paint_capsule(mask, center, center, diameter / 2.0, value)
}

/// Round-capped, round-joined line of the given width.
pub fn stroke_segment(mask: &mut MaskLayer, from: Point, to: Point, width: f64, value: u8) -> bool {
    paint_capsule(mask, from, to, width / 2.0, value)
}

#[cfg(test)]
#[path = "../../tests/unit/draw/raster.rs"]
mod tests;
