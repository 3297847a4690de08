use std::f64::consts::TAU;

use crate::braille::BrailleCanvas;
use crate::map::highlight::{Callout, Ellipse};
use crate::map::path::{PathCommand, PathDescription};
use crate::map::viewport::PixelPoint;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
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

/// Clip a segment to `[0, max_x] x [0, max_y]` (Liang-Barsky).
/// `None` when no part of it is on the canvas.
fn clip_segment(a: PixelPoint, b: PixelPoint, max_x: f64, max_y: f64) -> Option<(PixelPoint, PixelPoint)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [(-dx, a.x), (dx, max_x - a.x), (-dy, a.y), (dy, max_y - a.y)] {
        if p == 0.0 {
            // Parallel to this edge and outside it
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        PixelPoint::new(a.x + t0 * dx, a.y + t0 * dy),
        PixelPoint::new(a.x + t1 * dx, a.y + t1 * dy),
    ))
}

/// Draw a pixel-space segment, clipped to the canvas so Bresenham only walks visible dots
pub fn draw_segment(canvas: &mut BrailleCanvas, a: PixelPoint, b: PixelPoint) {
    let (w, h) = canvas.pixel_size();
    if w == 0 || h == 0 {
        return;
    }
    if !a.x.is_finite() || !a.y.is_finite() || !b.x.is_finite() || !b.y.is_finite() {
        return;
    }
    let Some((a, b)) = clip_segment(a, b, (w - 1) as f64, (h - 1) as f64) else {
        return;
    };
    draw_line(
        canvas,
        a.x.round() as i32,
        a.y.round() as i32,
        b.x.round() as i32,
        b.y.round() as i32,
    );
}

/// Stroke a path. `Close` joins back to the most recent move, as in SVG.
pub fn stroke_path(canvas: &mut BrailleCanvas, path: &PathDescription) {
    let mut start: Option<PixelPoint> = None;
    let mut current: Option<PixelPoint> = None;

    for cmd in path.commands() {
        match *cmd {
            PathCommand::MoveTo(p) => {
                start = Some(p);
                current = Some(p);
            }
            PathCommand::LineTo(p) => {
                if let Some(prev) = current {
                    draw_segment(canvas, prev, p);
                }
                current = Some(p);
            }
            PathCommand::Close => {
                if let (Some(s), Some(c)) = (start, current) {
                    draw_segment(canvas, c, s);
                }
                current = start;
            }
        }
    }
}

/// Even-odd scanline fill, sampling dot centers
pub fn fill_path(canvas: &mut BrailleCanvas, path: &PathDescription) {
    let Some((_, min_y, _, max_y)) = path.bounds() else {
        return;
    };
    let (w, h) = canvas.pixel_size();
    if w == 0 || h == 0 {
        return;
    }

    let runs = path.subpaths();
    let first_row = min_y.floor().max(0.0) as usize;
    let last_row = max_y.ceil().min(h as f64 - 1.0);
    if last_row < 0.0 {
        return;
    }
    let mut crossings: Vec<f64> = Vec::new();

    for row in first_row..=last_row as usize {
        let sy = row as f64 + 0.5;
        crossings.clear();

        for run in runs.iter().filter(|r| r.len() >= 3) {
            let mut j = run.len() - 1;
            for i in 0..run.len() {
                let (a, b) = (run[i], run[j]);
                if (a.y > sy) != (b.y > sy) {
                    crossings.push(a.x + (sy - a.y) * (b.x - a.x) / (b.y - a.y));
                }
                j = i;
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let x0 = (span[0] - 0.5).ceil().max(0.0);
            let x1 = (span[1] - 0.5).floor().min(w as f64 - 1.0);
            if x1 < x0 {
                continue;
            }
            for x in x0 as usize..=x1 as usize {
                canvas.set_pixel(x, row);
            }
        }
    }
}

/// Ellipse outline as a closed polyline
pub fn draw_ellipse(canvas: &mut BrailleCanvas, ellipse: &Ellipse) {
    let radius = ellipse.rx.max(ellipse.ry);
    if !(radius > 0.0) {
        return;
    }
    let steps = ((TAU * radius / 2.0).ceil() as usize).clamp(16, 720);
    let at = |i: usize| {
        let t = TAU * i as f64 / steps as f64;
        PixelPoint::new(ellipse.cx + ellipse.rx * t.cos(), ellipse.cy + ellipse.ry * t.sin())
    };

    let mut prev = at(0);
    for i in 1..=steps {
        let next = at(i);
        draw_segment(canvas, prev, next);
        prev = next;
    }
}

/// Arrow shaft plus a closed arrowhead
pub fn draw_callout(canvas: &mut BrailleCanvas, callout: &Callout) {
    let [left, right] = callout.barbs;
    draw_segment(canvas, callout.tail, callout.tip);
    draw_segment(canvas, callout.tip, left);
    draw_segment(canvas, left, right);
    draw_segment(canvas, right, callout.tip);
}
