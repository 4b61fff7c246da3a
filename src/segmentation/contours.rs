use super::types::Mask;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point;

/// Outer boundaries of the connected regions in `mask`
///
/// Holes and anything nested inside a hole are dropped. Each boundary is
/// reduced to the end points of its straight runs.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .map(|mut contour| {
            contour.points = compress_chain(&contour.points);
            contour
        })
        .collect()
}

/// Drop points lying in the middle of a horizontal, vertical or diagonal run
///
/// The chain is treated as closed.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    // a degenerate chain that doubles back on itself keeps its start
    if kept.is_empty() {
        points[..1].to_vec()
    } else {
        kept
    }
}

/// Shift contour points by the ROI origin so they land on the full frame
pub fn translate(contour: &Contour<i32>, dx: i32, dy: i32) -> Vec<Point<i32>> {
    contour
        .points
        .iter()
        .map(|p| Point::new(p.x + dx, p.y + dy))
        .collect()
}
