//! Polygon helpers for contour filtering

use gatewatch_types::Point;

/// Enclosed area of a closed polygon (shoelace formula)
pub fn contour_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area as f64).abs() / 2.0
}

/// Perimeter of a polyline, including the closing edge when `closed`
pub fn arc_length(points: &[Point], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut length: f64 = points.windows(2).map(|w| distance(w[0], w[1])).sum();
    if closed {
        length += distance(points[points.len() - 1], points[0]);
    }
    length
}

/// Simplify a closed contour with Douglas-Peucker.
///
/// The contour is split at the point farthest from its first point and each
/// half is simplified on its own, so the result keeps both extremes.
pub fn approximate_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let split = points
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| distance(first, **a).total_cmp(&distance(first, **b)))
        .map(|(i, _)| i)
        .unwrap_or(points.len() - 1);

    let mut result = Vec::new();
    simplify(&points[..=split], epsilon, &mut result);

    let mut tail = points[split..].to_vec();
    tail.push(first);
    simplify(&tail, epsilon, &mut result);

    result.dedup();
    if result.len() > 1 && result.first() == result.last() {
        result.pop();
    }
    result
}

/// Push the kept points of an open polyline, excluding its last point
fn simplify(points: &[Point], epsilon: f64, out: &mut Vec<Point>) {
    if points.len() < 3 {
        if let Some(first) = points.first() {
            out.push(*first);
        }
        return;
    }

    let start = points[0];
    let end = points[points.len() - 1];
    let (index, max_distance) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, perpendicular_distance(*p, start, end)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_distance > epsilon {
        simplify(&points[..=index], epsilon, out);
        simplify(&points[index..], epsilon, out);
    } else {
        out.push(start);
    }
}

fn distance(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let length = distance(a, b);
    if length == 0.0 {
        return distance(p, a);
    }
    let cross = (b.x - a.x) as f64 * (a.y - p.y) as f64 - (a.x - p.x) as f64 * (b.y - a.y) as f64;
    cross.abs() / length
}
