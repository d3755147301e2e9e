//! Feature geometry and the set operations used by layer overlay

use geo::{Area, BooleanOps, Intersects, MultiPolygon, Point, Polygon, Rect};

/// Geometry of a single feature
///
/// Polygons are always held as multi-polygons so overlay results, which
/// may split into several parts, keep the same shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    Polygon(MultiPolygon<f64>),
}

impl Geometry {
    /// Axis-aligned box polygon
    pub fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let rect = Rect::new((min_x, min_y), (max_x, max_y));
        Geometry::Polygon(MultiPolygon::new(vec![rect.to_polygon()]))
    }

    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    /// Planar area in CRS units (zero for points)
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Point(_) => 0.0,
            Geometry::Polygon(mp) => mp.unsigned_area(),
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point(_))
    }

    /// Shared part of two geometries, `None` when they do not overlap
    ///
    /// Polygon pieces of zero area (shared edges or corners) are dropped.
    pub fn intersection(&self, other: &Geometry) -> Option<Geometry> {
        match (self, other) {
            (Geometry::Polygon(a), Geometry::Polygon(b)) => {
                non_empty(a.intersection(b)).map(Geometry::Polygon)
            }
            (Geometry::Point(p), Geometry::Polygon(mp))
            | (Geometry::Polygon(mp), Geometry::Point(p)) => {
                covers_point(mp, p).then(|| Geometry::Point(*p))
            }
            (Geometry::Point(a), Geometry::Point(b)) => (a == b).then(|| Geometry::Point(*a)),
        }
    }

    /// Part of `self` not covered by `other`, `None` when nothing remains
    pub fn difference(&self, other: &Geometry) -> Option<Geometry> {
        match (self, other) {
            (Geometry::Polygon(a), Geometry::Polygon(b)) => {
                non_empty(a.difference(b)).map(Geometry::Polygon)
            }
            (Geometry::Polygon(_), Geometry::Point(_)) => Some(self.clone()),
            (Geometry::Point(p), Geometry::Polygon(mp)) => {
                (!covers_point(mp, p)).then(|| self.clone())
            }
            (Geometry::Point(a), Geometry::Point(b)) => (a != b).then(|| self.clone()),
        }
    }

    /// Subtract every geometry in `others` in turn
    pub fn difference_all<'a, I>(&self, others: I) -> Option<Geometry>
    where
        I: IntoIterator<Item = &'a Geometry>,
    {
        let mut remaining = self.clone();
        for other in others {
            remaining = remaining.difference(other)?;
        }
        Some(remaining)
    }
}

impl From<Polygon<f64>> for Geometry {
    fn from(polygon: Polygon<f64>) -> Self {
        Geometry::Polygon(MultiPolygon::new(vec![polygon]))
    }
}

impl From<MultiPolygon<f64>> for Geometry {
    fn from(mp: MultiPolygon<f64>) -> Self {
        Geometry::Polygon(mp)
    }
}

impl From<Point<f64>> for Geometry {
    fn from(point: Point<f64>) -> Self {
        Geometry::Point(point)
    }
}

fn non_empty(mp: MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    let parts: Vec<Polygon<f64>> = mp
        .into_iter()
        .filter(|polygon| polygon.unsigned_area() > 0.0)
        .collect();
    (!parts.is_empty()).then(|| MultiPolygon::new(parts))
}

/// Point inside or on the boundary of any part
fn covers_point(mp: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    mp.0.iter().any(|polygon| polygon.intersects(&point.0))
}
