//! Conversion of ratio-space Textract geometry into pixel-space polygons.
//!
//! Textract reports every coordinate as a fraction of the image width or
//! height. PAGE-XML wants absolute integer pixels, so each ratio point
//! `(rx, ry)` becomes `(round(rx * W), round(ry * H))`.
//!
//! Rounding is half-away-from-zero ([`f64::round`]): `0.5 -> 1`,
//! `2.5 -> 3`. Results are clamped into `[0, W] x [0, H]` so that OCR noise
//! slightly outside `[0, 1]` never produces coordinates beyond the page.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Target image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageSize {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl PageSize {
    /// Create a new page size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both extents are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned box in ratio space, as found under `Geometry.BoundingBox`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatioBox {
    /// Left edge, fraction of the image width
    pub left: f64,
    /// Top edge, fraction of the image height
    pub top: f64,
    /// Width, fraction of the image width
    pub width: f64,
    /// Height, fraction of the image height
    pub height: f64,
}

impl RatioBox {
    /// Create a new ratio box.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Point in ratio space, as found under `Geometry.Polygon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatioPoint {
    /// Horizontal position, fraction of the image width
    pub x: f64,
    /// Vertical position, fraction of the image height
    pub y: f64,
}

impl RatioPoint {
    /// Create a new ratio point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Geometry of a single Textract block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RatioGeometry {
    /// Bounding box, if reported
    #[serde(default)]
    pub bounding_box: Option<RatioBox>,

    /// Polygon outline, if reported
    #[serde(default)]
    pub polygon: Vec<RatioPoint>,
}

impl RatioGeometry {
    /// Geometry consisting of a bounding box only.
    pub fn from_box(bbox: RatioBox) -> Self {
        Self {
            bounding_box: Some(bbox),
            polygon: Vec::new(),
        }
    }

    /// Geometry consisting of a polygon only.
    pub fn from_polygon(points: Vec<RatioPoint>) -> Self {
        Self {
            bounding_box: None,
            polygon: points,
        }
    }

    /// Neither a polygon nor a bounding box is present.
    pub fn is_empty(&self) -> bool {
        self.bounding_box.is_none() && self.polygon.is_empty()
    }
}

/// Why a geometry cannot become a polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum Degeneracy {
    /// Neither polygon nor bounding box
    Missing,
    /// Polygon with fewer than three points
    TooFewPoints(usize),
    /// Polygon enclosing no area
    ZeroArea,
    /// Bounding box with a zero or negative extent
    EmptyBox {
        /// Reported width
        width: f64,
        /// Reported height
        height: f64,
    },
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degeneracy::Missing => write!(f, "no polygon or bounding box"),
            Degeneracy::TooFewPoints(n) => write!(f, "polygon has {} point(s), need 3", n),
            Degeneracy::ZeroArea => write!(f, "polygon encloses no area"),
            Degeneracy::EmptyBox { width, height } => {
                write!(f, "bounding box has extent {}x{}", width, height)
            }
        }
    }
}

/// Integer point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal pixel offset
    pub x: u32,
    /// Vertical pixel offset
    pub y: u32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Pixel-space polygon, closed implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a polygon from points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle, corners in top-left, top-right,
    /// bottom-right, bottom-left order.
    pub fn rectangle(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self::new(vec![
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ])
    }

    /// The polygon's points.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the polygon has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Minimum and maximum corners of the polygon.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Rectangle enclosing all given polygons.
    pub fn hull<'a>(polygons: impl IntoIterator<Item = &'a Polygon>) -> Option<Polygon> {
        let mut acc: Option<(Point, Point)> = None;
        for (lo, hi) in polygons.into_iter().filter_map(Polygon::bounds) {
            acc = Some(match acc {
                None => (lo, hi),
                Some((min, max)) => (
                    Point::new(min.x.min(lo.x), min.y.min(lo.y)),
                    Point::new(max.x.max(hi.x), max.y.max(hi.y)),
                ),
            });
        }
        acc.map(|(min, max)| Polygon::rectangle(min.x, min.y, max.x, max.y))
    }

    /// PAGE-XML `points` attribute value: `x1,y1 x2,y2 ...`.
    pub fn to_points_string(&self) -> String {
        self.points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_points_string())
    }
}

/// Scale a single ratio onto `[0, extent]`.
fn scale(ratio: f64, extent: u32) -> u32 {
    let extent = f64::from(extent);
    // NaN saturates to 0 in the cast
    (ratio * extent).round().clamp(0.0, extent) as u32
}

/// Twice the signed area of a ratio polygon (shoelace formula).
fn doubled_area(points: &[RatioPoint]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Check a ratio geometry without transforming it.
pub fn check(geometry: &RatioGeometry) -> std::result::Result<(), Degeneracy> {
    if !geometry.polygon.is_empty() {
        if geometry.polygon.len() < 3 {
            return Err(Degeneracy::TooFewPoints(geometry.polygon.len()));
        }
        if doubled_area(&geometry.polygon).abs() <= f64::EPSILON {
            return Err(Degeneracy::ZeroArea);
        }
        return Ok(());
    }

    match geometry.bounding_box {
        Some(bbox) if bbox.width > 0.0 && bbox.height > 0.0 => Ok(()),
        Some(bbox) => Err(Degeneracy::EmptyBox {
            width: bbox.width,
            height: bbox.height,
        }),
        None => Err(Degeneracy::Missing),
    }
}

/// Transform the geometry of block `id` into a pixel polygon.
///
/// The polygon is used when present; otherwise the bounding box is
/// expanded to its four corners.
pub fn to_pixels(id: &str, geometry: &RatioGeometry, size: PageSize) -> Result<Polygon> {
    check(geometry).map_err(|reason| Error::DegenerateGeometry {
        id: id.to_string(),
        reason: reason.to_string(),
    })?;

    if !geometry.polygon.is_empty() {
        let points = geometry
            .polygon
            .iter()
            .map(|p| Point::new(scale(p.x, size.width), scale(p.y, size.height)))
            .collect();
        return Ok(Polygon::new(points));
    }

    // check() guarantees a box here
    let bbox = geometry
        .bounding_box
        .ok_or_else(|| Error::DegenerateGeometry {
            id: id.to_string(),
            reason: Degeneracy::Missing.to_string(),
        })?;
    Ok(Polygon::rectangle(
        scale(bbox.left, size.width),
        scale(bbox.top, size.height),
        scale(bbox.left + bbox.width, size.width),
        scale(bbox.top + bbox.height, size.height),
    ))
}
