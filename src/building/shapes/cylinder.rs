use super::{lattice_bounds, normalized, Shape};
use crate::bounding_box::BoundingBox;
use crate::error::{Result, SchematicError};

/// A solid cylinder from `base_center` along `axis` for `height` units.
#[derive(Debug, Clone)]
pub struct Cylinder {
    pub base_center: (f64, f64, f64),
    pub axis: (f64, f64, f64),
    pub radius: f64,
    pub height: f64,
}

impl Cylinder {
    /// `axis` is normalised; its length is ignored.
    pub fn new(
        base_center: (f64, f64, f64),
        axis: (f64, f64, f64),
        radius: f64,
        height: f64,
    ) -> Result<Self> {
        let axis = normalized(axis).ok_or_else(|| SchematicError::invalid("cylinder axis has zero length"))?;
        if !(radius >= 0.0) || !radius.is_finite() {
            return Err(SchematicError::invalid(format!("invalid cylinder radius {}", radius)));
        }
        if !(height >= 0.0) || !height.is_finite() {
            return Err(SchematicError::invalid(format!("invalid cylinder height {}", height)));
        }
        Ok(Self {
            base_center,
            axis,
            radius,
            height,
        })
    }

    /// Cylinder whose axis runs from `p1` to `p2`.
    pub fn between(p1: (f64, f64, f64), p2: (f64, f64, f64), radius: f64) -> Result<Self> {
        let d = (p2.0 - p1.0, p2.1 - p1.1, p2.2 - p1.2);
        let height = (d.0 * d.0 + d.1 * d.1 + d.2 * d.2).sqrt();
        Self::new(p1, d, radius, height)
    }

    /// Axial distance along the axis and the radial offset vector.
    fn project(&self, x: i32, y: i32, z: i32) -> (f64, (f64, f64, f64)) {
        let ax = self.axis;
        let dx = x as f64 - self.base_center.0;
        let dy = y as f64 - self.base_center.1;
        let dz = z as f64 - self.base_center.2;
        let axial = dx * ax.0 + dy * ax.1 + dz * ax.2;
        (axial, (dx - axial * ax.0, dy - axial * ax.1, dz - axial * ax.2))
    }
}

impl Shape for Cylinder {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let (axial, r) = self.project(x, y, z);
        let radial_sq = r.0 * r.0 + r.1 * r.1 + r.2 * r.2;
        axial >= 0.0 && axial <= self.height && radial_sq <= self.radius * self.radius
    }

    fn bounds(&self) -> Option<BoundingBox> {
        let b = self.base_center;
        let ax = self.axis;
        let end = (
            b.0 + ax.0 * self.height,
            b.1 + ax.1 * self.height,
            b.2 + ax.2 * self.height,
        );
        let r = self.radius;
        lattice_bounds(
            (b.0.min(end.0) - r, b.1.min(end.1) - r, b.2.min(end.2) - r),
            (b.0.max(end.0) + r, b.1.max(end.1) + r, b.2.max(end.2) + r),
        )
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        let (_, radial) = self.project(x, y, z);
        normalized(radial).unwrap_or(self.axis)
    }
}
