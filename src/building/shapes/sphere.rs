use super::Shape;
use crate::bounding_box::BoundingBox;
use crate::error::{Result, SchematicError};

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: (i32, i32, i32),
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: (i32, i32, i32), radius: f64) -> Result<Self> {
        if !(radius >= 0.0) || !radius.is_finite() {
            return Err(SchematicError::invalid(format!("invalid sphere radius {}", radius)));
        }
        Ok(Self { center, radius })
    }
}

impl Shape for Sphere {
    /// Squared distance between cell centres, so radius 0 is the single centre cell.
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let dx = x as i64 - self.center.0 as i64;
        let dy = y as i64 - self.center.1 as i64;
        let dz = z as i64 - self.center.2 as i64;
        (dx * dx + dy * dy + dz * dz) as f64 <= self.radius * self.radius
    }

    fn bounds(&self) -> Option<BoundingBox> {
        let r = self.radius.floor() as i32;
        let (cx, cy, cz) = self.center;
        Some(BoundingBox::new(
            (cx.saturating_sub(r), cy.saturating_sub(r), cz.saturating_sub(r)),
            (cx.saturating_add(r), cy.saturating_add(r), cz.saturating_add(r)),
        ))
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        let dx = x as f64 - self.center.0 as f64;
        let dy = y as f64 - self.center.1 as f64;
        let dz = z as f64 - self.center.2 as f64;
        let dist = (dx * dx + dy * dy + dz * dz).sqrt();
        if dist == 0.0 {
            (0.0, 1.0, 0.0)
        } else {
            (dx / dist, dy / dist, dz / dist)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_cells() {
        assert_eq!(Sphere::new((4, 4, 4), 0.0).unwrap().points(), vec![(4, 4, 4)]);
        // Radius 1 is the centre plus its six face neighbours.
        assert_eq!(Sphere::new((0, 0, 0), 1.0).unwrap().points().len(), 7);
        assert_eq!(Sphere::new((0, 0, 0), 1.5).unwrap().points().len(), 19);
        assert_eq!(Sphere::new((0, 0, 0), 2.0).unwrap().points().len(), 33);
    }

    #[test]
    fn test_sphere_bounds_and_normals() {
        let sphere = Sphere::new((10, 0, -3), 2.7).unwrap();
        let bounds = sphere.bounds().unwrap();
        assert_eq!(bounds.min, (8, -2, -5));
        assert_eq!(bounds.max, (12, 2, -1));
        assert_eq!(sphere.normal_at(10, 0, -3), (0.0, 1.0, 0.0));
        assert_eq!(sphere.normal_at(12, 0, -3), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_invalid_radius() {
        assert!(Sphere::new((0, 0, 0), -1.0).is_err());
        assert!(Sphere::new((0, 0, 0), f64::NAN).is_err());
        assert!(Sphere::new((0, 0, 0), f64::INFINITY).is_err());
    }
}
