mod composite;
mod cuboid;
mod cylinder;
mod ellipsoid;
mod hollow;
mod sphere;

pub use composite::{Difference, Intersection, Union};
pub use cuboid::Cuboid;
pub use cylinder::Cylinder;
pub use ellipsoid::Ellipsoid;
pub use hollow::Hollow;
pub use sphere::Sphere;

use crate::bounding_box::BoundingBox;

pub trait Shape {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool;

    /// Box enclosing every member cell, `None` for an empty shape.
    fn bounds(&self) -> Option<BoundingBox>;

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64);

    /// Visits member cells in canonical order (x fastest, then y, then z).
    fn for_each_point<F>(&self, mut f: F)
    where
        F: FnMut(i32, i32, i32),
        Self: Sized,
    {
        if let Some(bounds) = self.bounds() {
            for (x, y, z) in bounds.iter_points() {
                if self.contains(x, y, z) {
                    f(x, y, z);
                }
            }
        }
    }

    fn points(&self) -> Vec<(i32, i32, i32)>
    where
        Self: Sized,
    {
        let mut points = Vec::new();
        self.for_each_point(|x, y, z| points.push((x, y, z)));
        points
    }
}

/// Integer box covering `[min, max]`, saturated to the `i32` lattice.
pub(crate) fn lattice_bounds(min: (f64, f64, f64), max: (f64, f64, f64)) -> Option<BoundingBox> {
    let lo = |v: f64| v.floor().clamp(i32::MIN as f64, i32::MAX as f64) as i32;
    let hi = |v: f64| v.ceil().clamp(i32::MIN as f64, i32::MAX as f64) as i32;
    let finite = [min.0, min.1, min.2, max.0, max.1, max.2]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return None;
    }
    let bounds = BoundingBox::new((lo(min.0), lo(min.1), lo(min.2)), (hi(max.0), hi(max.1), hi(max.2)));
    bounds.is_valid().then_some(bounds)
}

#[inline]
pub(crate) fn normalized(v: (f64, f64, f64)) -> Option<(f64, f64, f64)> {
    let len = (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt();
    (len > 0.0 && len.is_finite()).then(|| (v.0 / len, v.1 / len, v.2 / len))
}
