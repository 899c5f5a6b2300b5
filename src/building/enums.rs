use crate::bounding_box::BoundingBox;
use crate::building::{
    BilinearGradientBrush, Brush, ColorBrush, Cuboid, Cylinder, Difference, Ellipsoid, Hollow,
    Intersection, LinearGradientBrush, MultiPointGradientBrush, Paint, PointGradientBrush,
    ShadedBrush, Shape, SolidBrush, Sphere, Union,
};

// ============================================================================
// Delegate macro for ShapeEnum
// ============================================================================

macro_rules! delegate_shape {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            ShapeEnum::Sphere(s) => s.$method($($arg),*),
            ShapeEnum::Cuboid(s) => s.$method($($arg),*),
            ShapeEnum::Ellipsoid(s) => s.$method($($arg),*),
            ShapeEnum::Cylinder(s) => s.$method($($arg),*),
            ShapeEnum::Hollow(s) => s.$method($($arg),*),
            ShapeEnum::Union(s) => s.$method($($arg),*),
            ShapeEnum::Intersection(s) => s.$method($($arg),*),
            ShapeEnum::Difference(s) => s.$method($($arg),*),
        }
    };
}

macro_rules! enum_from {
    ($enum:ident, $($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for $enum {
                fn from(value: $ty) -> Self {
                    $enum::$variant(value)
                }
            }
        )*
    };
}

// ============================================================================
// Shapes
// ============================================================================

#[derive(Debug, Clone)]
pub enum ShapeEnum {
    Sphere(Sphere),
    Cuboid(Cuboid),
    Ellipsoid(Ellipsoid),
    Cylinder(Cylinder),
    Hollow(Hollow),
    Union(Union),
    Intersection(Intersection),
    Difference(Difference),
}

enum_from!(
    ShapeEnum,
    Sphere(Sphere),
    Cuboid(Cuboid),
    Ellipsoid(Ellipsoid),
    Cylinder(Cylinder),
    Hollow(Hollow),
    Union(Union),
    Intersection(Intersection),
    Difference(Difference),
);

impl Shape for ShapeEnum {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        delegate_shape!(self, contains, x, y, z)
    }

    fn bounds(&self) -> Option<BoundingBox> {
        delegate_shape!(self, bounds)
    }

    fn normal_at(&self, x: i32, y: i32, z: i32) -> (f64, f64, f64) {
        delegate_shape!(self, normal_at, x, y, z)
    }
}

// ============================================================================
// Brushes
// ============================================================================

#[derive(Debug, Clone)]
pub enum BrushEnum {
    Solid(SolidBrush),
    Color(ColorBrush),
    Linear(LinearGradientBrush),
    MultiPoint(MultiPointGradientBrush),
    Bilinear(BilinearGradientBrush),
    Shaded(ShadedBrush),
    Point(PointGradientBrush),
}

enum_from!(
    BrushEnum,
    Solid(SolidBrush),
    Color(ColorBrush),
    Linear(LinearGradientBrush),
    MultiPoint(MultiPointGradientBrush),
    Bilinear(BilinearGradientBrush),
    Shaded(ShadedBrush),
    Point(PointGradientBrush),
);

impl Brush for BrushEnum {
    fn paint(&self, x: i32, y: i32, z: i32, normal: (f64, f64, f64)) -> Option<Paint> {
        match self {
            BrushEnum::Solid(b) => b.paint(x, y, z, normal),
            BrushEnum::Color(b) => b.paint(x, y, z, normal),
            BrushEnum::Linear(b) => b.paint(x, y, z, normal),
            BrushEnum::MultiPoint(b) => b.paint(x, y, z, normal),
            BrushEnum::Bilinear(b) => b.paint(x, y, z, normal),
            BrushEnum::Shaded(b) => b.paint(x, y, z, normal),
            BrushEnum::Point(b) => b.paint(x, y, z, normal),
        }
    }
}
