use super::color::{InterpolationSpace, Rgb};
use crate::error::{Result, SchematicError};
use crate::BlockState;
use blockpedia::{all_blocks, BlockFacts, ExtendedColorData};
use std::sync::OnceLock;

type Pos = (i32, i32, i32);
type Vec3 = (f64, f64, f64);

/// What a brush wants at a cell: a concrete block, or a colour that still has
/// to be matched against a block palette.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Block(BlockState),
    Color(Rgb),
}

pub trait Brush {
    /// Paint for the given cell, optionally using the surface normal
    fn paint(&self, x: i32, y: i32, z: i32, normal: Vec3) -> Option<Paint>;
}

/// Turns a colour into a block.
pub trait ColorResolver {
    fn resolve(&self, color: Rgb) -> Option<BlockState>;
}

impl<F> ColorResolver for F
where
    F: Fn(Rgb) -> Option<BlockState>,
{
    fn resolve(&self, color: Rgb) -> Option<BlockState> {
        self(color)
    }
}

/// A palette of blocks used for color matching
pub struct BlockPalette {
    blocks: Vec<(ExtendedColorData, String)>,
}

impl BlockPalette {
    pub fn new_all() -> Self {
        Self::new_filtered(|_| true)
    }

    /// Every coloured block accepted by `filter`.
    pub fn new_filtered<F>(filter: F) -> Self
    where
        F: Fn(&BlockFacts) -> bool,
    {
        let mut blocks = Vec::new();
        for facts in all_blocks() {
            if !filter(facts) {
                continue;
            }
            if let Some(c) = &facts.extras.color {
                blocks.push((c.to_extended(), facts.id.to_string()));
            }
        }
        Self { blocks }
    }

    pub fn new_concrete() -> Self {
        Self::new_filtered(|f| f.id.contains("concrete") && !f.id.contains("powder"))
    }

    pub fn new_wool() -> Self {
        Self::new_filtered(|f| f.id.contains("wool"))
    }

    pub fn new_terracotta() -> Self {
        Self::new_filtered(|f| f.id.contains("terracotta") && !f.id.contains("glazed"))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Closest block id by Oklab distance; the first entry wins ties.
    pub fn find_closest(&self, target: &ExtendedColorData) -> Option<&str> {
        let mut best_dist = f32::MAX;
        let mut best_id = None;
        for (color, id) in &self.blocks {
            let dist = target.distance_oklab(color);
            if dist < best_dist {
                best_dist = dist;
                best_id = Some(id.as_str());
            }
        }
        best_id
    }
}

impl ColorResolver for BlockPalette {
    fn resolve(&self, color: Rgb) -> Option<BlockState> {
        let target = ExtendedColorData::from_rgb(color.r, color.g, color.b);
        self.find_closest(&target).map(BlockState::new)
    }
}

// Global default palette
static DEFAULT_PALETTE: OnceLock<BlockPalette> = OnceLock::new();

/// Shared palette of every coloured block, built on first use.
pub fn default_palette() -> &'static BlockPalette {
    DEFAULT_PALETTE.get_or_init(BlockPalette::new_all)
}

#[inline]
fn sub(a: Vec3, b: Vec3) -> Vec3 {
    (a.0 - b.0, a.1 - b.1, a.2 - b.2)
}

#[inline]
fn dot(a: Vec3, b: Vec3) -> f64 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

#[inline]
fn to_vec(p: Pos) -> Vec3 {
    (p.0 as f64, p.1 as f64, p.2 as f64)
}

/// A brush that places a single specific block
#[derive(Debug, Clone)]
pub struct SolidBrush {
    block: BlockState,
}

impl SolidBrush {
    pub fn new(block: BlockState) -> Self {
        Self { block }
    }
}

impl Brush for SolidBrush {
    fn paint(&self, _x: i32, _y: i32, _z: i32, _normal: Vec3) -> Option<Paint> {
        Some(Paint::Block(self.block.clone()))
    }
}

/// A brush that places blocks closest to a specific color
#[derive(Debug, Clone, Copy)]
pub struct ColorBrush {
    color: Rgb,
}

impl ColorBrush {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { color: Rgb::new(r, g, b) }
    }
}

impl Brush for ColorBrush {
    fn paint(&self, _x: i32, _y: i32, _z: i32, _normal: Vec3) -> Option<Paint> {
        Some(Paint::Color(self.color))
    }
}

/// A brush that interpolates color linearly between two points
#[derive(Debug, Clone)]
pub struct LinearGradientBrush {
    start_pos: Vec3,
    direction: Vec3,
    start_color: Rgb,
    end_color: Rgb,
    length_sq: f64,
    space: InterpolationSpace,
}

impl LinearGradientBrush {
    pub fn new(p1: Pos, c1: (u8, u8, u8), p2: Pos, c2: (u8, u8, u8)) -> Self {
        let start_pos = to_vec(p1);
        let direction = sub(to_vec(p2), start_pos);
        Self {
            start_pos,
            direction,
            start_color: c1.into(),
            end_color: c2.into(),
            length_sq: dot(direction, direction),
            space: InterpolationSpace::Rgb,
        }
    }

    pub fn with_space(mut self, space: InterpolationSpace) -> Self {
        self.space = space;
        self
    }

    fn t_at(&self, x: i32, y: i32, z: i32) -> f64 {
        if self.length_sq == 0.0 {
            return 0.0;
        }
        let rel = sub(to_vec((x, y, z)), self.start_pos);
        (dot(rel, self.direction) / self.length_sq).clamp(0.0, 1.0)
    }
}

impl Brush for LinearGradientBrush {
    fn paint(&self, x: i32, y: i32, z: i32, _normal: Vec3) -> Option<Paint> {
        let t = self.t_at(x, y, z);
        Some(Paint::Color(self.space.lerp(self.start_color, self.end_color, t)))
    }
}

/// A linear gradient with any number of colour stops along the p1→p2 axis.
#[derive(Debug, Clone)]
pub struct MultiPointGradientBrush {
    axis: LinearGradientBrush,
    stops: Vec<(f64, Rgb)>,
    space: InterpolationSpace,
}

impl MultiPointGradientBrush {
    /// `stops` are `(position, colour)` pairs; positions are clamped to [0, 1]
    /// and sorted.
    pub fn new(p1: Pos, p2: Pos, stops: Vec<(f64, (u8, u8, u8))>) -> Result<Self> {
        if stops.is_empty() {
            return Err(SchematicError::invalid("gradient needs at least one colour stop"));
        }
        if stops.iter().any(|(t, _)| t.is_nan()) {
            return Err(SchematicError::invalid("gradient stop position is NaN"));
        }
        let mut stops: Vec<(f64, Rgb)> = stops
            .into_iter()
            .map(|(t, c)| (t.clamp(0.0, 1.0), Rgb::from(c)))
            .collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(Self {
            axis: LinearGradientBrush::new(p1, (0, 0, 0), p2, (0, 0, 0)),
            stops,
            space: InterpolationSpace::Rgb,
        })
    }

    pub fn with_space(mut self, space: InterpolationSpace) -> Self {
        self.space = space;
        self
    }

    fn color_at(&self, t: f64) -> Rgb {
        let (first_t, first) = self.stops[0];
        let (last_t, last) = self.stops[self.stops.len() - 1];
        if t <= first_t {
            return first;
        }
        if t >= last_t {
            return last;
        }
        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t >= t0 && t <= t1 {
                let span = t1 - t0;
                let local = if span > 0.0 { (t - t0) / span } else { 0.0 };
                return self.space.lerp(c0, c1, local);
            }
        }
        last
    }
}

impl Brush for MultiPointGradientBrush {
    fn paint(&self, x: i32, y: i32, z: i32, _normal: Vec3) -> Option<Paint> {
        Some(Paint::Color(self.color_at(self.axis.t_at(x, y, z))))
    }
}

/// Four-corner gradient over the plane spanned by `origin→u_point` and
/// `origin→v_point`. Cells off the plane take the colour of their projection.
#[derive(Debug, Clone)]
pub struct BilinearGradientBrush {
    origin: Vec3,
    u: Vec3,
    v: Vec3,
    uu: f64,
    uv: f64,
    vv: f64,
    det: f64,
    corners: [Rgb; 4],
    space: InterpolationSpace,
}

impl BilinearGradientBrush {
    pub fn new(
        origin: Pos,
        u_point: Pos,
        v_point: Pos,
        c00: (u8, u8, u8),
        c10: (u8, u8, u8),
        c01: (u8, u8, u8),
        c11: (u8, u8, u8),
    ) -> Result<Self> {
        let o = to_vec(origin);
        let u = sub(to_vec(u_point), o);
        let v = sub(to_vec(v_point), o);
        let uu = dot(u, u);
        let vv = dot(v, v);
        let uv = dot(u, v);
        let det = uu * vv - uv * uv;
        if uu == 0.0 || vv == 0.0 {
            return Err(SchematicError::invalid("bilinear gradient axis has zero length"));
        }
        if det.abs() <= 1e-9 * uu * vv {
            return Err(SchematicError::invalid("bilinear gradient axes are parallel"));
        }

        Ok(Self {
            origin: o,
            u,
            v,
            uu,
            uv,
            vv,
            det,
            corners: [c00.into(), c10.into(), c01.into(), c11.into()],
            space: InterpolationSpace::Rgb,
        })
    }

    pub fn with_space(mut self, space: InterpolationSpace) -> Self {
        self.space = space;
        self
    }

    /// Least-squares (s, t) with `origin + s*u + t*v` closest to the cell.
    fn coordinates(&self, x: i32, y: i32, z: i32) -> (f64, f64) {
        let rel = sub(to_vec((x, y, z)), self.origin);
        let pu = dot(rel, self.u);
        let pv = dot(rel, self.v);
        let s = (self.vv * pu - self.uv * pv) / self.det;
        let t = (self.uu * pv - self.uv * pu) / self.det;
        (s.clamp(0.0, 1.0), t.clamp(0.0, 1.0))
    }
}

impl Brush for BilinearGradientBrush {
    fn paint(&self, x: i32, y: i32, z: i32, _normal: Vec3) -> Option<Paint> {
        let (s, t) = self.coordinates(x, y, z);
        let [c00, c10, c01, c11] = self.corners;
        Some(Paint::Color(self.space.mix(&[
            (c00, (1.0 - s) * (1.0 - t)),
            (c10, s * (1.0 - t)),
            (c01, (1.0 - s) * t),
            (c11, s * t),
        ])))
    }
}

/// Lambert shading of a base colour. `light_dir` is the direction the light
/// travels, so `(0, -1, 0)` lights upward-facing surfaces.
#[derive(Debug, Clone, Copy)]
pub struct ShadedBrush {
    base: Rgb,
    light: Vec3,
}

impl ShadedBrush {
    pub fn new(base: (u8, u8, u8), light_dir: Vec3) -> Result<Self> {
        let len = dot(light_dir, light_dir).sqrt();
        if !(len > 0.0) || !len.is_finite() {
            return Err(SchematicError::invalid("light direction must be a non-zero vector"));
        }
        Ok(Self {
            base: base.into(),
            light: (light_dir.0 / len, light_dir.1 / len, light_dir.2 / len),
        })
    }
}

impl Brush for ShadedBrush {
    fn paint(&self, _x: i32, _y: i32, _z: i32, normal: Vec3) -> Option<Paint> {
        let intensity = (-dot(normal, self.light)).max(0.0);
        Some(Paint::Color(self.base.scaled(intensity)))
    }
}

/// Inverse-distance-weighted blend of coloured control points.
#[derive(Debug, Clone)]
pub struct PointGradientBrush {
    points: Vec<(Pos, Rgb)>,
    falloff: f64,
    space: InterpolationSpace,
}

impl PointGradientBrush {
    pub fn new(points: Vec<(Pos, (u8, u8, u8))>, falloff: f64) -> Result<Self> {
        if points.is_empty() {
            return Err(SchematicError::invalid("point gradient needs at least one point"));
        }
        if !(falloff >= 0.0) {
            return Err(SchematicError::invalid(format!("invalid falloff {}", falloff)));
        }
        Ok(Self {
            points: points.into_iter().map(|(p, c)| (p, Rgb::from(c))).collect(),
            falloff,
            space: InterpolationSpace::Rgb,
        })
    }

    pub fn with_space(mut self, space: InterpolationSpace) -> Self {
        self.space = space;
        self
    }
}

impl Brush for PointGradientBrush {
    fn paint(&self, x: i32, y: i32, z: i32, _normal: Vec3) -> Option<Paint> {
        let here = to_vec((x, y, z));
        let mut weighted = Vec::with_capacity(self.points.len());
        let mut nearest = (f64::INFINITY, Rgb::default());
        for &(p, color) in &self.points {
            let d = sub(here, to_vec(p));
            let dist = dot(d, d).sqrt();
            if dist == 0.0 {
                return Some(Paint::Color(color));
            }
            if dist < nearest.0 {
                nearest = (dist, color);
            }
            weighted.push((color, 1.0 / dist.powf(self.falloff)));
        }
        // Steep falloffs underflow every weight.
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        if !(total > 0.0) || !total.is_finite() {
            return Some(Paint::Color(nearest.1));
        }
        Some(Paint::Color(self.space.mix(&weighted)))
    }
}
