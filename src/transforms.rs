//! Block state remapping for flips and quarter-turn rotations.
//!
//! Directions are treated as integer vectors and pushed through the same
//! linear map the grid applies to cell coordinates, so property changes always
//! agree with where the cell lands.

use crate::bounding_box::BoundingBox;
use crate::error::{Result, SchematicError};
use crate::BlockState;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

impl FromStr for Axis {
    type Err = SchematicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(SchematicError::invalid(format!("Unknown axis '{}'", other))),
        }
    }
}

type Vec3 = (i32, i32, i32);

const DIRECTIONS: [(&str, Vec3); 6] = [
    ("north", (0, 0, -1)),
    ("south", (0, 0, 1)),
    ("east", (1, 0, 0)),
    ("west", (-1, 0, 0)),
    ("up", (0, 1, 0)),
    ("down", (0, -1, 0)),
];

/// Blocks whose `facing` may point up or down. Every other block keeps a
/// horizontal facing when a rotation would tip it over.
const OMNIDIRECTIONAL_FACING: [&str; 14] = [
    "piston",
    "sticky_piston",
    "piston_head",
    "moving_piston",
    "observer",
    "dispenser",
    "dropper",
    "end_rod",
    "lightning_rod",
    "barrel",
    "command_block",
    "chain_command_block",
    "repeating_command_block",
    "amethyst_cluster",
];

fn accepts_facing(state: &BlockState, facing: &str) -> bool {
    if !matches!(facing, "up" | "down") {
        return true;
    }
    let name = state.name();
    let path = name.split_once(':').map_or(name, |(_, path)| path);
    match path {
        "hopper" => facing == "down",
        _ => {
            OMNIDIRECTIONAL_FACING.contains(&path)
                || path.ends_with("shulker_box")
                || path.ends_with("amethyst_bud")
        }
    }
}

/// Validates a rotation and returns the number of clockwise quarter turns (0..=3).
pub fn quarter_turns(degrees: i32) -> Result<u8> {
    if degrees % 90 != 0 {
        return Err(SchematicError::invalid(format!(
            "Rotation must be a multiple of 90 degrees, got {}",
            degrees
        )));
    }
    Ok((degrees.rem_euclid(360) / 90) as u8)
}

/// One quarter turn about `axis`, applied to a vector.
#[inline]
pub(crate) fn rotate_vec(axis: Axis, (x, y, z): Vec3) -> Vec3 {
    match axis {
        Axis::Y => (z, y, -x),
        Axis::X => (x, z, -y),
        Axis::Z => (y, -x, z),
    }
}

#[inline]
pub(crate) fn flip_vec(axis: Axis, (x, y, z): Vec3) -> Vec3 {
    match axis {
        Axis::X => (-x, y, z),
        Axis::Y => (x, -y, z),
        Axis::Z => (x, y, -z),
    }
}

/// Size of a box after a quarter turn about `axis`.
pub(crate) fn rotate_size(axis: Axis, (w, h, l): Vec3) -> Vec3 {
    match axis {
        Axis::Y => (l, h, w),
        Axis::X => (w, l, h),
        Axis::Z => (h, w, l),
    }
}

/// Maps an offset inside a box of `size` to its offset after a quarter turn,
/// keeping the min corner fixed.
pub(crate) fn rotate_offset(axis: Axis, rel: Vec3, size: Vec3) -> Vec3 {
    let (x, y, z) = rotate_vec(axis, rel);
    let (w, h, l) = size;
    match axis {
        Axis::Y => (x, y, z + w - 1),
        Axis::X => (x, y, z + h - 1),
        Axis::Z => (x, y + w - 1, z),
    }
}

/// Mirrors a point across the centre plane of `pivot` perpendicular to `axis`.
#[inline]
pub(crate) fn flip_point(axis: Axis, (x, y, z): Vec3, pivot: &BoundingBox) -> Vec3 {
    // The mirror of a member stays inside the pivot, only the sum needs i64.
    let mirror = |lo: i32, hi: i32, c: i32| (lo as i64 + hi as i64 - c as i64) as i32;
    match axis {
        Axis::X => (mirror(pivot.min.0, pivot.max.0, x), y, z),
        Axis::Y => (x, mirror(pivot.min.1, pivot.max.1, y), z),
        Axis::Z => (x, y, mirror(pivot.min.2, pivot.max.2, z)),
    }
}

/// Applies `turns` quarter turns to a point of `pivot`, keeping the pivot's min corner.
pub(crate) fn rotate_point(axis: Axis, turns: u8, p: Vec3, pivot: &BoundingBox) -> Vec3 {
    let min = pivot.min;
    let mut rel = (p.0 - min.0, p.1 - min.1, p.2 - min.2);
    let mut size = pivot.get_dimensions();
    for _ in 0..turns {
        rel = rotate_offset(axis, rel, size);
        size = rotate_size(axis, size);
    }
    (min.0 + rel.0, min.1 + rel.1, min.2 + rel.2)
}

/// The box a pivot occupies after `turns` quarter turns about its min corner, or
/// `None` if it would reach past the `i32` range.
pub(crate) fn rotated_box(axis: Axis, turns: u8, pivot: &BoundingBox) -> Option<BoundingBox> {
    let size = (0..turns).fold(pivot.get_dimensions(), |s, _| rotate_size(axis, s));
    BoundingBox::from_position_and_size(pivot.min, size)
}

fn direction_vec(name: &str) -> Option<Vec3> {
    DIRECTIONS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

fn direction_name(v: Vec3) -> Option<&'static str> {
    DIRECTIONS.iter().find(|(_, d)| *d == v).map(|(n, _)| *n)
}

fn axis_vec(name: &str) -> Option<Vec3> {
    match name {
        "x" => Some((1, 0, 0)),
        "y" => Some((0, 1, 0)),
        "z" => Some((0, 0, 1)),
        _ => None,
    }
}

fn axis_name((x, y, _): Vec3) -> &'static str {
    if x != 0 {
        "x"
    } else if y != 0 {
        "y"
    } else {
        "z"
    }
}

fn rotation_to_vec(rotation: u8) -> Option<Vec3> {
    match rotation {
        0 => Some((0, 0, 1)),
        4 => Some((-1, 0, 0)),
        8 => Some((0, 0, -1)),
        12 => Some((1, 0, 0)),
        _ => None,
    }
}

fn remap_facing(state: BlockState, f: impl Fn(Vec3) -> Vec3) -> BlockState {
    let Some(facing) = state.get_property("facing").cloned() else {
        return state;
    };
    let Some(v) = direction_vec(&facing) else {
        return state;
    };
    let Some(new) = direction_name(f(v)) else {
        return state;
    };
    if !accepts_facing(&state, new) {
        return state;
    }
    state.with_property("facing", new)
}

fn remap_axis(state: BlockState, f: impl Fn(Vec3) -> Vec3) -> BlockState {
    match state.get_property("axis").and_then(|a| axis_vec(a)) {
        Some(v) => {
            let name = axis_name(f(v));
            state.with_property("axis", name)
        }
        None => state,
    }
}

/// Moves side-keyed properties (`north=true`, `east=side`, ...) to their new sides.
/// With `vertical` false, only the four horizontal keys take part.
fn remap_connections(state: BlockState, vertical: bool, f: impl Fn(Vec3) -> Vec3) -> BlockState {
    let keys: &[&str] = if vertical {
        &["north", "south", "east", "west", "up", "down"]
    } else {
        &["north", "south", "east", "west"]
    };
    if !keys.iter().all(|k| state.get_property(k).is_some()) {
        return state;
    }

    let mut moved: Vec<(&'static str, SmolStr)> = Vec::with_capacity(keys.len());
    for key in keys {
        let (Some(v), Some(value)) = (direction_vec(key), state.get_property(key).cloned()) else {
            return state;
        };
        match direction_name(f(v)) {
            Some(new_key) if keys.contains(&new_key) => moved.push((new_key, value)),
            _ => return state,
        }
    }
    moved
        .into_iter()
        .fold(state, |s, (k, v)| s.with_property(k, v))
}

fn remap_rotation(state: BlockState, f: impl Fn(Vec3) -> Vec3) -> BlockState {
    let Some(rotation) = state.get_property("rotation").and_then(|r| r.parse::<u8>().ok()) else {
        return state;
    };
    if rotation > 15 {
        return state;
    }
    // Treat the 16 steps as a cardinal direction plus a sub-step offset.
    let base = rotation - rotation % 4;
    let sub = rotation % 4;
    let Some(v) = rotation_to_vec(base) else {
        return state;
    };
    let mapped = f(v);
    let Some(new_base) = (0..4u8).map(|i| i * 4).find(|b| rotation_to_vec(*b) == Some(mapped)) else {
        return state;
    };
    // A mirror reverses the winding of the sub-step.
    let mirrored = {
        let next = rotation_to_vec((base + 4) % 16).map(&f);
        let expected_next = rotation_to_vec((new_base + 4) % 16);
        next != expected_next
    };
    let new_rotation = if mirrored {
        (new_base + 16 - sub) % 16
    } else {
        (new_base + sub) % 16
    };
    state.with_property("rotation", new_rotation.to_string())
}

fn swap_values(state: BlockState, key: &str, a: &str, b: &str) -> BlockState {
    let current = state.get_property(key).cloned();
    match current.as_deref() {
        Some(v) if v == a => state.with_property(key, b),
        Some(v) if v == b => state.with_property(key, a),
        _ => state,
    }
}

fn swap_vertical_halves(state: BlockState) -> BlockState {
    let state = swap_values(state, "half", "top", "bottom");
    swap_values(state, "type", "top", "bottom")
}

fn swap_handedness(state: BlockState) -> BlockState {
    let state = swap_values(state, "hinge", "left", "right");
    let state = swap_values(state, "shape", "inner_left", "inner_right");
    swap_values(state, "shape", "outer_left", "outer_right")
}

/// Mirror a block state across the plane perpendicular to `axis`.
pub fn transform_block_state_flip(state: &BlockState, axis: Axis) -> BlockState {
    if state.properties().is_empty() {
        return state.clone();
    }
    let f = |v| flip_vec(axis, v);
    let mut out = remap_facing(state.clone(), f);
    out = remap_connections(out, axis == Axis::Y, f);
    match axis {
        Axis::Y => swap_vertical_halves(out),
        Axis::X | Axis::Z => {
            out = remap_rotation(out, f);
            swap_handedness(out)
        }
    }
}

/// Rotate a block state by `degrees` about `axis`. Non-multiples of 90 leave it unchanged.
pub fn transform_block_state_rotate(state: &BlockState, axis: Axis, degrees: i32) -> BlockState {
    let Ok(turns) = quarter_turns(degrees) else {
        return state.clone();
    };
    if turns == 0 || state.properties().is_empty() {
        return state.clone();
    }

    let mut out = state.clone();
    for _ in 0..turns {
        let f = |v| rotate_vec(axis, v);
        out = remap_facing(out, f);
        out = remap_axis(out, f);
        out = remap_connections(out, axis != Axis::Y, f);
        if axis == Axis::Y {
            out = remap_rotation(out, f);
        }
    }
    if axis != Axis::Y && turns == 2 {
        out = swap_vertical_halves(out);
    }
    out
}
