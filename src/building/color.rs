use blockpedia::ExtendedColorData;
use ::palette::{IntoColor, Srgb};
use serde::{Deserialize, Serialize};

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Oklab coordinates, read off blockpedia's polar Oklch form.
    pub fn to_oklab(self) -> Oklab {
        let [l, chroma, hue] = ExtendedColorData::from_rgb(self.r, self.g, self.b).oklch;
        let (sin, cos) = (hue as f64).to_radians().sin_cos();
        Oklab {
            l: l as f64,
            a: chroma as f64 * cos,
            b: chroma as f64 * sin,
        }
    }

    /// Every channel multiplied by `factor`, rounded and clamped.
    pub fn scaled(self, factor: f64) -> Rgb {
        let scale = |c: u8| to_channel(c as f64 * factor);
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb::new(r, g, b)
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(c: Rgb) -> Self {
        (c.r, c.g, c.b)
    }
}

/// A colour in the Oklab perceptual space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Oklab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Oklab {
    /// Back to sRGB, clamped to the gamut.
    pub fn to_rgb(self) -> Rgb {
        let lab = ::palette::Oklab::new(self.l as f32, self.a as f32, self.b as f32);
        let srgb: Srgb = lab.into_color();
        Rgb::new(
            to_channel(srgb.red as f64 * 255.0),
            to_channel(srgb.green as f64 * 255.0),
            to_channel(srgb.blue as f64 * 255.0),
        )
    }
}

#[inline]
fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Colour space gradients blend in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationSpace {
    /// Blend sRGB channels directly.
    #[default]
    Rgb,
    /// Blend in Oklab and convert back, which keeps perceived lightness even.
    Oklab,
}

impl InterpolationSpace {
    pub fn lerp(self, from: Rgb, to: Rgb, t: f64) -> Rgb {
        self.mix(&[(from, 1.0 - t), (to, t)])
    }

    /// Weighted average of `colors`. Weights are normalised; a zero total
    /// yields the first colour.
    pub fn mix(self, colors: &[(Rgb, f64)]) -> Rgb {
        let total: f64 = colors.iter().map(|(_, w)| w).sum();
        let Some(&(first, _)) = colors.first() else {
            return Rgb::default();
        };
        if !(total > 0.0) {
            return first;
        }
        match self {
            InterpolationSpace::Rgb => {
                let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
                for &(c, w) in colors {
                    r += c.r as f64 * w;
                    g += c.g as f64 * w;
                    b += c.b as f64 * w;
                }
                Rgb::new(to_channel(r / total), to_channel(g / total), to_channel(b / total))
            }
            InterpolationSpace::Oklab => {
                let mut acc = Oklab::default();
                for &(c, w) in colors {
                    let lab = c.to_oklab();
                    acc.l += lab.l * w;
                    acc.a += lab.a * w;
                    acc.b += lab.b * w;
                }
                Oklab {
                    l: acc.l / total,
                    a: acc.a / total,
                    b: acc.b / total,
                }
                .to_rgb()
            }
        }
    }
}
