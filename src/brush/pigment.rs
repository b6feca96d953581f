//! Pigment blend unit - per-pixel subtractive or linear color mixing
//!
//! Pigment mixing runs in a latent space built from a per-channel
//! Kubelka-Munk model: each sRGB channel becomes the absorption/scattering
//! ratio `K/S` of its linear reflectance. Mixing `K/S` values behaves like
//! mixing paint (blue + yellow gives green instead of grey). Reflectance is
//! floored to keep `K/S` finite, and whatever the floor loses is kept as a
//! residual that is mixed linearly, so a color survives the round trip.

use serde::{Deserialize, Serialize};

/// Which color model a buffer is mixed and displayed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixModel {
    #[default]
    Pigment,
    Linear,
}

impl MixModel {
    pub const ALL: [MixModel; 2] = [MixModel::Pigment, MixModel::Linear];

    pub const fn index(self) -> usize {
        match self {
            MixModel::Pigment => 0,
            MixModel::Linear => 1,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            MixModel::Pigment => MixModel::Linear,
            MixModel::Linear => MixModel::Pigment,
        }
    }
}

/// Lowest linear reflectance fed into the K/S transform
const REFLECTANCE_FLOOR: f32 = 0.01;

#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn ks_from_reflectance(r: f32) -> f32 {
    let r = r.clamp(REFLECTANCE_FLOOR, 1.0);
    (1.0 - r) * (1.0 - r) / (2.0 * r)
}

/// Inverse of [`ks_from_reflectance`], written as `1 / (1 + k + sqrt(k² + 2k))`
/// to avoid cancellation for strongly absorbing channels.
#[inline]
fn reflectance_from_ks(ks: f32) -> f32 {
    let ks = ks.max(0.0);
    1.0 / (1.0 + ks + (ks * (ks + 2.0)).sqrt())
}

/// A color in pigment space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PigmentLatent {
    ks: [f32; 3],
    residual: [f32; 3],
}

impl PigmentLatent {
    pub fn from_rgb(rgb: [f32; 3]) -> Self {
        let mut ks = [0.0; 3];
        let mut residual = [0.0; 3];
        for i in 0..3 {
            let c = rgb[i].clamp(0.0, 1.0);
            ks[i] = ks_from_reflectance(srgb_to_linear(c));
            residual[i] = c - linear_to_srgb(reflectance_from_ks(ks[i]));
        }
        Self { ks, residual }
    }

    pub fn to_rgb(&self) -> [f32; 3] {
        let mut rgb = [0.0; 3];
        for i in 0..3 {
            let c = linear_to_srgb(reflectance_from_ks(self.ks[i])) + self.residual[i];
            rgb[i] = c.clamp(0.0, 1.0);
        }
        rgb
    }

    /// Weighted average of two latents; `None` when both weights vanish
    pub fn mix(&self, self_weight: f32, other: &PigmentLatent, other_weight: f32) -> Option<Self> {
        let total = self_weight + other_weight;
        if total <= 0.0 {
            return None;
        }
        let (wa, wb) = (self_weight / total, other_weight / total);
        let mut out = *self;
        for i in 0..3 {
            out.ks[i] = self.ks[i] * wa + other.ks[i] * wb;
            out.residual[i] = self.residual[i] * wa + other.residual[i] * wb;
        }
        Some(out)
    }
}

/// Mix `b` into `a` by fraction `t` under the given model
pub fn mix_rgb(a: [f32; 3], b: [f32; 3], t: f32, model: MixModel) -> [f32; 3] {
    if t.is_nan() || t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    match model {
        MixModel::Pigment => PigmentLatent::from_rgb(a)
            .mix(1.0 - t, &PigmentLatent::from_rgb(b), t)
            .map(|l| l.to_rgb())
            .unwrap_or(a),
        MixModel::Linear => [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
        ],
    }
}

/// Blend one brush sample into a straight-alpha destination pixel.
///
/// The brush carries weight `coverage`, the destination `Ad * (1 - coverage)`.
/// When both weights are zero the color is black. Alpha accumulates with the
/// Porter-Duff "over" rule for both models.
#[inline]
pub fn blend_pixel(dst: [f32; 4], brush: [f32; 3], coverage: f32, model: MixModel) -> [f32; 4] {
    let coverage = coverage.clamp(0.0, 1.0);
    let dst_alpha = dst[3].clamp(0.0, 1.0);

    let brush_weight = coverage;
    let dst_weight = dst_alpha * (1.0 - coverage);
    let total = brush_weight + dst_weight;

    let rgb = if total <= 0.0 {
        [0.0; 3]
    } else {
        match model {
            MixModel::Pigment => PigmentLatent::from_rgb([dst[0], dst[1], dst[2]])
                .mix(dst_weight, &PigmentLatent::from_rgb(brush), brush_weight)
                .map(|l| l.to_rgb())
                .unwrap_or([0.0; 3]),
            MixModel::Linear => {
                let (wd, wb) = (dst_weight / total, brush_weight / total);
                [
                    dst[0] * wd + brush[0] * wb,
                    dst[1] * wd + brush[1] * wb,
                    dst[2] * wd + brush[2] * wb,
                ]
            }
        }
    };

    let alpha = (dst_alpha + coverage * (1.0 - dst_alpha)).min(1.0);
    [rgb[0], rgb[1], rgb[2], alpha]
}
