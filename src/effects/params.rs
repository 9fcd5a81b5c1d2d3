//! Tunable effect parameters and their uniform layout.

/// Largest accepted line thickness / grid line width, in pixels.
const MAX_THICKNESS: f32 = 16.0;
/// Smallest grid spacing, in world units.
const MIN_SPACING: f32 = 1e-3;

/// Parameter block shared by every effect material.
///
/// Each effect reads the fields it needs: wireframe uses `color` and
/// `thickness`, grid uses `color`, `thickness` and `spacing`, planar shadow
/// uses `color` and `bias`, depth/normal uses `mode`, solid tint uses `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Linear RGBA color.
    pub color: [f32; 4],
    /// Line thickness in pixels.
    pub thickness: f32,
    /// Grid cell size in world units.
    pub spacing: f32,
    /// Height offset of the shadow plane above the ground.
    pub bias: f32,
    /// Visualization mode selector.
    pub mode: u32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            color: [1.0; 4],
            thickness: 1.0,
            spacing: 1.0,
            bias: 0.0,
            mode: 0,
        }
    }
}

impl EffectParams {
    /// Copy with every field clamped into its supported range.
    ///
    /// Non-finite values fall back to the defaults.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };
        let mut color = self.color;
        for (c, d) in color.iter_mut().zip(defaults.color) {
            *c = finite_or(*c, d).clamp(0.0, 1.0);
        }
        Self {
            color,
            thickness: finite_or(self.thickness, defaults.thickness)
                .clamp(0.0, MAX_THICKNESS),
            spacing: finite_or(self.spacing, defaults.spacing)
                .max(MIN_SPACING),
            bias: finite_or(self.bias, defaults.bias),
            mode: self.mode.min(1),
        }
    }

    /// GPU representation.
    #[must_use]
    pub fn to_uniform(&self) -> EffectUniform {
        EffectUniform {
            color: self.color,
            misc: [self.thickness, self.spacing, self.bias, self.mode as f32],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
/// Uniform block bound to every effect material.
pub struct EffectUniform {
    /// Linear RGBA color.
    pub color: [f32; 4],
    /// `(thickness, spacing, bias, mode)`.
    pub misc: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_limits_ranges() {
        let params = EffectParams {
            color: [2.0, -1.0, 0.5, f32::NAN],
            thickness: 99.0,
            spacing: 0.0,
            bias: f32::INFINITY,
            mode: 7,
        }
        .clamped();
        assert_eq!(params.color, [1.0, 0.0, 0.5, 1.0]);
        assert_eq!(params.thickness, MAX_THICKNESS);
        assert_eq!(params.spacing, MIN_SPACING);
        assert_eq!(params.bias, 0.0);
        assert_eq!(params.mode, 1);
    }

    #[test]
    fn uniform_packs_misc_fields() {
        let uniform = EffectParams {
            thickness: 2.0,
            spacing: 0.5,
            bias: 0.01,
            mode: 1,
            ..Default::default()
        }
        .to_uniform();
        assert_eq!(uniform.misc, [2.0, 0.5, 0.01, 1.0]);
        assert_eq!(size_of::<EffectUniform>(), 32);
    }
}
