//! Cross-section properties of built-up thin-walled beams.
//!
//! Ship-structure stiffeners are idealised as three rectangular plates
//! stacked along the section height: bottom flange, web, top flange (the top
//! flange is usually the attached deck strip). Heights are measured from the
//! underside of the bottom flange.

use serde::{Deserialize, Serialize};

/// Plate dimensions of a built-up section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateSection {
    /// Top flange width
    pub top_width: f64,
    /// Top flange thickness
    pub top_thickness: f64,
    /// Clear web height between flanges
    pub web_height: f64,
    /// Web thickness
    pub web_thickness: f64,
    /// Bottom flange width
    pub bottom_width: f64,
    /// Bottom flange thickness
    pub bottom_thickness: f64,
}

/// Values carried into an equivalent beam property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionValues {
    /// Cross-sectional area
    pub area: f64,
    /// Strong-axis second moment of area
    pub izz: f64,
    /// Weak-axis second moment of area
    pub iyy: f64,
    /// Torsion constant
    pub torsion: f64,
}

impl SectionValues {
    pub fn as_dims(&self) -> Vec<f64> {
        vec![self.area, self.izz, self.iyy, self.torsion]
    }
}

impl std::ops::Add for SectionValues {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            area: self.area + rhs.area,
            izz: self.izz + rhs.izz,
            iyy: self.iyy + rhs.iyy,
            torsion: self.torsion + rhs.torsion,
        }
    }
}

/// Full result of the plate-section calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlateSectionProperties {
    pub area: f64,
    /// Height of the neutral axis above the underside
    pub neutral_axis: f64,
    pub i_strong: f64,
    pub i_weak: f64,
    pub torsion: f64,
    pub shear_area_strong: f64,
    pub shear_area_weak: f64,
}

impl PlateSectionProperties {
    pub fn values(&self) -> SectionValues {
        SectionValues {
            area: self.area,
            izz: self.i_strong,
            iyy: self.i_weak,
            torsion: self.torsion,
        }
    }
}

impl PlateSection {
    /// I section from `[H, W_bot, W_top, tf_top, tw, tf_bot]`.
    pub fn from_i_dims(d: &[f64]) -> Option<Self> {
        if d.len() < 6 {
            return None;
        }
        Some(Self {
            web_height: d[0] - d[3] - d[5],
            bottom_width: d[1],
            top_width: d[2],
            top_thickness: d[3],
            web_thickness: d[4],
            bottom_thickness: d[5],
        })
    }

    /// T section from `[W_top, H, tf_top, tw]`; no bottom flange.
    pub fn from_t_dims(d: &[f64]) -> Option<Self> {
        if d.len() < 4 {
            return None;
        }
        Some(Self {
            top_width: d[0],
            web_height: d[1] - d[2],
            top_thickness: d[2],
            web_thickness: d[3],
            bottom_width: 0.0,
            bottom_thickness: 0.0,
        })
    }

    pub fn total_height(&self) -> f64 {
        self.web_height + self.bottom_thickness + self.top_thickness
    }

    /// Returns all-zero properties for a section without area.
    pub fn properties(&self) -> PlateSectionProperties {
        let (bt, tt) = (self.top_width, self.top_thickness);
        let (hw, tw) = (self.web_height, self.web_thickness);
        let (bb, tb) = (self.bottom_width, self.bottom_thickness);
        let h = self.total_height();

        let area = bt * tt + hw * tw + bb * tb;
        if area.abs() < f64::EPSILON {
            return PlateSectionProperties::default();
        }

        let top_centroid = h - tt / 2.0;
        let web_centroid = tb + hw / 2.0;
        let bottom_centroid = tb / 2.0;
        let na = (bt * tt * top_centroid + hw * tw * web_centroid + bb * tb * bottom_centroid)
            / area;

        let i_strong = bb * tb.powi(3) / 12.0
            + bb * tb * (na - bottom_centroid).powi(2)
            + tw * hw.powi(3) / 12.0
            + hw * tw * (web_centroid - na).powi(2)
            + bt * tt.powi(3) / 12.0
            + bt * tt * (top_centroid - na).powi(2);
        let i_weak = (tb * bb.powi(3) + tt * bt.powi(3) + hw * tw.powi(3)) / 12.0;
        let torsion = (bb * tb.powi(3) + hw * tw.powi(3) + bt * tt.powi(3)) / 3.0;

        // first moments of area about the neutral axis
        let s_below = bb * tb * (na - bottom_centroid) + (na - tb).powi(2) * tw / 2.0;
        let s_above = bt * tt * (top_centroid - na) + (hw + tb - na).powi(2) * tw / 2.0;
        let s_strong = (s_below + s_above) / 2.0;
        let s_weak = (tt * bt.powi(2) + tb * bb.powi(2) + hw * tw.powi(2)) / 8.0;

        PlateSectionProperties {
            area,
            neutral_axis: na,
            i_strong,
            i_weak,
            torsion,
            shear_area_strong: if s_strong != 0.0 {
                i_strong * tw / s_strong
            } else {
                0.0
            },
            shear_area_weak: if s_weak != 0.0 {
                i_weak * (tb + tt) / s_weak
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn symmetric_i_section_has_centred_neutral_axis() {
        // H=300, flanges 150x10, web 8
        let s = PlateSection::from_i_dims(&[300.0, 150.0, 150.0, 10.0, 8.0, 10.0]).unwrap();
        let p = s.properties();
        assert_relative_eq!(p.area, 150.0 * 10.0 * 2.0 + 280.0 * 8.0, epsilon = 1e-9);
        assert_relative_eq!(p.neutral_axis, 150.0, epsilon = 1e-9);

        let flanges = 2.0 * (150.0 * 1000.0 / 12.0 + 1500.0 * 145.0_f64.powi(2));
        let web = 8.0 * 280.0_f64.powi(3) / 12.0;
        assert_relative_eq!(p.i_strong, flanges + web, max_relative = 1e-12);
        assert_relative_eq!(
            p.torsion,
            (2.0 * 150.0 * 1000.0 + 280.0 * 512.0) / 3.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn t_section_reduces_to_flange_plus_web() {
        let s = PlateSection::from_t_dims(&[750.0, 200.0, 12.0, 10.0]).unwrap();
        assert_eq!(s.bottom_width, 0.0);
        assert_relative_eq!(s.web_height, 188.0);
        let p = s.properties();
        assert_relative_eq!(p.area, 750.0 * 12.0 + 188.0 * 10.0, epsilon = 1e-9);
        assert!(p.neutral_axis > 100.0 && p.neutral_axis < 200.0);
        assert!(p.i_weak > 0.0 && p.shear_area_strong > 0.0);
    }

    #[test]
    fn short_dimension_lists_are_rejected() {
        assert!(PlateSection::from_i_dims(&[1.0, 2.0, 3.0]).is_none());
        assert!(PlateSection::from_t_dims(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn zero_area_gives_zero_properties() {
        let p = PlateSection::default().properties();
        assert_eq!(p, PlateSectionProperties::default());
    }
}
