//! Built-in camera colour profiles.
//!
//! Each profile holds the Adobe DNG XYZ to camera coefficients (scaled by
//! 10000) for one camera model. The camera to sRGB and camera to XYZ
//! matrices are derived from them the way dcraw does.

use crate::image_pipeline::color::matrix::{invert, multiply, ColorMatrix};
use crate::image_pipeline::metadata::{keys, MetadataProvider};
use crate::image_pipeline::common::error::Result;

/// Linear sRGB primaries to XYZ.
pub const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.412453, 0.357580, 0.180423],
    [0.212671, 0.715160, 0.072169],
    [0.019334, 0.119193, 0.950227],
];

/// XYZ of the D65 white point.
pub const D65_WHITE: [f64; 3] = [0.950456, 1.0, 1.088754];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProfile {
    pub name: &'static str,
    pub black: u16,
    /// Saturation level, 0 when the sensor reports its own
    pub maximum: u16,
    pub xyz_to_camera: [i16; 9],
}

const PROFILES: &[CameraProfile] = &[
    profile("Canon EOS 5D Mark II", 0, 0x3cf0, [4716, 603, -830, -7798, 15474, 2480, -1496, 1937, 6651]),
    profile("Canon EOS 5D", 0, 0xe6c, [6347, -479, -972, -8297, 15954, 2480, -1968, 2131, 7649]),
    profile("Canon EOS 7D", 0, 0x3510, [6844, -996, -856, -3876, 11761, 2396, -593, 1772, 6198]),
    profile("Canon EOS 40D", 0, 0x3f60, [6071, -747, -856, -7653, 15365, 2441, -2025, 2553, 7315]),
    profile("Canon EOS 50D", 0, 0x3d93, [4920, 616, -593, -6493, 13964, 2784, -1774, 3178, 7005]),
    profile("Canon EOS 450D", 0, 0x390d, [5784, -262, -821, -7539, 15064, 2672, -1982, 2681, 7427]),
    profile("Canon EOS 500D", 0, 0x3479, [4763, 712, -646, -6821, 14399, 2640, -1921, 3276, 6561]),
    profile("Canon EOS 1000D", 0, 0xe43, [6771, -1139, -977, -7818, 15123, 2928, -1244, 1437, 7533]),
    profile("Canon EOS-1Ds Mark III", 0, 0x3bb0, [5859, -211, -930, -8255, 16017, 2353, -1732, 1887, 7448]),
    profile("NIKON D200", 0, 0xfbc, [8367, -2248, -763, -8758, 16447, 2422, -1527, 1550, 8053]),
    profile("NIKON D300", 0, 0, [9030, -1992, -715, -8465, 16302, 2255, -2689, 3217, 8069]),
    profile("NIKON D3X", 0, 0, [7171, -1986, -648, -8085, 15555, 2718, -2170, 2512, 7457]),
    profile("NIKON D3", 0, 0, [8139, -2171, -663, -8747, 16541, 2295, -1925, 2008, 8093]),
    profile("NIKON D5000", 0, 0xf00, [7309, -1403, -519, -8474, 16008, 2622, -2433, 2826, 8064]),
    profile("NIKON D700", 0, 0, [8139, -2171, -663, -8747, 16541, 2295, -1925, 2008, 8093]),
    profile("NIKON D80", 0, 0, [8629, -2410, -883, -9055, 16940, 2171, -1490, 1363, 8520]),
    profile("NIKON D90", 0, 0xf00, [7309, -1403, -519, -8474, 16008, 2622, -2434, 2826, 8064]),
    profile("OLYMPUS E-30", 0, 0xfbc, [8144, -1861, -1111, -7763, 15894, 1929, -1865, 2542, 7607]),
    profile("OLYMPUS E-3", 0, 0xf99, [9487, -2875, -1115, -7533, 15606, 2010, -1618, 2100, 7389]),
    profile("PENTAX K20D", 0, 0, [9427, -2714, -868, -7493, 16092, 1373, -2199, 3264, 7180]),
    profile("PENTAX K-7", 0, 0, [9142, -2947, -678, -8648, 16967, 1663, -2224, 2898, 8615]),
    profile("Panasonic DMC-G1", 15, 0xfff, [8199, -2065, -1056, -8124, 16156, 2033, -2458, 3022, 7220]),
    profile("Panasonic DMC-GH1", 15, 0xf92, [6299, -1466, -532, -6535, 13852, 2969, -2331, 3112, 5984]),
    profile("SONY DSLR-A700", 254, 0x1ffe, [5775, -805, -359, -8574, 16295, 2391, -1943, 2341, 7249]),
    profile("SONY DSLR-A850", 256, 0x1ffe, [5413, -1162, -365, -5665, 13098, 2866, -608, 1179, 8440]),
    profile("SONY DSLR-A900", 254, 0x1ffe, [5209, -1072, -397, -8845, 16120, 2919, -1618, 1803, 8654]),
];

const fn profile(name: &'static str, black: u16, maximum: u16, xyz_to_camera: [i16; 9]) -> CameraProfile {
    CameraProfile { name, black, maximum, xyz_to_camera }
}

/// Matrices derived from an XYZ to camera transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorConversion {
    pub cam_to_rgb: ColorMatrix,
    pub cam_to_xyz: ColorMatrix,
    /// Daylight multipliers, smallest normalized to 1
    pub camera_multipliers: [f64; 3],
}

impl ColorConversion {
    /// Derives the conversion from an XYZ to camera matrix of any scale.
    ///
    /// `rgb_to_cam = xyz_to_cam * RGB_TO_XYZ` is normalized so each row sums
    /// to 1, which makes a neutral camera response map to neutral sRGB.
    /// Returns `None` for degenerate matrices.
    pub fn from_xyz_to_camera(xyz_to_cam: [[f64; 3]; 3]) -> Option<Self> {
        let mut rgb_to_cam = multiply(&xyz_to_cam, &RGB_TO_XYZ);
        let mut multipliers = [0.0f64; 3];
        for (row, multiplier) in rgb_to_cam.iter_mut().zip(multipliers.iter_mut()) {
            let sum: f64 = row.iter().sum();
            if !sum.is_finite() || sum.abs() < 1e-9 {
                return None;
            }
            row.iter_mut().for_each(|v| *v /= sum);
            *multiplier = 1.0 / sum;
        }

        let min = multipliers.iter().copied().fold(f64::INFINITY, f64::min);
        if min > 0.0 {
            multipliers.iter_mut().for_each(|m| *m /= min);
        }

        let cam_to_rgb = invert(rgb_to_cam)?;
        Some(Self {
            cam_to_rgb: ColorMatrix::from_f64(cam_to_rgb),
            cam_to_xyz: ColorMatrix::from_f64(rgb_to_xyz_d65(&cam_to_rgb)),
            camera_multipliers: multipliers,
        })
    }

    /// Conversion for a camera whose primaries are taken to be sRGB's.
    pub fn for_camera_to_rgb(cam_to_rgb: ColorMatrix) -> Self {
        Self {
            cam_to_rgb,
            cam_to_xyz: ColorMatrix::from_f64(rgb_to_xyz_d65(&cam_to_rgb.to_f64())),
            camera_multipliers: [1.0; 3],
        }
    }
}

/// `RGB_TO_XYZ * m` with each XYZ row divided by the D65 white.
fn rgb_to_xyz_d65(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = multiply(&RGB_TO_XYZ, m);
    for (row, white) in out.iter_mut().zip(D65_WHITE) {
        row.iter_mut().for_each(|v| *v /= white);
    }
    out
}

impl CameraProfile {
    pub fn all() -> &'static [CameraProfile] {
        PROFILES
    }

    pub fn find(name: &str) -> Option<&'static CameraProfile> {
        PROFILES.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Finds the profile for the camera named by `Exif.Image.Make` and
    /// `Exif.Image.Model`.
    ///
    /// Vendors disagree on whether the model repeats the make, so both the
    /// bare model and `"<first word of make> <model>"` are tried.
    pub fn detect<M: MetadataProvider>(metadata: &M) -> Result<Option<&'static CameraProfile>> {
        let Some(model) = metadata.get_string_opt(keys::MODEL)? else {
            return Ok(None);
        };
        if let Some(profile) = Self::find(&model) {
            return Ok(Some(profile));
        }

        let make = metadata.get_string_opt(keys::MAKE)?.unwrap_or_default();
        Ok(make
            .split_whitespace()
            .next()
            .and_then(|vendor| Self::find(&format!("{vendor} {}", model.trim()))))
    }

    pub fn xyz_to_camera(&self) -> [[f64; 3]; 3] {
        let c = self.xyz_to_camera.map(|v| v as f64 / 10000.0);
        [[c[0], c[1], c[2]], [c[3], c[4], c[5]], [c[6], c[7], c[8]]]
    }

    pub fn conversion(&self) -> Option<ColorConversion> {
        ColorConversion::from_xyz_to_camera(self.xyz_to_camera())
    }
}
