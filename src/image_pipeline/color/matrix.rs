use std::ops::Mul;

/// 3x3 linear colour transform applied to `(r, g, b)` column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    rows: [[f32; 3]; 3],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix::new([
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ]);

    pub const fn new(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    pub fn from_row_major(values: [f32; 9]) -> Self {
        Self::new([
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
            [values[6], values[7], values[8]],
        ])
    }

    pub(crate) fn from_f64(rows: [[f64; 3]; 3]) -> Self {
        Self::new(rows.map(|row| row.map(|v| v as f32)))
    }

    pub(crate) fn to_f64(self) -> [[f64; 3]; 3] {
        self.rows.map(|row| row.map(f64::from))
    }

    pub fn rows(&self) -> [[f32; 3]; 3] {
        self.rows
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn transform(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.rows;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Transforms a 16-bit pixel, rounding and clamping to `[0, 65535]`.
    #[inline]
    pub fn apply(&self, pixel: [u16; 3]) -> [u16; 3] {
        self.transform(pixel.map(f32::from))
            .map(|v| v.round().clamp(0.0, u16::MAX as f32) as u16)
    }

    /// `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<ColorMatrix> {
        invert(self.to_f64()).map(Self::from_f64)
    }
}

impl Mul for ColorMatrix {
    type Output = ColorMatrix;

    fn mul(self, rhs: ColorMatrix) -> ColorMatrix {
        ColorMatrix::from_f64(multiply(&self.to_f64(), &rhs.to_f64()))
    }
}

pub(crate) fn multiply(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

pub(crate) fn invert(m: [[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
    };

    let det = m[0][0] * cofactor(1, 2, 1, 2) - m[0][1] * cofactor(1, 2, 0, 2)
        + m[0][2] * cofactor(1, 2, 0, 1);
    if !det.is_finite() || det.abs() < 1e-12 {
        return None;
    }

    let adjugate = [
        [cofactor(1, 2, 1, 2), -cofactor(0, 2, 1, 2), cofactor(0, 1, 1, 2)],
        [-cofactor(1, 2, 0, 2), cofactor(0, 2, 0, 2), -cofactor(0, 1, 0, 2)],
        [cofactor(1, 2, 0, 1), -cofactor(0, 2, 0, 1), cofactor(0, 1, 0, 1)],
    ];
    Some(adjugate.map(|row| row.map(|v| v / det)))
}
