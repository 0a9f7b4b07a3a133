use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 3D vector with f32 components.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const DOWN: Self = Self::new(0.0, -1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const LEFT: Self = Self::new(-1.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);
    pub const BACK: Self = Self::new(0.0, 0.0, -1.0);

    /// Squared length below which two vectors compare equal in [`Float3::approx_eq`].
    pub const APPROX_EQ_SQR: f32 = 1e-10;

    pub fn magnitude(self) -> f32 {
        self.sqr_magnitude().sqrt()
    }

    pub fn sqr_magnitude(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < f32::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / mag)
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).magnitude()
    }

    /// Tolerant equality used for up-vector comparisons.
    pub fn approx_eq(self, other: Self) -> bool {
        (self - other).sqr_magnitude() < Self::APPROX_EQ_SQR
    }

    /// True when this vector is not the world up axis.
    pub fn is_custom_up(self) -> bool {
        !self.approx_eq(Self::UP)
    }

    /// Same vector with the vertical component removed.
    pub fn flattened(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Snaps to the signed world axis of the first component whose magnitude exceeds 0.5.
    /// Vectors with no dominant component are returned unchanged.
    pub fn snap_to_axis(self) -> Self {
        if self.x.abs() > 0.5 {
            Self::new(self.x.signum(), 0.0, 0.0)
        } else if self.y.abs() > 0.5 {
            Self::new(0.0, self.y.signum(), 0.0)
        } else if self.z.abs() > 0.5 {
            Self::new(0.0, 0.0, self.z.signum())
        } else {
            self
        }
    }
}

impl Add for Float3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Float3 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Float3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl SubAssign for Float3 {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul<f32> for Float3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Float3> for f32 {
    type Output = Float3;
    fn mul(self, v: Float3) -> Float3 {
        v * self
    }
}

impl Div<f32> for Float3 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Float3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Default for Float3 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Unit quaternion for 3D rotations.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub fn from_axis_angle(axis: Float3, angle: f32) -> Self {
        let half_angle = angle * 0.5;
        let s = half_angle.sin();
        let c = half_angle.cos();
        let normalized = axis.normalize();

        Self::new(normalized.x * s, normalized.y * s, normalized.z * s, c)
    }

    /// Rotation of `degrees` about `axis`. Banking angles are authored in degrees.
    pub fn from_axis_degrees(axis: Float3, degrees: f32) -> Self {
        Self::from_axis_angle(axis, degrees.to_radians())
    }

    /// Rotation taking local +Z onto `forward` and local +Y as close as possible to `up`.
    ///
    /// Returns identity when `forward` is zero; falls back to world up when `up`
    /// is parallel to `forward`.
    pub fn look_rotation(forward: Float3, up: Float3) -> Self {
        let z = forward.normalize();
        if z == Float3::ZERO {
            return Self::IDENTITY;
        }
        let mut x = up.cross(z).normalize();
        if x == Float3::ZERO {
            let fallback = if z.y.abs() < 0.999 {
                Float3::UP
            } else {
                Float3::FORWARD
            };
            x = fallback.cross(z).normalize();
        }
        let y = z.cross(x);
        Matrix3::from_columns(x, y, z).to_quaternion()
    }

    pub fn mul_vec(self, v: Float3) -> Float3 {
        let qv = Float3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * (2.0 * self.w)) + (uuv * 2.0)
    }
}

impl Mul for Quaternion {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Self::new(
            self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 3x3 matrix stored as three column vectors.
/// Used for rotation transformations.
#[derive(Debug, Clone, Copy)]
pub struct Matrix3 {
    pub c0: Float3,
    pub c1: Float3,
    pub c2: Float3,
}

impl Matrix3 {
    pub fn from_columns(c0: Float3, c1: Float3, c2: Float3) -> Self {
        Self { c0, c1, c2 }
    }

    /// Converts an orthonormal rotation matrix to a quaternion (Shepperd's method).
    pub fn to_quaternion(&self) -> Quaternion {
        let (m00, m01, m02) = (self.c0.x, self.c1.x, self.c2.x);
        let (m10, m11, m12) = (self.c0.y, self.c1.y, self.c2.y);
        let (m20, m21, m22) = (self.c0.z, self.c1.z, self.c2.z);

        let trace = m00 + m11 + m22;
        if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quaternion::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Quaternion::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Quaternion::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Quaternion::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        }
    }
}
