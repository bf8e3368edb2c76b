#![allow(dead_code)]
//! Small vector/angle helpers shared by the build and runtime paths.
//!
//! Conventions: Z is up, yaw is a rotation about +Z in degrees, the ground
//! plane is XY. Facing angles are signed yaw deltas normalized to (-180, 180].

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared length of the XY (ground plane) projection.
    #[inline]
    pub fn length_squared_2d(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn dist_squared(self, other: Vec3) -> f32 {
        (self - other).length_squared()
    }

    #[inline]
    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Unit vector, or zero when the length is negligible.
    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len2 = self.length_squared();
        if len2 <= 1e-12 {
            return Vec3::ZERO;
        }
        self * len2.sqrt().recip()
    }

    /// Rotate about +Z by `degrees` (counterclockwise looking down the axis).
    pub fn rotate_yaw(self, degrees: f32) -> Vec3 {
        let r = degrees.to_radians();
        let (s, c) = r.sin_cos();
        Vec3 {
            x: self.x * c - self.y * s,
            y: self.x * s + self.y * c,
            z: self.z,
        }
    }

    #[inline]
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self) * t
    }
}

impl core::ops::Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl core::ops::Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl core::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl core::ops::Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn square(x: f32) -> f32 {
    x * x
}

/// Wrap an angle in degrees into (-180, 180].
pub fn normalize_angle(degrees: f32) -> f32 {
    let mut a = degrees % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Constant-smoothing step toward a target: moves by a fraction of the
/// remaining distance, clamped so large `dt` never overshoots.
#[inline]
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    current + (target - current) * (dt * speed).clamp(0.0, 1.0)
}

/// Vector variant of [`interp_to`].
#[inline]
pub fn interp_to_vec(current: Vec3, target: Vec3, dt: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 {
        return target;
    }
    current + (target - current) * (dt * speed).clamp(0.0, 1.0)
}

/// Shortest-arc blend between two yaw angles (degrees).
///
/// Interpolates the equivalent rotations about +Z as quaternions with nlerp so
/// a blend from 170 to -170 crosses 180 rather than sweeping through 0.
pub fn yaw_nlerp(a_degrees: f32, b_degrees: f32, t: f32) -> f32 {
    let ha = a_degrees.to_radians() * 0.5;
    let hb = b_degrees.to_radians() * 0.5;
    let (az, aw) = (ha.sin(), ha.cos());
    let (mut bz, mut bw) = (hb.sin(), hb.cos());
    if az * bz + aw * bw < 0.0 {
        bz = -bz;
        bw = -bw;
    }
    let z = lerp(az, bz, t);
    let w = lerp(aw, bw, t);
    (2.0 * z.atan2(w)).to_degrees()
}
