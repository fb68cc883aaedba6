use std::f32::consts::TAU;

use cgmath::Rad;

/// Continuous rotation about X and Y by a fixed increment per frame.
///
/// Angles are kept in `[0, 2π)`; the wrap is invisible in the resulting rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    angle_x: f32,
    angle_y: f32,
    speed_x: f32,
    speed_y: f32,
}

impl Spin {
    pub fn new(speed_x: f32, speed_y: f32) -> Self {
        Self {
            angle_x: 0.0,
            angle_y: 0.0,
            speed_x,
            speed_y,
        }
    }

    /// One frame's worth of rotation.
    pub fn advance(&mut self) {
        self.angle_x = (self.angle_x + self.speed_x).rem_euclid(TAU);
        self.angle_y = (self.angle_y + self.speed_y).rem_euclid(TAU);
    }

    pub fn angles(&self) -> (Rad<f32>, Rad<f32>) {
        (Rad(self.angle_x), Rad(self.angle_y))
    }

    /// X-then-Y Euler rotation as a quaternion.
    pub fn rotation(&self) -> cgmath::Quaternion<f32> {
        cgmath::Quaternion::from(cgmath::Euler {
            x: Rad(self.angle_x),
            y: Rad(self.angle_y),
            z: Rad(0.0),
        })
    }
}
