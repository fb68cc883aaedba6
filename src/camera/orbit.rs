//! Orbit navigation: rotate, pan and zoom a camera around its target.
//!
//! Pointer input only accumulates motion. Nothing moves until
//! [`OrbitController::update`] runs, which the render loop does once per
//! frame. With damping enabled each update applies `damping_factor` of the
//! pending motion and keeps the rest, so the camera glides to a stop.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Rad, Vector3, Zero};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::{camera::Camera, config::OrbitConfig};

const EPS: f32 = 1e-6;
/// Logical pixels per wheel "line" for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    None,
    Rotate,
    Pan,
}

/// Radius, polar angle `phi` (from +Y) and azimuth `theta` (from +Z towards +X).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius < EPS {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Clone, Debug)]
pub struct OrbitController {
    config: OrbitConfig,
    // window height in the pixels cursor positions are reported in
    viewport_height: f32,
    scale_factor: f64,
    drag: Drag,
    cursor: Option<PhysicalPosition<f64>>,
    // pending motion, consumed by `update`
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
    // pointer movement not yet converted into a pan; needs the camera pose
    pending_pan: (f32, f32),
}

impl OrbitController {
    pub fn new(config: OrbitConfig, viewport_height: u32) -> Self {
        Self {
            config,
            viewport_height: viewport_height.max(1) as f32,
            scale_factor: 1.0,
            drag: Drag::None,
            cursor: None,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zero(),
            pending_pan: (0.0, 0.0),
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    /// Device pixels per logical pixel, for wheels reporting pixel deltas.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    /// Whether any motion is still waiting to be applied.
    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < EPS
            && self.delta_phi.abs() < EPS
            && (self.scale - 1.0).abs() < EPS
            && self.pan_offset.magnitude2() < EPS * EPS
            && self.pending_pan == (0.0, 0.0)
    }

    /// Turn around the target: positive `angle` moves the camera to the left.
    pub fn rotate_left(&mut self, angle: Rad<f32>) {
        self.delta_theta -= angle.0;
    }

    /// Tilt over the target: positive `angle` moves the camera upwards.
    pub fn rotate_up(&mut self, angle: Rad<f32>) {
        self.delta_phi -= angle.0;
    }

    /// Move towards the target by `factor` (< 1 zooms in, > 1 zooms out).
    pub fn dolly(&mut self, factor: f32) {
        if factor > 0.0 && factor.is_finite() {
            self.scale *= factor;
        }
    }

    /// Shift camera and target by a pointer movement in pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pending_pan.0 += dx;
        self.pending_pan.1 += dy;
    }

    /// Turn a pointer drag in pixels into a rotation; a drag across the full
    /// viewport height turns by one revolution.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32) {
        let speed = self.config.rotate_speed;
        self.rotate_left(Rad(TAU * dx / self.viewport_height * speed));
        self.rotate_up(Rad(TAU * dy / self.viewport_height * speed));
    }

    /// One wheel notch scales the distance by `0.95^zoom_speed`.
    pub fn zoom_by_lines(&mut self, lines: f32) {
        let step = 0.95_f32.powf(self.config.zoom_speed);
        self.dolly(step.powf(lines));
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) => Drag::Rotate,
                    (ElementState::Pressed, MouseButton::Right) => Drag::Pan,
                    (ElementState::Pressed, _) => return false,
                    (ElementState::Released, _) => Drag::None,
                };
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                let Some(previous) = previous else {
                    return false;
                };
                let dx = (position.x - previous.x) as f32;
                let dy = (position.y - previous.y) as f32;
                match self.drag {
                    Drag::Rotate => self.rotate_by_pixels(dx, dy),
                    Drag::Pan => self.pan(dx, dy),
                    Drag::None => return false,
                }
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = Drag::None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => {
                        (pos.y / self.scale_factor / PIXELS_PER_LINE) as f32
                    }
                };
                self.zoom_by_lines(lines);
                true
            }
            _ => false,
        }
    }

    /// Apply pending motion to `camera`; returns whether it moved.
    pub fn update(&mut self, camera: &mut Camera, fovy: Rad<f32>) -> bool {
        if self.is_settled() {
            return false;
        }
        let offset = camera.position - camera.target;
        self.resolve_pan(camera, offset.magnitude(), fovy);

        let damping = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };

        let mut spherical = Spherical::from_offset(offset);
        spherical.theta += self.delta_theta * damping;
        spherical.phi = (spherical.phi + self.delta_phi * damping).clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        let pan = self.pan_offset * damping;
        let target = camera.target + pan;
        let position = target + spherical.to_offset();

        if self.config.enable_damping {
            self.delta_theta *= 1.0 - damping;
            self.delta_phi *= 1.0 - damping;
            self.pan_offset *= 1.0 - damping;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        let moved = (position - camera.position).magnitude2() > EPS * EPS
            || (target - camera.target).magnitude2() > EPS * EPS;
        camera.target = target;
        camera.position = position;
        moved
    }

    /// Screen-space pan into a world-space offset in the camera's view plane,
    /// scaled so the target point follows the pointer.
    fn resolve_pan(&mut self, camera: &Camera, distance: f32, fovy: Rad<f32>) {
        let (dx, dy) = std::mem::take(&mut self.pending_pan);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let forward = (camera.target - camera.position).normalize();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward);
        let target_distance = distance * (fovy.0 / 2.0).tan();
        let speed = self.config.pan_speed;
        let left = -right * (2.0 * dx * target_distance / self.viewport_height * speed);
        let upward = up * (2.0 * dy * target_distance / self.viewport_height * speed);
        self.pan_offset += left + upward;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn spherical_offsets_survive_conversion() {
        let offset = Vector3::new(3.0, 4.0, 5.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).magnitude() < 1e-4);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let config = OrbitConfig {
            enable_damping: false,
            ..Default::default()
        };
        let mut controller = OrbitController::new(config, 600);
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 10.0), Point3::new(0.0, 0.0, 0.0));
        controller.pan(100.0, 0.0);
        assert!(controller.update(&mut camera, Rad(1.0)));
        assert!(camera.target.x < 0.0);
        assert!((camera.position.x - camera.target.x).abs() < 1e-4);
        assert!(((camera.position - camera.target).magnitude() - 10.0).abs() < 1e-3);
    }
}
