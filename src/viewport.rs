//! Drawing-surface dimensions as the resize handler sees them.

use winit::dpi::PhysicalSize;

/// Device pixel ratio actually used to size the surface: the host's ratio,
/// capped at `max`. Unusable host values count as 1.
pub fn clamp_pixel_ratio(host: f64, max: f64) -> f64 {
    let host = if host.is_finite() && host > 0.0 { host } else { 1.0 };
    host.min(max)
}

/// A window's drawing area in device pixels, the host's scale factor and the
/// pixel ratio the surface renders at.
///
/// The surface matches the window pixel for pixel unless the host ratio is
/// above the cap; only then is it scaled down to `pixel_ratio`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub physical_width: u32,
    pub physical_height: u32,
    /// Device pixels per logical pixel reported by the host.
    pub scale_factor: f64,
    /// `scale_factor` capped at the stage's maximum.
    pub pixel_ratio: f64,
}

impl Viewport {
    /// From a logical size and the host's pixel ratio.
    pub fn new(width: u32, height: u32, host_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let scale_factor = clamp_pixel_ratio(host_pixel_ratio, f64::INFINITY);
        let physical = |v: u32| (v as f64 * scale_factor).round() as u32;
        Self::from_physical(
            PhysicalSize::new(physical(width), physical(height)),
            scale_factor,
            max_pixel_ratio,
        )
    }

    /// From a window's physical size and scale factor.
    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64, max_pixel_ratio: f64) -> Self {
        let scale_factor = clamp_pixel_ratio(scale_factor, f64::INFINITY);
        Self {
            physical_width: size.width,
            physical_height: size.height,
            scale_factor,
            pixel_ratio: clamp_pixel_ratio(scale_factor, max_pixel_ratio),
        }
    }

    /// The same window with the pixel ratio capped at `max_pixel_ratio`.
    pub fn clamped(self, max_pixel_ratio: f64) -> Self {
        Self {
            pixel_ratio: clamp_pixel_ratio(self.scale_factor, max_pixel_ratio),
            ..self
        }
    }

    /// Logical width, rounded.
    pub fn width(&self) -> u32 {
        (self.physical_width as f64 / self.scale_factor).round() as u32
    }

    /// Logical height, rounded.
    pub fn height(&self) -> u32 {
        (self.physical_height as f64 / self.scale_factor).round() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.physical_width == 0 || self.physical_height == 0
    }

    /// Width over height of the surface the frame is drawn to.
    pub fn aspect(&self) -> f32 {
        let (width, height) = self.surface_size();
        width as f32 / height as f32
    }

    /// Surface size in physical pixels, never smaller than 1x1.
    pub fn surface_size(&self) -> (u32, u32) {
        if self.pixel_ratio >= self.scale_factor {
            return (self.physical_width.max(1), self.physical_height.max(1));
        }
        let ratio = self.pixel_ratio / self.scale_factor;
        let scale = |v: u32| ((v as f64 * ratio).round() as u32).max(1);
        (scale(self.physical_width), scale(self.physical_height))
    }
}

/// Tracks the viewport the stage last applied and filters out resize
/// notifications that would change nothing or collapse the surface.
#[derive(Clone, Debug)]
pub struct ResizeHandler {
    max_pixel_ratio: f64,
    current: Viewport,
}

impl ResizeHandler {
    pub fn new(initial: Viewport, max_pixel_ratio: f64) -> Self {
        Self {
            max_pixel_ratio,
            current: initial.clamped(max_pixel_ratio),
        }
    }

    pub fn current(&self) -> Viewport {
        self.current
    }

    pub fn max_pixel_ratio(&self) -> f64 {
        self.max_pixel_ratio
    }

    /// Accept `viewport` if it differs from the current one and has an area.
    /// The pixel ratio is clamped before comparing.
    pub fn apply(&mut self, viewport: Viewport) -> Option<Viewport> {
        if viewport.is_empty() {
            log::warn!(
                "ignoring resize to {}x{}",
                viewport.physical_width,
                viewport.physical_height
            );
            return None;
        }
        let viewport = viewport.clamped(self.max_pixel_ratio);
        if viewport == self.current {
            return None;
        }
        log::debug!(
            "resize {}x{} @{} -> {}x{} @{}",
            self.current.physical_width,
            self.current.physical_height,
            self.current.pixel_ratio,
            viewport.physical_width,
            viewport.physical_height,
            viewport.pixel_ratio
        );
        self.current = viewport;
        Some(viewport)
    }

    /// A window reported a new physical size or scale factor.
    pub fn on_physical_resize(
        &mut self,
        size: PhysicalSize<u32>,
        scale_factor: f64,
    ) -> Option<Viewport> {
        self.apply(Viewport::from_physical(
            size,
            scale_factor,
            self.max_pixel_ratio,
        ))
    }
}
