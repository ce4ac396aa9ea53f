/// Trackball camera turning pointer gestures into view transforms
///
/// The camera owns a fixed projection and view, a [`Trackball`] for the model
/// orientation and a zoom factor. Renderers subscribe to it and are re-run in
/// subscription order whenever a drag changes the orientation.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use nalgebra::{Matrix4, Point2};

use crate::projection::ProjectionMode;
use crate::render::Renderer;
use crate::trackball::Trackball;
use crate::transform::Transform;

/// Projection and zoom parameters of a [`Camera`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees (perspective only)
    pub aperture: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the eye to the scene origin
    pub distance: f32,
    pub zoom: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// Relative zoom change per scroll step
    pub zoom_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            aperture: 35.0,
            aspect: 1.0,
            near: 1.0,
            far: 100.0,
            distance: 3.0,
            zoom: 1.0,
            zoom_min: 0.1,
            zoom_max: 5.0,
            zoom_step: 0.1,
        }
    }
}

impl CameraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aperture(mut self, degrees: f32) -> Self {
        self.aperture = degrees;
        self
    }

    pub fn aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    pub fn zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Zoom range; the bounds may be given in either order
    pub fn zoom_limits(mut self, min: f32, max: f32) -> Self {
        self.zoom_min = min.min(max);
        self.zoom_max = min.max(max);
        self
    }

    pub fn zoom_step(mut self, step: f32) -> Self {
        self.zoom_step = step;
        self
    }

    fn projection(&self, mode: ProjectionMode) -> Matrix4<f32> {
        match mode {
            ProjectionMode::Perspective => Transform::perspective(self.aperture, self.aspect, self.near, self.far),
            ProjectionMode::Orthographic => Transform::ortho(-1.0, 1.0, -1.0, 1.0, self.near, self.far),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Zoom in
    Up,
    /// Zoom out
    Down,
}

/// Pointer input, in interaction-area coordinates ([-1, 1] on both axes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    Press { button: PointerButton, x: f32, y: f32 },
    Release,
    Drag { x: f32, y: f32 },
    Scroll(ScrollDirection),
}

/// The surface a camera reports back to while it is connected
pub trait InteractionSurface {
    /// Half-width of the visible region around the origin
    fn set_extent(&mut self, extent: f32);

    fn set_status(&mut self, status: &str);

    fn request_redraw(&mut self);
}

/// Handle returned by [`Camera::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Matrix4<f32>)>;

#[derive(Debug, Clone, Copy)]
struct Press {
    button: PointerButton,
    position: Point2<f32>,
}

pub struct Camera {
    mode: ProjectionMode,
    config: CameraConfig,
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    trackball: Trackball,
    transform: Matrix4<f32>,
    zoom: f32,
    press: Option<Press>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    surface: Option<Weak<RefCell<dyn InteractionSurface>>>,
}

impl Camera {
    /// Camera looking at the origin, seeded with `theta`/`phi` degrees of
    /// trackball rotation and scaling the scene by `scale`.
    pub fn new(mode: ProjectionMode, theta: f32, phi: f32, scale: f32) -> Self {
        Self::with_config(mode, theta, phi, scale, CameraConfig::default())
    }

    pub fn with_config(mode: ProjectionMode, theta: f32, phi: f32, scale: f32, config: CameraConfig) -> Self {
        let projection = config.projection(mode);
        let view = Transform::translate(0.0, 0.0, -config.distance) * Transform::uniform_scale(scale);
        let trackball = Trackball::new(theta, phi);
        let transform = projection * view * trackball.model();
        Self {
            mode,
            config,
            projection,
            view,
            trackball,
            transform,
            zoom: config.zoom.max(config.zoom_min).min(config.zoom_max),
            press: None,
            listeners: Vec::new(),
            next_id: 0,
            surface: None,
        }
    }

    /// Projection x view x orientation
    pub fn transform(&self) -> Matrix4<f32> {
        self.transform
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn trackball(&self) -> &Trackball {
        &self.trackball
    }

    pub fn is_connected(&self) -> bool {
        self.surface.is_some()
    }

    pub fn status_text(&self) -> String {
        format!("Θ : {:.1}, ɸ: {:.1}", self.trackball.theta(), self.trackball.phi())
    }

    /// Register a callback run with the new transform after every rotation
    pub fn subscribe(&mut self, listener: impl FnMut(&Matrix4<f32>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Subscribe a renderer; it is updated while it is alive and skipped once dropped
    pub fn attach<R: Renderer + ?Sized + 'static>(&mut self, renderer: &Rc<RefCell<R>>) -> SubscriptionId {
        let renderer = Rc::downgrade(renderer);
        self.subscribe(move |transform| {
            if let Some(renderer) = renderer.upgrade() {
                renderer.borrow_mut().update(transform);
            }
        })
    }

    /// Remove a listener; returns whether it was subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    /// Bind the camera to an interaction surface and enable event handling
    pub fn connect<S: InteractionSurface + 'static>(&mut self, surface: &Rc<RefCell<S>>) {
        {
            let mut surface = surface.borrow_mut();
            surface.set_extent(self.zoom);
            surface.set_status(&self.status_text());
        }
        let surface: Rc<RefCell<dyn InteractionSurface>> = surface.clone();
        self.surface = Some(Rc::downgrade(&surface));
        log::debug!("camera connected, zoom {:.2}, {}", self.zoom, self.status_text());
    }

    /// Drop the surface, every subscription and any pending press
    pub fn disconnect(&mut self) {
        self.surface = None;
        self.listeners.clear();
        self.press = None;
        log::debug!("camera disconnected");
    }

    /// Process one pointer event; returns whether the view changed.
    ///
    /// Events are ignored while the camera is not connected.
    pub fn handle_event(&mut self, event: InteractionEvent) -> bool {
        let Some(surface) = self.surface.as_ref().and_then(Weak::upgrade) else {
            return false;
        };

        match event {
            InteractionEvent::Press { button, x, y } => {
                self.press = Some(Press {
                    button,
                    position: Point2::new(x, y),
                });
                false
            }
            InteractionEvent::Release => {
                self.press = None;
                false
            }
            InteractionEvent::Drag { x, y } => {
                let Some(press) = self.press.as_mut() else {
                    return false;
                };
                let (dx, dy) = (x - press.position.x, y - press.position.y);
                press.position = Point2::new(x, y);
                log::trace!("{:?} drag by ({dx:.3}, {dy:.3})", press.button);

                self.trackball.drag_to(x, y, dx, dy);
                self.transform = self.projection * self.view * self.trackball.model();
                for (_, listener) in self.listeners.iter_mut() {
                    listener(&self.transform);
                }

                let status = self.status_text();
                let mut surface = surface.borrow_mut();
                surface.set_status(&status);
                surface.request_redraw();
                true
            }
            InteractionEvent::Scroll(direction) => {
                let config = &self.config;
                self.zoom = match direction {
                    ScrollDirection::Up => (self.zoom * (1.0 - config.zoom_step)).max(config.zoom_min),
                    ScrollDirection::Down => (self.zoom * (1.0 + config.zoom_step)).min(config.zoom_max),
                };
                log::debug!("zoom {:.3}", self.zoom);

                let mut surface = surface.borrow_mut();
                surface.set_extent(self.zoom);
                surface.request_redraw();
                true
            }
        }
    }
}
