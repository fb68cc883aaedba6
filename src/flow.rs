//! Render loop and application event loop.
//!
//! The [`RenderLoop`] is an explicit state machine the host drives:
//!
//! ```text
//! Idle --start--> Running --stop--> Stopped --start--> Running
//!   \                 \                 \
//!    +-----------------+-----------------+--teardown--> TornDown
//! ```
//!
//! Frames are only produced while `Running`. Each frame the event loop asks
//! the stage to [`tick`](crate::stage::Stage::tick) and then requests the next
//! redraw, yielding to the windowing system in between; pacing comes from the
//! surface's vsync, with no catch-up for missed refreshes.
//!
//! # Lifecycle
//!
//! 1. [`Launcher::new`] validates the settings and opens the event loop
//! 2. [`Launcher::control`] hands out [`StageControl`]s for the host
//! 3. [`Launcher::run`] creates the window, mounts the stage and starts the loop
//! 4. Closing the window (or [`StageControl::teardown`]) releases the GPU
//!    resources and exits

use std::{fmt::Debug, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{config::StageSettings, stage::Stage};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Created, never started.
    Idle,
    Running,
    Stopped,
    /// Resources released; nothing can restart the loop.
    TornDown,
}

/// Start/stop bookkeeping and frame timing.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
    last_frame: Option<Instant>,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            frames: 0,
            last_frame: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Frames begun since the loop was created.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns whether the loop was started by this call.
    pub fn start(&mut self) -> bool {
        match self.state {
            LoopState::Idle | LoopState::Stopped => {
                log::debug!("render loop {:?} -> Running", self.state);
                self.state = LoopState::Running;
                // The pause is not a frame interval
                self.last_frame = None;
                true
            }
            LoopState::Running => false,
            LoopState::TornDown => {
                log::warn!("cannot start a render loop that was torn down");
                false
            }
        }
    }

    /// Returns whether the loop was stopped by this call.
    pub fn stop(&mut self) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        log::debug!("render loop Running -> Stopped");
        self.state = LoopState::Stopped;
        true
    }

    /// Returns whether this call tore the loop down.
    pub fn teardown(&mut self) -> bool {
        if self.state == LoopState::TornDown {
            return false;
        }
        log::debug!("render loop {:?} -> TornDown", self.state);
        self.state = LoopState::TornDown;
        true
    }

    /// Begin a frame: `None` unless running, otherwise the time since the
    /// previous frame (zero for the first frame after a start).
    pub fn begin_frame(&mut self) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);
        self.frames += 1;
        Some(dt)
    }
}

pub(crate) enum StageEvent {
    #[allow(dead_code)]
    Initialized(Box<Stage>),
    #[allow(dead_code)]
    Failed(String),
    Start,
    Stop,
    Teardown,
}

impl Debug for StageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized(Stage)"),
            Self::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
            Self::Start => f.write_str("Start"),
            Self::Stop => f.write_str("Stop"),
            Self::Teardown => f.write_str("Teardown"),
        }
    }
}

/// Handle for the host to start, stop and tear down a running stage from
/// outside the event loop.
#[derive(Clone, Debug)]
pub struct StageControl {
    proxy: EventLoopProxy<StageEvent>,
}

impl StageControl {
    pub fn start(&self) -> anyhow::Result<()> {
        self.send(StageEvent::Start)
    }

    pub fn stop(&self) -> anyhow::Result<()> {
        self.send(StageEvent::Stop)
    }

    pub fn teardown(&self) -> anyhow::Result<()> {
        self.send(StageEvent::Teardown)
    }

    fn send(&self, event: StageEvent) -> anyhow::Result<()> {
        self.proxy
            .send_event(event)
            .map_err(|_| anyhow::anyhow!("the stage's event loop has already exited"))
    }
}

/// Owns the event loop until [`Launcher::run`] hands it to winit.
pub struct Launcher {
    event_loop: EventLoop<StageEvent>,
    settings: StageSettings,
}

impl Launcher {
    pub fn new(settings: StageSettings) -> anyhow::Result<Self> {
        settings.validate()?;
        let event_loop = EventLoop::with_user_event().build()?;
        Ok(Self {
            event_loop,
            settings,
        })
    }

    pub fn control(&self) -> StageControl {
        StageControl {
            proxy: self.event_loop.create_proxy(),
        }
    }

    /// Run until the window closes or the stage is torn down. Returns the
    /// error that ended the loop early, if any.
    pub fn run(self) -> anyhow::Result<()> {
        let Launcher {
            event_loop,
            settings,
        } = self;
        let mut app = App::new(&event_loop, settings)?;
        event_loop.run_app(&mut app)?;
        match app.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<StageEvent>,
    // Taken once the window exists.
    settings: Option<StageSettings>,
    stage: Option<Stage>,
    render_loop: RenderLoop,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<StageEvent>, settings: StageSettings) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            settings: Some(settings),
            stage: None,
            render_loop: RenderLoop::new(),
            failure: None,
        })
    }

    fn on_initialized(&mut self, mut stage: Stage) {
        // The window may have changed while the GPU was set up
        if let Some(window) = stage.window().cloned() {
            stage.on_physical_resize(window.inner_size(), window.scale_factor());
        }
        if self.render_loop.state() == LoopState::Idle {
            self.render_loop.start();
        }
        if self.render_loop.is_running() {
            stage.request_redraw();
        }
        self.stage = Some(stage);
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("stage failed: {:#}", error);
        self.failure = Some(error);
        self.teardown(event_loop);
    }

    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        self.render_loop.teardown();
        if let Some(stage) = self.stage.take() {
            stage.teardown();
        }
        event_loop.exit();
    }
}

fn window_attributes() -> anyhow::Result<winit::window::WindowAttributes> {
    #[allow(unused_mut)]
    let mut window_attributes = Window::default_attributes().with_title("cube-stage");

    #[cfg(target_arch = "wasm32")]
    {
        use anyhow::Context as _;
        use wasm_bindgen::JsCast;
        use winit::platform::web::WindowAttributesExtWebSys;

        const CANVAS_ID: &str = "canvas";

        let document = web_sys::window()
            .and_then(|window| window.document())
            .context("no document to mount the stage in")?;
        let canvas = document
            .get_element_by_id(CANVAS_ID)
            .with_context(|| format!("no element with id '{}'", CANVAS_ID))?;
        window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
    }

    Ok(window_attributes)
}

impl ApplicationHandler<StageEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Only the first resume mounts
        let Some(settings) = self.settings.take() else {
            return;
        };

        let window = match window_attributes()
            .and_then(|attributes| Ok(event_loop.create_window(attributes)?))
        {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e),
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Stage::mount(window, settings)) {
                Ok(stage) => self.on_initialized(stage),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match Stage::mount(window, settings).await {
                    Ok(stage) => StageEvent::Initialized(Box::new(stage)),
                    Err(e) => StageEvent::Failed(format!("{:#}", e)),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("the event loop exited before the stage was mounted");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: StageEvent) {
        log::debug!("stage event {:?}", event);
        match event {
            StageEvent::Initialized(stage) => self.on_initialized(*stage),
            StageEvent::Failed(reason) => self.fail(event_loop, anyhow::anyhow!(reason)),
            StageEvent::Start => {
                if self.render_loop.start() {
                    if let Some(stage) = &self.stage {
                        stage.request_redraw();
                    }
                }
            }
            StageEvent::Stop => {
                self.render_loop.stop();
            }
            StageEvent::Teardown => self.teardown(event_loop),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            return self.teardown(event_loop);
        }

        let Some(stage) = &mut self.stage else {
            return;
        };
        stage.handle_window_event(&event);

        match event {
            WindowEvent::Resized(size) => {
                let scale_factor = stage.window().map(|w| w.scale_factor()).unwrap_or(1.0);
                stage.on_physical_resize(size, scale_factor);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(size) = stage.window().map(|w| w.inner_size()) {
                    stage.on_physical_resize(size, scale_factor);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(dt) = self.render_loop.begin_frame() else {
                    return;
                };
                match stage.tick(dt) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        stage.reconfigure();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
                stage.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.render_loop.teardown();
        if let Some(stage) = self.stage.take() {
            stage.teardown();
        }
    }
}

/// Install the platform logger, then mount a stage with `settings` and run
/// it until its window closes.
pub fn run(settings: StageSettings) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        // A second mount finds the logger already installed
        let _ = console_log::init_with_level(log::Level::Info);
    }

    Launcher::new(settings)?.run()
}

/// Entry point for the page: mount the `"cube"` or `"room"` stage on the
/// `<canvas id="canvas">` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn mount(mode: &str) -> Result<(), JsValue> {
    let mode: crate::config::SceneMode = mode
        .parse()
        .map_err(|e: anyhow::Error| JsValue::from_str(&e.to_string()))?;
    run(StageSettings::default().with_mode(mode))
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
