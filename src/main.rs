use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use vitrine::choreographer::{self, SETTLE_DISTANCE};
use vitrine::{
    nav_action, Catalog, Choreographer, GlideRig, Layout, NavAction, Pose, Renderer,
    ShowcaseState, StaticViewport, ViewportProvider, WindowViewport, DEFAULT_SETTLE_DELAY,
    FOV_Y_DEGREES,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let manifest = options.dir.join("showcase.xml");
    let xml = fs::read_to_string(&manifest)
        .with_context(|| format!("failed to read {}", manifest.display()))?;
    let catalog = Catalog::from_xml(&xml).context("failed to parse showcase XML")?;

    println!("Loaded showcase with {} items", catalog.len());
    for item in catalog.items() {
        println!(" - {}", item.name);
    }

    let state = ShowcaseState::new(catalog.len());

    if options.summary_only {
        run_headless(&catalog, &state, &options)
    } else {
        match run_interactive(catalog.clone(), state.clone(), options.clone()) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some() {
                    eprintln!(
                        "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                    );
                    run_headless(&catalog, &state, &options)
                } else {
                    Err(err)
                }
            }
        }
    }
}

/// Walks the full choreography without a window: lays the lane out for a
/// nominal viewport, visits every slide with an instant rig and prints where
/// the camera comes to rest.
fn run_headless(catalog: &Catalog, state: &ShowcaseState, options: &CliOptions) -> Result<()> {
    let viewport = StaticViewport::new(1280, 720);
    let (width, height) = viewport.viewport_size();
    let layout = Layout::from_viewport(width, height, FOV_Y_DEGREES, SETTLE_DISTANCE, options.gap);

    println!(
        "Lane layout: span={:.2} gap={:.2} panel_height={:.2}",
        layout.span, layout.gap, layout.view_height
    );
    for (index, item) in catalog.items().iter().enumerate() {
        println!(" - {} at x={:.2}", item.name, layout.offset_x(index));
    }

    let mut choreographer = Choreographer::with_settle_delay(catalog.len(), Duration::ZERO);
    let rig = GlideRig::with_duration(Pose::new(glam::Vec3::ZERO, glam::Vec3::ZERO), Duration::ZERO);
    choreographer.attach_rig(Box::new(rig), state, &layout);

    let mut pump = |choreographer: &mut Choreographer| -> Result<()> {
        for _ in 0..16 {
            choreographer.update(Instant::now(), state, &layout)?;
        }
        Ok(())
    };

    pump(&mut choreographer)?;
    if let Some(pose) = choreographer.pose() {
        println!(
            "Overview camera at ({:.2}, {:.2}, {:.2})",
            pose.eye.x, pose.eye.y, pose.eye.z
        );
    }

    for index in 0..catalog.len() {
        let legs = if index == 0 {
            choreographer::plan_focus(&layout, 0, 0).len()
        } else {
            choreographer::plan_focus(&layout, index - 1, index).len()
        };
        state.select_slide(index)?;
        pump(&mut choreographer)?;
        if let Some(pose) = choreographer.pose() {
            println!(
                "Slide {index}: {legs} legs, camera settles at ({:.2}, {:.2}, {:.2})",
                pose.eye.x, pose.eye.y, pose.eye.z
            );
        }
    }

    Ok(())
}

fn run_interactive(catalog: Catalog, state: ShowcaseState, options: CliOptions) -> Result<()> {
    let event_loop = EventLoop::new()
        .map_err(|err| anyhow!(WindowInitError::from_error("event loop", err)))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(catalog, state, options);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    if let Some(err) = app.last_error.take() {
        return Err(err);
    }
    Ok(())
}

struct App {
    catalog: Catalog,
    state: ShowcaseState,
    options: CliOptions,
    viewport: Arc<WindowViewport>,
    layout: Layout,
    choreographer: Choreographer,
    renderer: Option<Renderer>,
    cursor: (f32, f32),
    last_error: Option<anyhow::Error>,
}

impl App {
    fn new(catalog: Catalog, state: ShowcaseState, options: CliOptions) -> Self {
        let layout = Layout::from_viewport(1280, 720, FOV_Y_DEGREES, SETTLE_DISTANCE, options.gap);
        let choreographer = Choreographer::with_settle_delay(catalog.len(), options.settle_delay);
        Self {
            catalog,
            state,
            options,
            viewport: Arc::new(WindowViewport::new(1280, 720)),
            layout,
            choreographer,
            renderer: None,
            cursor: (0.0, 0.0),
            last_error: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Vitrine")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| anyhow!(WindowInitError::from_error("window", err)))?,
        );

        let size = window.inner_size();
        self.viewport.update(size.width, size.height);
        self.layout = self.layout_for(size.width, size.height);

        let renderer = block_on(Renderer::new(
            Arc::clone(&window),
            &self.catalog,
            &self.layout,
            &self.options.dir,
        ))?;

        let rig = GlideRig::new(Pose::new(glam::Vec3::ZERO, glam::Vec3::ZERO));
        self.choreographer
            .attach_rig(Box::new(rig), &self.state, &self.layout);
        self.renderer = Some(renderer);
        info!("showcase window ready ({} items)", self.catalog.len());
        Ok(())
    }

    fn layout_for(&self, width: u32, height: u32) -> Layout {
        Layout::from_viewport(width, height, FOV_Y_DEGREES, SETTLE_DISTANCE, self.options.gap)
    }

    fn apply_nav(&self, action: NavAction) {
        let result = match action {
            NavAction::NextSlide => self.state.select_next(),
            NavAction::PreviousSlide => self.state.select_previous(),
            NavAction::SelectSlide(index) => {
                if index < self.state.len() {
                    self.state.select_slide(index)
                } else {
                    Ok(()) // digit key beyond the catalog, ignore
                }
            }
            NavAction::GoHome => {
                self.state.go_home();
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!("navigation rejected: {err}");
        }
    }

    fn handle_click(&self) {
        let Some(pose) = self.choreographer.pose() else {
            return;
        };
        let picked = vitrine::picking::pick_marker(
            &pose,
            &self.layout,
            self.catalog.len(),
            self.cursor,
            self.viewport.viewport_size(),
        );
        if let Some(index) = picked {
            if let Err(err) = self.state.request_click(index) {
                warn!("click rejected: {err}");
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self
            .choreographer
            .update(Instant::now(), &self.state, &self.layout)
        {
            error!("choreography: {err}");
        }
        let Some(pose) = self.choreographer.pose() else {
            return;
        };
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if let Err(err) = renderer.render(&pose) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = renderer.window().inner_size();
                    renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    self.last_error = Some(anyhow!("GPU is out of memory"));
                    event_loop.exit();
                }
                other => {
                    info!("surface error: {other}; retrying next frame");
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_none() {
            if let Err(err) = self.init_window(event_loop) {
                self.last_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self
            .renderer
            .as_ref()
            .map_or(true, |renderer| renderer.window_id() != window_id)
        {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.viewport.update(size.width, size.height);
                self.layout = self.layout_for(size.width, size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                    renderer.set_layout(&self.layout);
                }
                // Item positions moved with the span, so the pending initial
                // camera move must be re-planned against the new lane.
                self.choreographer.restart_settle_timer();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if let Some(action) = nav_action(code) {
                            self.apply_nav(action);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if state == ElementState::Pressed && button == MouseButton::Left {
                    self.handle_click();
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.window().request_redraw();
        }
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

#[derive(Debug, Clone)]
struct CliOptions {
    dir: PathBuf,
    summary_only: bool,
    gap: f32,
    settle_delay: Duration,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(dir) = args.next() else {
            return Err(anyhow!(
                "Usage: vitrine <showcase-dir> [--summary-only] [--gap <units>] [--settle-ms <ms>]"
            ));
        };
        let mut summary_only = false;
        let mut gap = 1.0f32;
        let mut settle_delay = DEFAULT_SETTLE_DELAY;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--gap" => {
                    let value = args.next().ok_or_else(|| anyhow!("--gap expects a value"))?;
                    gap = value
                        .parse()
                        .with_context(|| format!("invalid --gap value: {value}"))?;
                    if gap < 0.0 {
                        return Err(anyhow!("--gap must be non-negative"));
                    }
                }
                "--settle-ms" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--settle-ms expects a value"))?;
                    let ms: u64 = value
                        .parse()
                        .with_context(|| format!("invalid --settle-ms value: {value}"))?;
                    settle_delay = Duration::from_millis(ms);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --summary-only, --gap or --settle-ms"
                    ));
                }
            }
        }
        Ok(Self {
            dir: PathBuf::from(dir),
            summary_only,
            gap,
            settle_delay,
        })
    }
}
