use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use softbuffer::Surface;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::prefetch::PrefetchSignal;
use crate::session::ViewerSession;
use crate::transform::{Matrix, Rect, ZoomMode};

pub mod render;

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    session: Arc<ViewerSession>,
    prefetch: Arc<PrefetchSignal>,
    zoom: ZoomMode,
    mark_output: Option<PathBuf>,

    window: Option<Arc<Window>>,
    // Kept alive for the surface; never read directly.
    _context: Option<softbuffer::Context<Arc<Window>>>,
    surface: Option<Surface<Arc<Window>, Arc<Window>>>,

    pan: (f32, f32),
    dragging: bool,
    drag_start: (f64, f64),
    drag_pan_start: (f32, f32),
    mouse_pos: (f64, f64),
    is_fullscreen: bool,

    /// When the next animation frame of the current GIF is due.
    next_frame_at: Option<Instant>,
}

impl App {
    pub fn new(
        session: Arc<ViewerSession>,
        prefetch: Arc<PrefetchSignal>,
        mark_output: Option<PathBuf>,
    ) -> Self {
        Self {
            session,
            prefetch,
            zoom: ZoomMode::ShrinkToFit,
            mark_output,
            window: None,
            _context: None,
            surface: None,
            pan: (0.0, 0.0),
            dragging: false,
            drag_start: (0.0, 0.0),
            drag_pan_start: (0.0, 0.0),
            mouse_pos: (0.0, 0.0),
            is_fullscreen: false,
            next_frame_at: None,
        }
    }

    fn title(&self) -> String {
        let files = self.session.files_snapshot();
        if files.is_empty() {
            return format!("piv - {}", crate::session::NO_IMAGES);
        }
        let index = self.session.current_index();
        let name = files
            .get(index)
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(
            "piv - {} [{}/{}] ({})",
            name,
            index + 1,
            files.len(),
            self.zoom.label()
        )
    }

    /// Post-navigation housekeeping: reset view state, wake the
    /// prefetcher, refresh title and schedule a repaint.
    fn after_navigation(&mut self) {
        self.pan = (0.0, 0.0);
        self.next_frame_at = None;
        self.prefetch.wake();
        self.refresh();
    }

    fn refresh(&mut self) {
        if let Some(ref window) = self.window {
            window.set_title(&self.title());
            window.request_redraw();
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: &Key) {
        match key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Named(NamedKey::ArrowRight) | Key::Named(NamedKey::Space) => {
                self.session.next();
                self.after_navigation();
            }
            Key::Named(NamedKey::ArrowLeft) => {
                self.session.previous();
                self.after_navigation();
            }
            Key::Named(NamedKey::Home) => {
                self.session.first();
                self.after_navigation();
            }
            Key::Named(NamedKey::End) => {
                self.session.last();
                self.after_navigation();
            }
            Key::Named(NamedKey::Delete) => {
                self.session.delete_current();
                self.after_navigation();
            }
            Key::Character(s) => match s.as_str() {
                "q" => event_loop.exit(),
                "l" => {
                    self.session.next();
                    self.after_navigation();
                }
                "h" => {
                    self.session.previous();
                    self.after_navigation();
                }
                "z" => {
                    self.zoom = self.zoom.cycle();
                    self.pan = (0.0, 0.0);
                    self.refresh();
                }
                ch @ ("," | ".") => {
                    let clockwise = ch == ".";
                    if let Err(e) = self.session.rotate_current(clockwise) {
                        log::error!("{e}");
                    }
                    self.after_navigation();
                }
                "m" => self.session.mark_current(self.mark_output.as_deref()),
                "i" => println!("{}", self.session.info_snapshot()),
                "r" => {
                    self.session.rescan();
                    self.after_navigation();
                }
                "R" => {
                    let recursive = self.session.toggle_recursive();
                    log::info!("recursive scan: {}", recursive);
                    self.after_navigation();
                }
                "f" => {
                    self.is_fullscreen = !self.is_fullscreen;
                    if let Some(ref window) = self.window {
                        window.set_fullscreen(
                            self.is_fullscreen.then(|| Fullscreen::Borderless(None)),
                        );
                    }
                    self.pan = (0.0, 0.0);
                    self.refresh();
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn draw(&mut self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let size = window.inner_size();
        let fb_w = size.width.max(1);
        let fb_h = size.height.max(1);

        let Some(ref mut surface) = self.surface else {
            return;
        };
        let Ok(mut buffer) = surface.buffer_mut() else {
            return;
        };

        render::draw_checkerboard(&mut buffer, fb_w, fb_h);

        let viewport = Rect::new(0.0, 0.0, fb_w as f32, fb_h as f32);
        let frame = self.session.get_display_frame(viewport, self.zoom);
        if let Some(ref image) = frame.image {
            let pixels = image.frame(frame.frame_index);
            let matrix = Matrix::translate(self.pan.0, self.pan.1).mul(&frame.matrix);
            render::blit_oriented(
                &mut buffer,
                fb_w,
                fb_h,
                &pixels.rgba,
                image.width,
                image.height,
                frame.rect,
                &matrix,
            );

            if image.is_animated() && self.next_frame_at.is_none() {
                let delay = pixels.delay_ms.max(10);
                self.next_frame_at = Some(Instant::now() + Duration::from_millis(delay));
            }
        }

        let _ = buffer.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(self.title())
            .with_inner_size(LogicalSize::new(1280u32, 720u32));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        let context = softbuffer::Context::new(Arc::clone(&window)).expect("create context");
        let surface = Surface::new(&context, Arc::clone(&window)).expect("create surface");

        window.request_redraw();
        self.window = Some(window);
        self._context = Some(context);
        self.surface = Some(surface);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                let w = width.max(1);
                let h = height.max(1);
                if let Some(ref mut surface) = self.surface {
                    let _ = surface.resize(
                        std::num::NonZeroU32::new(w).unwrap(),
                        std::num::NonZeroU32::new(h).unwrap(),
                    );
                }
                if let Some(ref window) = self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    let key = event.logical_key.clone();
                    self.handle_key(event_loop, &key);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    if state == ElementState::Pressed {
                        self.dragging = true;
                        self.drag_start = self.mouse_pos;
                        self.drag_pan_start = self.pan;
                    } else {
                        self.dragging = false;
                    }
                }
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                self.mouse_pos = (x, y);
                if self.dragging {
                    self.pan = (
                        self.drag_pan_start.0 + (x as f32 - self.drag_start.0 as f32),
                        self.drag_pan_start.1 + (y as f32 - self.drag_start.1 as f32),
                    );
                    if let Some(ref window) = self.window {
                        window.request_redraw();
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.draw();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(when) = self.next_frame_at {
            let now = Instant::now();
            if now >= when {
                self.next_frame_at = self
                    .session
                    .advance_frame()
                    .map(|delay| now + Duration::from_millis(delay.max(10)));
                if let Some(ref window) = self.window {
                    window.request_redraw();
                }
            } else {
                event_loop.set_control_flow(ControlFlow::WaitUntil(when));
            }
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}
