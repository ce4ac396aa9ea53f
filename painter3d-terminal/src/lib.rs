/// Terminal front-end: a character-cell drawing surface driven by a trackball camera
use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, terminal,
};
use painter3d_core::{Camera, InteractionEvent, PointerButton, ScrollDirection};
use std::cell::RefCell;
use std::io::{stdout, Write};
use std::rc::Rc;
use std::time::Duration;

pub mod renderer;
pub mod scenes;

pub use renderer::TerminalSurface;
pub use scenes::{Scene, SharedRenderer};

/// View-space distance covered by one arrow key press
const KEY_STEP: f32 = 0.1;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    camera: Camera,
    surface: Rc<RefCell<TerminalSurface>>,
    /// Kept alive here; the camera only holds weak references
    renderers: Vec<SharedRenderer>,
    running: bool,
}

impl TerminalApp {
    pub fn new(scene: &Scene) -> anyhow::Result<Self> {
        let (width, height) = terminal::size().context("failed to query the terminal size")?;
        let surface = Rc::new(RefCell::new(TerminalSurface::new(width as usize, height as usize)));

        let mut camera = scene.camera();
        let renderers = scene.build(&surface, &camera)?;
        for renderer in &renderers {
            camera.attach(renderer);
        }
        camera.connect(&surface);
        log::debug!("{scene:?}: {} renderers on a {width}x{height} terminal", renderers.len());

        Ok(Self {
            camera,
            surface,
            renderers,
            running: true,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        while self.running {
            if self.surface.borrow().is_dirty() {
                self.render()?;
            }
            if event::poll(Duration::from_millis(50))? {
                let event = event::read()?;
                self.handle_input(event);
            }
        }
        Ok(())
    }

    /// Translate a terminal event into camera events.
    ///
    /// No surface borrow may be held across `handle_event`: the camera
    /// re-runs the renderers, which write to the surface.
    fn handle_input(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Left => self.nudge(-KEY_STEP, 0.0),
                KeyCode::Right => self.nudge(KEY_STEP, 0.0),
                KeyCode::Up => self.nudge(0.0, KEY_STEP),
                KeyCode::Down => self.nudge(0.0, -KEY_STEP),
                KeyCode::Char('+') => {
                    self.camera.handle_event(InteractionEvent::Scroll(ScrollDirection::Up));
                }
                KeyCode::Char('-') => {
                    self.camera.handle_event(InteractionEvent::Scroll(ScrollDirection::Down));
                }
                _ => {}
            },
            Event::Mouse(MouseEvent { kind, column, row, .. }) => {
                let p = self.surface.borrow().cell_to_view(column, row);
                let event = match kind {
                    MouseEventKind::Down(button) => InteractionEvent::Press {
                        button: pointer_button(button),
                        x: p.x,
                        y: p.y,
                    },
                    MouseEventKind::Drag(_) => InteractionEvent::Drag { x: p.x, y: p.y },
                    MouseEventKind::Up(_) => InteractionEvent::Release,
                    MouseEventKind::ScrollUp => InteractionEvent::Scroll(ScrollDirection::Up),
                    MouseEventKind::ScrollDown => InteractionEvent::Scroll(ScrollDirection::Down),
                    _ => return,
                };
                self.camera.handle_event(event);
            }
            Event::Resize(width, height) => {
                self.surface.borrow_mut().resize(width as usize, height as usize);
            }
            _ => {}
        }
    }

    /// A short synthetic drag from the center
    fn nudge(&mut self, dx: f32, dy: f32) {
        let camera = &mut self.camera;
        camera.handle_event(InteractionEvent::Press {
            button: PointerButton::Left,
            x: 0.0,
            y: 0.0,
        });
        camera.handle_event(InteractionEvent::Drag { x: dx, y: dy });
        camera.handle_event(InteractionEvent::Release);
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let mut stdout = stdout();
        self.surface.borrow_mut().draw(&mut stdout)?;
        stdout.flush()?;
        log::trace!("frame drawn, {} renderers, {}", self.renderers.len(), self.camera.status_text());
        Ok(())
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Right => PointerButton::Right,
    }
}
