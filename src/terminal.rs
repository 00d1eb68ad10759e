// SPDX-License-Identifier: GPL-3.0-only

//! Terminal runtime for the booth screen
//!
//! Owns the UI thread: renders the camera feed with Unicode half-block
//! characters, turns clicks and keys into screen messages, and executes the
//! screen's effects on the camera executor. Completed work comes back over
//! an unbounded channel that the loop drains every iteration.

use crate::app::{BoothScreen, Effect, Message, ScreenState};
use crate::backends::camera::{
    BoundCamera, CameraExecutor, CameraFrame, CameraProvider, CaptureResult,
    ProcessCameraProvider, start_session,
};
use crate::config::Config;
use crate::constants::{timing, ui};
use crate::errors::{CameraError, CaptureError};
use crate::permission::{self, Permission, PermissionRequest, PermissionResult};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

/// Run the booth screen in the terminal
///
/// Returns after the user quits or the screen finishes on its own. Notices
/// still pending at that point (such as a permission refusal) are printed
/// once the terminal is restored.
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = BoothRuntime::new(config).and_then(|runtime| runtime.run(&mut terminal));

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    for notice in result? {
        eprintln!("{}", notice);
    }
    Ok(())
}

/// Work finished on the camera executor
enum Completion {
    Permission(PermissionResult),
    Camera(Result<CameraSession, CameraError>),
    Capture(CaptureResult),
}

/// Provider plus the use cases bound through it
struct CameraSession {
    provider: ProcessCameraProvider,
    bound: BoundCamera,
}

impl CameraSession {
    fn try_get_frame(&mut self) -> Option<CameraFrame> {
        // Non-blocking receive
        self.bound.preview.try_recv().ok()
    }
}

struct BoothRuntime {
    config: Config,
    screen: BoothScreen,
    executor: CameraExecutor,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    session: Option<CameraSession>,
    frame_widget: FrameWidget,
    preview_area: Rect,
    quit: bool,
}

impl BoothRuntime {
    fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let executor = CameraExecutor::new()?;
        let (completions_tx, completions_rx) = unbounded_channel();
        Ok(Self {
            screen: BoothScreen::new(&config),
            frame_widget: FrameWidget::new(config.mirror_preview),
            config,
            executor,
            completions_tx,
            completions_rx,
            session: None,
            preview_area: Rect::default(),
            quit: false,
        })
    }

    fn run(
        mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let status = permission::check_self_permission(Permission::Camera);
        let effects = self.screen.create(status);
        self.execute(effects);

        while !self.quit && !self.screen.is_finished() {
            while let Ok(completion) = self.completions_rx.try_recv() {
                self.complete(completion);
            }

            // Drain all available frames to get the latest
            if let Some(session) = &mut self.session {
                while let Some(frame) = session.try_get_frame() {
                    self.frame_widget.update_frame(frame);
                }
            }

            self.dispatch(Message::Tick(Instant::now()));

            terminal.draw(|f| {
                let area = f.area();
                let preview_area = Rect {
                    height: area.height.saturating_sub(2),
                    ..area
                };
                let toast_area = Rect {
                    y: area.y + area.height.saturating_sub(2),
                    height: area.height.min(1),
                    ..area
                };
                let status_area = Rect {
                    y: area.y + area.height.saturating_sub(1),
                    height: area.height.min(1),
                    ..area
                };
                self.preview_area = preview_area;

                f.render_widget(
                    Preview {
                        frame: &self.frame_widget,
                        state: self.screen.state(),
                    },
                    preview_area,
                );
                f.render_widget(
                    CountdownLabel {
                        text: self.screen.label(),
                    },
                    preview_area,
                );
                f.render_widget(
                    ToastLine {
                        text: self.screen.toast().map(|t| t.text.as_str()),
                    },
                    toast_area,
                );
                let status_message = build_status_message(self.screen.camera_name());
                f.render_widget(
                    StatusBar {
                        message: &status_message,
                    },
                    status_area,
                );
            })?;

            // Handle input with timeout for frame updates
            let timeout = poll_timeout(self.screen.next_tick_due(), Instant::now());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        Ok(self.teardown())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl_c =
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            _ if ctrl_c => self.quit = true,
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.dispatch(Message::PreviewTapped(Instant::now()))
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind == MouseEventKind::Down(MouseButton::Left)
            && self
                .preview_area
                .contains(Position::new(mouse.column, mouse.row))
        {
            self.dispatch(Message::PreviewTapped(Instant::now()));
        }
    }

    fn dispatch(&mut self, message: Message) {
        let effects = self.screen.update(message);
        self.execute(effects);
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Permission(result) => self.dispatch(Message::PermissionResult(result)),
            Completion::Camera(Ok(session)) => {
                let name = session.bound.device.name.clone();
                self.session = Some(session);
                self.dispatch(Message::CameraStarted(Ok(name)));
            }
            Completion::Camera(Err(err)) => self.dispatch(Message::CameraStarted(Err(err))),
            Completion::Capture(result) => self.dispatch(Message::CaptureFinished(result)),
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            debug!(?effect, "Executing effect");
            match effect {
                Effect::RequestPermissions(request) => self.request_permissions(request),
                Effect::StartCamera => self.start_camera(),
                Effect::Capture => self.capture(),
                Effect::Finish => self.quit = true,
            }
        }
    }

    fn request_permissions(&self, request: PermissionRequest) {
        let tx = self.completions_tx.clone();
        self.executor.spawn(async move {
            let result = permission::request_permissions(request).await;
            let _ = tx.send(Completion::Permission(result));
        });
    }

    fn start_camera(&self) {
        let tx = self.completions_tx.clone();
        let config = self.config.clone();
        self.executor.spawn(async move {
            let session = match ProcessCameraProvider::acquire().await {
                Ok(mut provider) => start_session(&mut provider, &config)
                    .map(|bound| CameraSession { provider, bound }),
                Err(err) => Err(err),
            };
            let _ = tx.send(Completion::Camera(session));
        });
    }

    fn capture(&mut self) {
        let Some(session) = &self.session else {
            warn!("Capture requested without a bound camera");
            self.dispatch(Message::CaptureFinished(Err(CaptureError::camera_closed())));
            return;
        };

        let image_capture = session.bound.image_capture.clone();
        let tx = self.completions_tx.clone();
        let queued = self.executor.spawn(async move {
            let _ = tx.send(Completion::Capture(image_capture.take_picture()));
        });
        if !queued {
            self.dispatch(Message::CaptureFinished(Err(CaptureError::camera_closed())));
        }
    }

    /// Tear the screen down
    ///
    /// Returns the pending notices when the screen ended itself; a user quit
    /// returns none.
    fn teardown(&mut self) -> Vec<String> {
        let ended_by_screen = self.screen.is_finished();
        self.screen.update(Message::Destroy);
        self.executor.shutdown();
        if let Some(mut session) = self.session.take() {
            session.provider.unbind_all();
        }
        info!("Booth screen closed");

        if ended_by_screen {
            self.screen.notifications().map(str::to_string).collect()
        } else {
            Vec::new()
        }
    }
}

/// Input wait for one loop iteration, cut short by a due countdown event
fn poll_timeout(next_due: Option<Instant>, now: Instant) -> Duration {
    match next_due {
        Some(due) => due.saturating_duration_since(now).min(timing::UI_POLL_INTERVAL),
        None => timing::UI_POLL_INTERVAL,
    }
}

fn build_status_message(camera_name: Option<&str>) -> String {
    match camera_name {
        Some(name) => format!("{} | {}", name, ui::STATUS_HINT),
        None => ui::STATUS_HINT.to_string(),
    }
}

/// Holds the most recent preview frame
struct FrameWidget {
    frame: Option<CameraFrame>,
    mirror: bool,
}

impl FrameWidget {
    fn new(mirror: bool) -> Self {
        Self {
            frame: None,
            mirror,
        }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }
}

/// Renders the camera frame using half-block characters
struct Preview<'a> {
    frame: &'a FrameWidget,
    state: ScreenState,
}

impl Widget for Preview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame.frame else {
            let msg = match self.state {
                ScreenState::CameraUnavailable => ui::CAMERA_UNAVAILABLE,
                _ => ui::WAITING_FOR_CAMERA,
            };
            render_centered(msg, Style::default(), area, buf);
            return;
        };
        if frame.width == 0 || frame.height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let column = if self.frame.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };
                let src_x = (column as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let (r, g, b) = frame.rgb_at(x, y);
    Color::Rgb(r, g, b)
}

fn render_centered(text: &str, style: Style, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let width = text.chars().count() as u16;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + area.height / 2;
    buf.set_stringn(x, y, text, area.width as usize, style);
}

/// Countdown label drawn over the center of the preview
struct CountdownLabel<'a> {
    text: &'a str,
}

impl Widget for CountdownLabel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.text.is_empty() {
            return;
        }
        let padded = format!("  {}  ", self.text);
        let style = Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD);
        render_centered(&padded, style, area, buf);
    }
}

/// Single line showing the current toast
struct ToastLine<'a> {
    text: Option<&'a str>,
}

impl Widget for ToastLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(text) = self.text else {
            return;
        };
        let style = Style::default().fg(Color::Black).bg(Color::Yellow);
        let padded = format!(" {} ", text);
        let width = (padded.chars().count() as u16).min(area.width);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        buf.set_stringn(x, area.y, &padded, area.width as usize, style);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionStatus;
    use std::sync::Arc;

    fn two_pixel_frame() -> CameraFrame {
        // Left pixel red, right pixel blue
        CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(vec![
                255, 0, 0, 255, 0, 0, 255, 255, //
                255, 0, 0, 255, 0, 0, 255, 255,
            ]),
            stride: 8,
            captured_at: Instant::now(),
        }
    }

    fn render_preview(mirror: bool) -> Buffer {
        let mut widget = FrameWidget::new(mirror);
        widget.update_frame(two_pixel_frame());
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        Preview {
            frame: &widget,
            state: ScreenState::Ready,
        }
        .render(area, &mut buf);
        buf
    }

    #[test]
    fn test_preview_renders_half_blocks() {
        let buf = render_preview(false);
        let left = &buf[(0, 0)];
        assert_eq!(left.symbol(), "▀");
        assert_eq!(left.fg, Color::Rgb(255, 0, 0));
        assert_eq!(buf[(1, 0)].fg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_mirrored_preview_swaps_columns() {
        let buf = render_preview(true);
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(1, 0)].fg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_placeholder_follows_screen_state() {
        let widget = FrameWidget::new(false);
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        Preview {
            frame: &widget,
            state: ScreenState::CameraUnavailable,
        }
        .render(area, &mut buf);

        let line: String = (0..area.width).map(|x| buf[(x, 0)].symbol()).collect();
        assert!(line.contains(ui::CAMERA_UNAVAILABLE));
    }

    #[test]
    fn test_empty_label_draws_nothing() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        CountdownLabel { text: "" }.render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));

        CountdownLabel { text: "3" }.render(area, &mut buf);
        let line: String = (0..area.width).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(line.contains('3'));
    }

    fn denied_result(request_code: i32) -> PermissionResult {
        PermissionResult {
            request_code,
            permissions: vec![Permission::Camera],
            grant_results: vec![PermissionStatus::Denied],
        }
    }

    #[test]
    fn test_denied_permission_ends_run_with_notice() {
        let mut runtime = BoothRuntime::new(Config::default()).unwrap();
        let effects = runtime.screen.create(PermissionStatus::Denied);
        let Some(Effect::RequestPermissions(request)) = effects.first() else {
            panic!("expected a permission request, got {:?}", effects);
        };

        runtime.complete(Completion::Permission(denied_result(request.request_code)));
        assert!(runtime.quit);

        assert_eq!(runtime.teardown(), vec!["Permissions not granted".to_string()]);
        assert!(runtime.executor.is_shutdown());
        assert!(runtime.session.is_none());
    }

    #[test]
    fn test_user_quit_returns_no_notices() {
        let mut runtime = BoothRuntime::new(Config::default()).unwrap();
        runtime.screen.create(PermissionStatus::Granted);
        runtime.complete(Completion::Capture(Err(CaptureError::camera_closed())));
        runtime.quit = true;

        assert!(runtime.teardown().is_empty());
        assert!(runtime.executor.is_shutdown());
        assert!(runtime.screen.is_finished());
    }

    #[test]
    fn test_capture_without_session_reports_camera_closed() {
        let mut runtime = BoothRuntime::new(Config::default()).unwrap();
        runtime.screen.create(PermissionStatus::Granted);
        runtime.complete(Completion::Camera(Err(CameraError::NoCameraFound)));

        runtime.execute(vec![Effect::Capture]);
        runtime.dispatch(Message::Tick(Instant::now()));
        assert_eq!(runtime.screen.toast().map(|t| t.text.as_str()), Some("Error 3"));
    }

    #[test]
    fn test_poll_timeout_stops_at_countdown_deadline() {
        let now = Instant::now();
        assert_eq!(poll_timeout(None, now), timing::UI_POLL_INTERVAL);
        assert_eq!(
            poll_timeout(Some(now + Duration::from_secs(1)), now),
            timing::UI_POLL_INTERVAL
        );
        assert_eq!(
            poll_timeout(Some(now + Duration::from_millis(5)), now),
            Duration::from_millis(5)
        );
        assert_eq!(poll_timeout(Some(now), now + Duration::from_millis(3)), Duration::ZERO);
    }

    #[test]
    fn test_status_message_names_camera() {
        assert_eq!(build_status_message(None), ui::STATUS_HINT);
        assert!(build_status_message(Some("Integrated Camera")).starts_with("Integrated Camera | "));
    }
}
