use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use wavestrip::animation::{AnimationDriver, PhaseEvent};
use wavestrip::audio::{DecodedAudio, Decoder, PulsePlayback, SymphoniaDecoder};
use wavestrip::color::{ColorScheme, RgbColor};
use wavestrip::config::Config;
use wavestrip::geometry::SurfaceGeometry;
use wavestrip::renderer::Canvas;
use wavestrip::{PlayerController, PlayerError};

const SEEK_STEP_SECS: f64 = 5.0;

type Player = PlayerController<SymphoniaDecoder, PulsePlayback>;

pub async fn run(config: Config, file: PathBuf) -> Result<()> {
    let bytes: Arc<[u8]> = std::fs::read(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?
        .into();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, config, file, bytes).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    file: PathBuf,
    bytes: Arc<[u8]>,
) -> Result<()> {
    let decoder = SymphoniaDecoder::for_path(&file);
    let playback = PulsePlayback::new(config.audio.device.clone(), config.player.looping);
    let geometry = if config.display.fit_terminal {
        let size = terminal.size()?;
        let (wave, _) = split_screen(Rect::new(0, 0, size.width, size.height));
        fit_geometry(wave, config.player.block_width, config.display.device_pixel_ratio)
    } else {
        config.geometry()
    };

    let mut player = PlayerController::new(
        decoder.clone(),
        playback,
        geometry,
        config.player.block_width,
        config.colors.palette(),
    );
    let mut canvas = Canvas::with_geometry(geometry);
    let mut scheme = config.colors.scheme;

    // Decode off the render loop; frames draw nothing until it lands
    let mut pending = Some(spawn_decode(decoder, bytes.clone()));

    let title = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut wave_area = Rect::default();

    let mut driver = AnimationDriver::new(config.display.fps);
    driver.start(Instant::now());

    while driver.is_running() {
        if pending.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = pending.take() {
                let decoded = handle.await.unwrap_or_else(|e| {
                    Err(PlayerError::Decode(format!("decode task failed: {}", e)))
                });
                match player.install(bytes.clone(), decoded) {
                    Ok(()) => {
                        driver.transition(PhaseEvent::Loaded);
                        // Honour a play pressed while still decoding
                        if config.player.autoplay || player.is_playing() {
                            start_playback(&mut player, &mut driver);
                        }
                    }
                    // Playback is unavailable but the waveform is there
                    Err(_) if player.is_loaded() => driver.transition(PhaseEvent::Loaded),
                    // Shown in the status line
                    Err(_) => driver.invalidate(),
                }
            }
        }

        if player.sync() {
            driver.transition(PhaseEvent::Pause);
        }

        let wait = driver.time_until_frame(Instant::now()).unwrap_or_default();
        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(key, &mut player, &mut driver, &mut scheme, &config);
                }
                Event::Mouse(mouse) => {
                    handle_mouse(mouse, wave_area, &mut player, &mut driver);
                }
                Event::Resize(cols, rows) => {
                    debug!("Terminal resized to {}x{}", cols, rows);
                    driver.cancel();
                    if config.display.fit_terminal {
                        let (wave, _) = split_screen(Rect::new(0, 0, cols, rows));
                        let geometry = fit_geometry(
                            wave,
                            config.player.block_width,
                            config.display.device_pixel_ratio,
                        );
                        if player.resize(&mut canvas, geometry).is_err() {
                            // Shown in the status line
                            driver.transition(PhaseEvent::Unloaded);
                        }
                    }
                    driver.start(Instant::now());
                }
                _ => {}
            }
        }

        let marker = config.colors.palette_for(scheme).marker;
        driver.run_frame(Instant::now(), |_| {
            player.render(&mut canvas);
            let status = player.status_line();

            terminal.draw(|frame| {
                let (wave, status_area) = split_screen(frame.area());
                wave_area = wave;

                present(&canvas, frame.buffer_mut(), wave, Some(marker));
                render_status(frame, status_area, &status, &title, scheme);
            })?;
            Ok(())
        });
    }

    player.pause();
    Ok(())
}

fn spawn_decode(
    decoder: SymphoniaDecoder,
    bytes: Arc<[u8]>,
) -> JoinHandle<Result<DecodedAudio, PlayerError>> {
    tokio::task::spawn_blocking(move || decoder.decode(&bytes))
}

fn start_playback(player: &mut Player, driver: &mut AnimationDriver) {
    match player.play() {
        Ok(()) => driver.transition(PhaseEvent::Play),
        Err(e) => warn!("Could not start playback: {}", e),
    }
}

fn handle_key(
    key: KeyEvent,
    player: &mut Player,
    driver: &mut AnimationDriver,
    scheme: &mut ColorScheme,
    config: &Config,
) {
    match key {
        KeyEvent {
            code: KeyCode::Char('q'),
            ..
        }
        | KeyEvent {
            code: KeyCode::Esc, ..
        }
        | KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => {
            driver.cancel();
        }
        KeyEvent {
            code: KeyCode::Char(' '),
            ..
        } => match player.toggle() {
            Ok(true) => driver.transition(PhaseEvent::Play),
            Ok(false) => driver.transition(PhaseEvent::Pause),
            Err(e) => warn!("Could not start playback: {}", e),
        },
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::NONE,
            ..
        } => {
            *scheme = scheme.next();
            player.set_palette(config.colors.palette_for(*scheme));
            driver.invalidate();
        }
        KeyEvent {
            code: KeyCode::Left,
            ..
        } => {
            player.seek_by(-SEEK_STEP_SECS);
            driver.invalidate();
        }
        KeyEvent {
            code: KeyCode::Right,
            ..
        } => {
            player.seek_by(SEEK_STEP_SECS);
            driver.invalidate();
        }
        _ => {}
    }
}

fn handle_mouse(mouse: MouseEvent, area: Rect, player: &mut Player, driver: &mut AnimationDriver) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    if !area.contains(Position::new(mouse.column, mouse.row)) {
        return;
    }
    let x = column_to_x(mouse.column - area.x, area.width, player.geometry().width);
    player.handle_click(x);
    driver.invalidate();
}

/// Waveform area and the one-row status bar beneath it.
fn split_screen(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Logical surface giving each cell column one block and each half-row
/// `block_width` pixels.
fn fit_geometry(area: Rect, block_width: u32, device_pixel_ratio: f64) -> SurfaceGeometry {
    let bw = block_width as f64;
    SurfaceGeometry::new(
        area.width as f64 * bw,
        area.height as f64 * 2.0 * bw,
        device_pixel_ratio,
    )
}

/// Logical x for a click in cell `column` of a `columns`-wide area. The
/// first and last columns map to the two edges of the surface.
fn column_to_x(column: u16, columns: u16, logical_width: f64) -> f64 {
    if columns <= 1 {
        return 0.0;
    }
    column.min(columns - 1) as f64 * logical_width / (columns - 1) as f64
}

/// Pixel index sampled for cell `cell` of `cells` over `pixels` pixels.
fn sample_index(cell: usize, cells: usize, pixels: usize) -> usize {
    let idx = ((cell as f64 + 0.5) / cells as f64 * pixels as f64) as usize;
    idx.min(pixels.saturating_sub(1))
}

/// Pixel columns covered by cell `cell`.
fn cell_span(cell: usize, cells: usize, pixels: usize) -> std::ops::Range<usize> {
    let start = cell * pixels / cells;
    let end = ((cell + 1) * pixels / cells).max(start + 1).min(pixels);
    start..end
}

fn pixel_color(canvas: &Canvas, x: usize, y: usize) -> Option<Color> {
    let (r, g, b, a) = canvas.get_pixel(x, y);
    (a > 0).then_some(Color::Rgb(r, g, b))
}

/// Sample the canvas at one half-cell. Pixels matching `highlight` anywhere
/// in the cell's column span win over the center sample, so a playhead
/// narrower than a cell is never lost between columns.
fn sample_half_cell(
    canvas: &Canvas,
    columns: std::ops::Range<usize>,
    center_x: usize,
    y: usize,
    highlight: Option<RgbColor>,
) -> Option<Color> {
    if let Some(h) = highlight {
        let hit = columns.into_iter().any(|x| {
            let (r, g, b, a) = canvas.get_pixel(x, y);
            a > 0 && (r, g, b) == (h.r, h.g, h.b)
        });
        if hit {
            return Some(Color::Rgb(h.r, h.g, h.b));
        }
    }
    pixel_color(canvas, center_x, y)
}

/// Draw the canvas into `area` using half-block cells: the upper half of
/// each cell is the foreground, the lower half the background.
fn present(canvas: &Canvas, buf: &mut Buffer, area: Rect, highlight: Option<RgbColor>) {
    if area.width == 0 || area.height == 0 || canvas.width == 0 || canvas.height == 0 {
        return;
    }
    let cols = area.width as usize;
    let rows = area.height as usize * 2;

    for cy in 0..area.height {
        let top_y = sample_index(cy as usize * 2, rows, canvas.height);
        let bottom_y = sample_index(cy as usize * 2 + 1, rows, canvas.height);

        for cx in 0..area.width {
            let span = cell_span(cx as usize, cols, canvas.width);
            let center = sample_index(cx as usize, cols, canvas.width);
            let top = sample_half_cell(canvas, span.clone(), center, top_y, highlight);
            let bottom = sample_half_cell(canvas, span, center, bottom_y, highlight);

            let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) else {
                continue;
            };
            match (top, bottom) {
                (Some(t), b) => {
                    cell.set_char('▀');
                    cell.set_fg(t);
                    cell.set_bg(b.unwrap_or(Color::Reset));
                }
                (None, Some(b)) => {
                    cell.set_char('▄');
                    cell.set_fg(b);
                    cell.set_bg(Color::Reset);
                }
                (None, None) => {
                    cell.set_char(' ');
                    cell.set_fg(Color::Reset);
                    cell.set_bg(Color::Reset);
                }
            }
        }
    }
}

fn render_status(frame: &mut Frame, area: Rect, status: &str, title: &str, scheme: ColorScheme) {
    let line = Line::from(vec![
        Span::styled(format!(" {} ", status), Style::default().fg(Color::White)),
        Span::styled(format!("| {} ", title), Style::default().fg(Color::Gray)),
        Span::styled(
            format!(
                "| [space] play/pause | [←/→] seek | click to seek | [c]olor: {} | [q]uit ",
                scheme.name()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::buffer::Cell;
    use wavestrip::waveform::block_count;
    use wavestrip::renderer::DrawingSurface;

    fn cell(buf: &Buffer, x: u16, y: u16) -> &Cell {
        &buf[Position::new(x, y)]
    }

    #[test]
    fn click_columns_cover_both_edges() {
        assert_eq!(column_to_x(0, 101, 800.0), 0.0);
        assert_eq!(column_to_x(100, 101, 800.0), 800.0);
        assert_eq!(column_to_x(50, 101, 800.0), 400.0);
        assert_eq!(column_to_x(500, 101, 800.0), 800.0);
        assert_eq!(column_to_x(0, 1, 800.0), 0.0);
    }

    #[test]
    fn fitted_surface_has_one_block_per_column() {
        let (wave, status) = split_screen(Rect::new(0, 0, 100, 21));
        assert_eq!(wave, Rect::new(0, 0, 100, 20));
        assert_eq!(status, Rect::new(0, 20, 100, 1));

        let g = fit_geometry(wave, 3, 2.0);
        assert_eq!((g.width, g.height, g.device_pixel_ratio), (300.0, 120.0, 2.0));
        assert_eq!(block_count(g.width, 3), 100);
        assert!(g.within_limits());
    }

    #[test]
    fn cell_spans_tile_the_canvas() {
        let spans: Vec<_> = (0..3).map(|c| cell_span(c, 3, 10)).collect();
        assert_eq!(spans, vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn half_blocks_carry_two_rows() {
        let mut canvas = Canvas::with_geometry(SurfaceGeometry::new(2.0, 4.0, 1.0));
        // bottom half of the canvas filled
        canvas.fill_rect(0.0, 2.0, 2.0, 2.0, RgbColor::new(0, 255, 255));

        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        present(&canvas, &mut buf, area, None);

        assert_eq!(cell(&buf, 0, 0).symbol(), " ");
        assert_eq!(cell(&buf, 0, 1).symbol(), "▀");
        assert_eq!(cell(&buf, 0, 1).fg, Color::Rgb(0, 255, 255));
        assert_eq!(cell(&buf, 0, 1).bg, Color::Rgb(0, 255, 255));
    }

    #[test]
    fn thin_playhead_survives_downsampling() {
        let red = RgbColor::new(255, 0, 0);
        let mut canvas = Canvas::with_geometry(SurfaceGeometry::new(100.0, 2.0, 1.0));
        canvas.stroke_line((41.0, 2.0), (41.0, 0.0), 2.0, red);

        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        present(&canvas, &mut buf, area, Some(red));

        // pixels 40..42 live in cell 4, whose center sample is pixel 45
        assert_eq!(cell(&buf, 4, 0).fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell(&buf, 3, 0).symbol(), " ");
    }
}
