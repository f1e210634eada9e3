use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::path::Path;
use std::time::Duration;

use tui_globe::app::App;
use tui_globe::{data, ui};

fn main() -> Result<()> {
    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for rotating and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        // Click and drag to rotate
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn load_world() -> data::WorldData {
    let data_dir = Path::new("data");
    if data_dir.exists() {
        if let Ok(world) = data::load_world(data_dir) {
            if !world.is_empty() {
                return world;
            }
        }
    }
    data::generate_simple_world()
}

fn run(terminal: &mut DefaultTerminal) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize, load_world())?;

    // Main loop
    loop {
        app.prepare_frame()?;
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Rotate with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.rotate_step(-1, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.rotate_step(1, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.rotate_step(0, -1),
                            KeyCode::Down | KeyCode::Char('j') => app.rotate_step(0, 1),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Projection and sampling toggles
                            KeyCode::Char('m') | KeyCode::Char('M') => {
                                app.cycle_projection();
                            }
                            KeyCode::Char('a') | KeyCode::Char('A') => {
                                app.toggle_smoothing();
                            }

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => {
                                let size = terminal.size()?;
                                app = App::new(
                                    size.width as usize,
                                    size.height as usize,
                                    load_world(),
                                )?;
                            }

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
