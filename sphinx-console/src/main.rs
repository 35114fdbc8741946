use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;

use sphinx_protocol::framework::FrameworkId;

mod app;
mod driver;
mod export;
mod gateway;
mod ui;
mod utils;

use app::{App, Phase};
use ui::ui;

/// Multi-framework AI governance console.
#[derive(Parser, Debug)]
#[command(name = "sphinx-console", version, about)]
struct Args {
    /// Directory for sealed artifacts and audit exports
    #[arg(long, default_value = "./OUTPUT")]
    output_dir: PathBuf,

    /// Preselect a governance framework (islamic, jewish, christian, secular)
    #[arg(long)]
    framework: Option<String>,

    /// List available frameworks and exit
    #[arg(long)]
    print_frameworks: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    if args.print_frameworks {
        let catalog = sphinx_protocol::framework::FrameworkCatalog::load();
        for fw in catalog.all() {
            println!("{:<10} {}", fw.id.as_str(), fw.name);
        }
        return Ok(());
    }

    let preselect = match args.framework.as_deref() {
        Some(raw) => Some(FrameworkId::parse(raw)?),
        None => None,
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(args.output_dir, preselect)?;

    // Run main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Drain gateway results and reveal timer notes
        app.poll_async();

        terminal.draw(|f| ui(f, app))?;

        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        app.should_quit = true;
                    } else {
                        match app.phase {
                            Phase::Selection => handle_selection_key(app, key.code),
                            Phase::Input => handle_input_key(app, key.code),
                            Phase::Processing => handle_processing_key(app, key.code),
                            Phase::Complete => handle_complete_key(app, key.code),
                        }
                    }
                }
            }
        }

        if app.should_quit {
            let _ = utils::save_history(&app.history);
            return Ok(());
        }
    }
}

fn handle_selection_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Down | KeyCode::Char('j') => {
            if app.selected < FrameworkId::ALL.len() - 1 {
                app.selected += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.selected = app.selected.saturating_sub(1);
        }
        KeyCode::Enter => {
            let id = FrameworkId::ALL[app.selected];
            app.select_framework(id);
        }
        _ => {}
    }
}

fn handle_input_key(app: &mut App, code: KeyCode) {
    if app.request_in_flight {
        // The editor is locked while a request is in flight; Esc still
        // abandons the session.
        if code == KeyCode::Esc {
            app.reset();
        }
        return;
    }
    match code {
        KeyCode::Esc => app.reset(),
        KeyCode::Enter => app.submit_query(),
        KeyCode::Tab => app.cycle_sample(),
        KeyCode::Down => app.recall_recent(),
        KeyCode::Backspace => {
            app.query.pop();
        }
        KeyCode::Char(c) => {
            app.query.push(c);
            app.error = None;
        }
        _ => {}
    }
}

fn handle_processing_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter | KeyCode::Char('g') => app.grant_consent(),
        KeyCode::Char('a') => app.show_audit = !app.show_audit,
        KeyCode::Esc => app.reset(),
        _ => {}
    }
}

fn handle_complete_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('s') => {
            if let Some(artifact) = &app.artifact {
                app.status_line = match export::write_artifact(&app.output_dir, artifact) {
                    Ok(path) => Some(format!("Saved {}", path.display())),
                    Err(err) => Some(format!("Save failed: {}", err)),
                };
            }
        }
        KeyCode::Char('c') => {
            if let Some(artifact) = &app.artifact {
                app.status_line = match export::copy_to_clipboard(&artifact.rendered) {
                    Ok(()) => Some("Copied to clipboard".to_string()),
                    Err(err) => Some(format!("Copy failed: {}", err)),
                };
            }
        }
        KeyCode::Char('x') => {
            let tag = app
                .artifact
                .as_ref()
                .map(|a| a.meta.id.clone())
                .unwrap_or_else(|| "session".to_string());
            app.status_line = match export::export_audit(&app.output_dir, &tag, &app.audit) {
                Ok(path) => Some(format!("Audit exported to {}", path.display())),
                Err(err) => Some(format!("Audit export failed: {}", err)),
            };
        }
        KeyCode::Char('a') => app.show_audit = !app.show_audit,
        KeyCode::Char('n') | KeyCode::Enter | KeyCode::Esc => app.reset(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}
