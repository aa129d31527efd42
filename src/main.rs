use std::{io, path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use ragline::api::BackendClient;
use ragline::app::App;
use ragline::events::handle_key_event;
use ragline::ui::draw_ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal chat client for a RAG question-answering backend")]
struct Cli {
    /// Base URL of the question-answering backend.
    #[arg(long, env = "RAGLINE_BACKEND_URL", default_value = "http://localhost:8000")]
    backend_url: String,

    /// File debug logs are written to (stdout belongs to the TUI).
    #[arg(long, env = "RAGLINE_LOG_FILE", default_value = "ragline.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let log_name = cli
        .log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ragline.log".to_string());
    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ragline=debug".into()),
        )
        .init();

    tracing::info!(backend = %cli.backend_url, "starting ragline");

    let backend = BackendClient::new(cli.backend_url);

    // One best-effort health probe; the result is only logged.
    {
        let backend = backend.clone();
        tokio::spawn(async move {
            match backend.health().await {
                Ok(status) => tracing::info!(%status, "backend health"),
                Err(e) => tracing::warn!(error = %e, "backend health probe failed"),
            }
        });
    }

    let mut app = App::new(backend);
    app.fetch_modes();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.process_backend_events();
        app.process_typing_events();

        terminal.draw(|f| draw_ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if handle_key_event(app, key) {
                    return Ok(());
                }
            }
        }
    }
}
