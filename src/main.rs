use std::fs::OpenOptions;
use std::io;
use std::sync::{Mutex, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pokeguess::catalog::PokeApi;
use pokeguess::config::{self, Config};
use pokeguess::provider::spawn_provider;
use pokeguess::state::{Delta, GameState, Phase, ProviderCommand, apply_delta};

struct App {
    state: GameState,
    should_quit: bool,
    help_overlay: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    // Where the suggestion rows were last drawn, for mouse picking.
    suggestion_rows: Option<Rect>,
}

impl App {
    fn new(state: GameState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            help_overlay: false,
            cmd_tx,
            suggestion_rows: None,
        }
    }

    fn dispatch(&mut self, commands: Vec<ProviderCommand>) {
        for cmd in commands {
            let Some(tx) = &self.cmd_tx else {
                self.state.push_log("[WARN] Catalog fetch unavailable");
                return;
            };
            if tx.send(cmd).is_err() {
                self.state.push_log("[WARN] Catalog request failed");
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        // The help popup swallows everything but its own close keys.
        if self.help_overlay {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                self.help_overlay = false;
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(1) => self.help_overlay = true,
            _ => match self.state.phase().clone() {
                Phase::Loading => {}
                Phase::Playing => self.on_playing_key(key),
                Phase::Correct => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char('n')) {
                        let cmds = self.state.advance_round();
                        self.dispatch(cmds);
                    }
                }
                Phase::GameOver => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) {
                        let cmds = self.state.restart();
                        self.dispatch(cmds);
                    }
                }
                Phase::LoadFailed { .. } => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) {
                        let cmds = self.state.retry();
                        self.dispatch(cmds);
                    }
                }
            },
        }
    }

    fn on_playing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.state.submit_guess();
            }
            KeyCode::Tab => {
                self.state.accept_suggestion();
            }
            KeyCode::Down => self.state.select_next_suggestion(),
            KeyCode::Up => self.state.select_prev_suggestion(),
            KeyCode::Backspace => {
                let mut text = self.state.guess_text().to_string();
                text.pop();
                self.state.set_guess_text(text);
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut text = self.state.guess_text().to_string();
                text.push(c);
                self.state.set_guess_text(text);
            }
            _ => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(area) = self.suggestion_rows else {
            return;
        };
        let inside = mouse.column >= area.x
            && mouse.column < area.x + area.width
            && mouse.row >= area.y
            && mouse.row < area.y + area.height;
        if inside {
            self.state.pick_suggestion((mouse.row - area.y) as usize);
        }
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    let config = Config::from_env();
    init_tracing(&config)?;

    let api = PokeApi::from_config(&config)?;
    tracing::info!(base = api.base_url(), total = config.total, "starting");

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(api, tx, cmd_rx);

    let mut app = App::new(GameState::from_config(&config), Some(cmd_tx));
    let cmds = app.state.start();
    app.dispatch(cmds);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    if app.state.best_score() > 0 {
        println!("Best score this session: {}", app.state.best_score());
    }
    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pokeguess=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    app.suggestion_rows = None;
    match app.state.phase().clone() {
        Phase::Loading => render_notice(frame, chunks[1], "Loading creature...", Color::DarkGray),
        Phase::Playing | Phase::Correct => render_round(frame, chunks[1], app),
        Phase::GameOver => render_game_over(frame, chunks[1], &app.state),
        Phase::LoadFailed { error } => render_load_failed(frame, chunks[1], &error),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(app.state.phase()))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &GameState) -> String {
    let line1 = format!(
        "  .-.  WHO'S THAT POKEMON? | Score: {} | Best: {}",
        state.score(),
        state.best_score()
    );
    let line2 = " (o o)".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(phase: &Phase) -> &'static str {
    match phase {
        Phase::Loading => "F1 Help | Esc Quit",
        Phase::Playing => "Type to guess | ↑/↓ Pick | Tab Accept | Enter Guess | F1 Help | Esc Quit",
        Phase::Correct => "Enter/n Next | F1 Help | Esc Quit",
        Phase::GameOver => "Enter/r Restart | F1 Help | Esc Quit",
        Phase::LoadFailed { .. } => "Enter/r Retry | F1 Help | Esc Quit",
    }
}

fn render_notice(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let notice = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(notice, area);
}

fn render_round(frame: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let sprite = Paragraph::new(sprite_text(&app.state))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Sprite").borders(Borders::ALL));
    frame.render_widget(sprite, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(1),
        ])
        .split(columns[1]);

    let playing = *app.state.phase() == Phase::Playing;
    let input_style = if playing {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let cursor = if playing { "_" } else { "" };
    let input = Paragraph::new(format!("{}{cursor}", app.state.guess_text()))
        .style(input_style)
        .block(Block::default().title("Guess").borders(Borders::ALL));
    frame.render_widget(input, right[0]);

    let block = Block::default().title("Suggestions").borders(Borders::ALL);
    let inner = block.inner(right[1]);
    frame.render_widget(block, right[1]);
    render_suggestions(frame, inner, &app.state);
    if !app.state.suggestions().is_empty() {
        app.suggestion_rows = Some(Rect {
            height: inner.height.min(app.state.suggestions().len() as u16),
            ..inner
        });
    }

    let feedback_style = match app.state.phase() {
        Phase::Correct => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        _ => Style::default(),
    };
    let feedback = Paragraph::new(app.state.feedback())
        .style(feedback_style)
        .wrap(Wrap { trim: true });
    frame.render_widget(feedback, right[2]);
}

fn render_suggestions(frame: &mut Frame, area: Rect, state: &GameState) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    if state.suggestions().is_empty() {
        let hint = if state.catalog().is_none() {
            "Name list loading..."
        } else {
            ""
        };
        let empty = Paragraph::new(hint).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    for (i, name) in state.suggestions().iter().enumerate() {
        if i as u16 >= area.height {
            break;
        }
        let row = Rect {
            x: area.x,
            y: area.y + i as u16,
            width: area.width,
            height: 1,
        };
        let selected = state.suggestion_cursor() == Some(i);
        let style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let prefix = if selected { "> " } else { "  " };
        frame.render_widget(Paragraph::new(format!("{prefix}{name}")).style(style), row);
    }
}

fn sprite_text(state: &GameState) -> String {
    let Some(record) = state.current() else {
        return "No creature".to_string();
    };
    let sprite = record
        .image_url
        .as_deref()
        .unwrap_or("(no sprite for this creature)");
    format!("#{}\n\n{sprite}", record.id)
}

fn render_game_over(frame: &mut Frame, area: Rect, state: &GameState) {
    let text = [
        "Game Over!".to_string(),
        String::new(),
        state.feedback().to_string(),
        format!("Your Final Score: {}", state.score()),
        format!("Best this session: {}", state.best_score()),
        String::new(),
        "Press Enter or r to restart".to_string(),
    ]
    .join("\n");
    let panel = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_load_failed(frame: &mut Frame, area: Rect, error: &str) {
    let text = format!("Could not load a creature.\n\n{error}\n\nPress Enter or r to retry");
    let panel = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().title("Load failed").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn console_text(state: &GameState) -> String {
    if state.logs().is_empty() {
        return "No messages yet".to_string();
    }
    let logs = state.logs();
    let start = logs.len().saturating_sub(3);
    logs.iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Who's That Pokemon? - Help",
        "",
        "Guessing:",
        "  type         Edit guess",
        "  ↑ / ↓        Highlight suggestion",
        "  Tab / click  Use suggestion",
        "  Enter        Submit guess",
        "",
        "After a round:",
        "  Enter / n    Next (after a correct guess)",
        "  Enter / r    Restart (after game over)",
        "  Enter / r    Retry (after a failed load)",
        "",
        "  F1           Toggle help",
        "  Esc / Ctrl-C Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
