// Full-screen terminal chat view: owns the session and the placeholder, and
// runs the single loop that handles keys, ticks the animation and settles
// replies coming back from request tasks.

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{io, time::Instant};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

use crate::chat::{ChatSession, OutboundRequest, Ticket};
use crate::constants::VIEW_TICK;
use crate::persona::Profile;
use crate::placeholder::PlaceholderAnimator;
use crate::relay_client::{RelayClient, RelayError};
use crate::ui;

pub type ReplyEnvelope = (Ticket, Result<String, RelayError>);

#[derive(Debug)]
pub enum Action {
    None,
    Send(OutboundRequest),
    Quit,
}

pub struct App {
    pub session: ChatSession,
    pub placeholder: PlaceholderAnimator,
    pub title: String,
    pub prompt: String,
}

impl App {
    pub fn new(profile: &Profile, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            session: ChatSession::from_profile(profile, today)?,
            placeholder: PlaceholderAnimator::new(),
            title: format!("{} ⸺ zsh", profile.site),
            prompt: profile.prompt_label(),
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => Action::Quit,
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            (KeyCode::Enter, _) => match self.session.submit() {
                Some(request) => Action::Send(request),
                None => Action::None,
            },
            (KeyCode::Backspace, _) => {
                self.session.pop_input();
                Action::None
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.session.push_input(c);
                Action::None
            }
            _ => Action::None,
        }
    }
}

/// Sends `request` on its own task. The reply is dropped if the view has
/// already closed its receiver.
pub fn spawn_request(
    client: &RelayClient,
    request: OutboundRequest,
    reply_tx: mpsc::Sender<ReplyEnvelope>,
) -> JoinHandle<()> {
    let client = client.clone();
    tokio::spawn(async move {
        let (ticket, body) = request.into_parts();
        let reply = client.send(&body).await;
        if reply_tx.send((ticket, reply)).await.is_err() {
            debug!("View closed before reply arrived; dropping it");
        }
    })
}

pub async fn run_chat(client: RelayClient, profile: &Profile, today: NaiveDate) -> Result<()> {
    let mut app = App::new(profile, today)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &RelayClient,
) -> Result<()> {
    let (reply_tx, mut reply_rx) = mpsc::channel::<ReplyEnvelope>(100);
    let mut last_tick = Instant::now();

    info!(relay = client.endpoint(), "Chat view started");

    loop {
        while let Ok((ticket, reply)) = reply_rx.try_recv() {
            app.session.settle(ticket, reply);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(VIEW_TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key) {
                        Action::Send(request) => {
                            spawn_request(client, request, reply_tx.clone());
                        }
                        Action::Quit => break,
                        Action::None => {}
                    }
                }
            }
        }

        let now = Instant::now();
        app.placeholder.advance(now.duration_since(last_tick));
        last_tick = now;
    }

    info!(in_flight = app.session.in_flight(), "Chat view closed");
    Ok(())
}
