use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;

mod game;
mod game_theme;
mod helpers;
mod link;
mod paddle;
mod projectile;
mod protocol;

use crate::game::{FrameInput, Game};
use crate::game_theme::MatrixTheme;
use crate::helpers::FramePacer;
use crate::link::{LinkConfig, LinkHandle, Side};
use crate::protocol::ProtocolError;

/// Frame loop rate. Input, link, and display are serviced every frame; the
/// game's own cadence counters are denominated in these frames.
const FRAME: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(
    name = "terminal-tennis",
    about = "Two-terminal LED-matrix tennis over an MQTT byte link"
)]
struct Cli {
    /// Which end of the link this instance plays
    #[arg(value_enum)]
    side: Side,

    /// Court id; both players join the same court
    #[arg(long, default_value = "court-1")]
    court: String,

    /// MQTT broker host
    #[arg(long, default_value = "localhost")]
    broker: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    port: u16,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[arg(long, value_enum, default_value = "amber")]
    theme: MatrixTheme,
}

struct App {
    game: Game,
    link: LinkHandle,
    exit: bool,
}

impl App {
    fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<(), AppError> {
        let mut pacer = FramePacer::new(FRAME);
        while !self.exit {
            let input = self.poll_input()?;
            self.game.tick(Instant::now(), &input, &mut self.link)?;
            let link_up = self.link.connected();
            terminal.draw(|frame| self.game.draw(frame, link_up))?;
            pacer.wait();
        }
        Ok(())
    }

    /// Drain everything the terminal has queued into one frame's input.
    fn poll_input(&mut self) -> io::Result<FrameInput> {
        let mut input = FrameInput::default();
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    match key_event.code {
                        KeyCode::Esc | KeyCode::Char('q') => self.exit = true,
                        KeyCode::Left | KeyCode::Char('a') => input.left = true,
                        KeyCode::Right | KeyCode::Char('d') => input.right = true,
                        KeyCode::Enter | KeyCode::Char(' ') => input.confirm = true,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Ok(input)
    }
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let link = link::connect(LinkConfig {
        broker_host: cli.broker,
        broker_port: cli.port,
        court_id: cli.court,
        side: cli.side,
        username: cli.username,
        password: cli.password,
    });

    let mut terminal = ratatui::init();
    let mut app = App {
        game: Game::new(cli.theme),
        link,
        exit: false,
    };
    let result = app.run(&mut terminal);
    ratatui::restore();

    match &result {
        Ok(()) => println!("Thanks for playing terminal.tennis! 🎾"),
        Err(err) => eprintln!("Game ended with error: {err}"),
    }

    result
}

/// Top-level failure: either the terminal went away or the peer sent a byte
/// outside the game protocol.
#[derive(Debug)]
enum AppError {
    Io(io::Error),
    Protocol(ProtocolError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => Display::fmt(err, f),
            AppError::Protocol(err) => Display::fmt(err, f),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Protocol(err) => Some(err),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<ProtocolError> for AppError {
    fn from(err: ProtocolError) -> Self {
        AppError::Protocol(err)
    }
}
