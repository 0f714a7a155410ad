use std::time::{Duration, Instant};

use ratatui::{
    layout::{Alignment, Constraint, Direction, Flex, Layout, Margin, Rect},
    style::Style,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use tui_big_text::{BigText, PixelSize};

use crate::game_theme::MatrixTheme;
use crate::helpers::{centered_rect, Marquee};
use crate::paddle::Paddle;
use crate::projectile::{FieldEvent, Projectile, StartPosition, MAX_Y, SERVE_X, SERVE_Y};
use crate::protocol::{
    send_ball, BallReceiver, ByteLink, Choice, CoinToss, ProtocolError, TossOutcome,
};

/// Frames between ball integrations. Halved while the ball flies straight up
/// or down, so perceived speed stays roughly uniform across serve angles.
const BALL_TICKS: u32 = 30;

/// How long the lose glyph stays up. Deliberately not skippable.
const LOSE_HOLD: Duration = Duration::from_millis(1500);

const MARQUEE_TEXT: &str = "PRESS ENTER TO START";
const MARQUEE_STEP_TICKS: u32 = 12;
const MARQUEE_WIDTH: usize = 26;

/// Field cells of the lose glyph: eyes up top, frown below.
const SAD_FACE: [(i8, i8); 9] = [
    (1, 3),
    (2, 3),
    (4, 3),
    (5, 3),
    (2, 1),
    (3, 1),
    (4, 1),
    (1, 0),
    (5, 0),
];

// On-screen size of one matrix cell.
const CELL_W: u16 = 4;
const CELL_H: u16 = 2;
const MATRIX_W: u16 = 7 * CELL_W + 2;
const MATRIX_H: u16 = 5 * CELL_H + 2;

const MIN_COLS: u16 = 40;
const MIN_ROWS: u16 = 18;

/// Edge-triggered input collected over one frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub confirm: bool,
}

/// Where the game is. `Begin` and `Waiting` block local ball simulation;
/// `BallSelect` and `GameOn` hold local authority over the ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Begin,
    BallSelect,
    Waiting,
    GameOn,
}

pub struct Game {
    state: State,
    paddle: Paddle,
    ball: Projectile,
    ball_ticks: u32,
    serve_pick: StartPosition,
    toss: Option<CoinToss>,
    receiver: BallReceiver,
    lose_until: Option<Instant>,
    marquee: Marquee,
    theme: MatrixTheme,
}

impl Game {
    pub fn new(theme: MatrixTheme) -> Self {
        Self {
            state: State::Begin,
            paddle: Paddle::new(),
            // placeholder until the first serve or handoff
            ball: Projectile::serve(StartPosition::N),
            ball_ticks: 0,
            serve_pick: StartPosition::N,
            toss: None,
            receiver: BallReceiver::new(),
            lose_until: None,
            marquee: Marquee::new(MARQUEE_TEXT, MARQUEE_STEP_TICKS),
            theme,
        }
    }

    /// One frame of the state machine. Input and the link are polled exactly
    /// once; nothing in here blocks.
    pub fn tick(
        &mut self,
        now: Instant,
        input: &FrameInput,
        link: &mut dyn ByteLink,
    ) -> Result<(), ProtocolError> {
        match self.state {
            State::Begin => self.tick_begin(input, link)?,
            State::BallSelect => self.tick_ball_select(input),
            State::Waiting => self.tick_waiting(input, link),
            State::GameOn => self.tick_game_on(now, input, link),
        }
        Ok(())
    }

    fn tick_begin(
        &mut self,
        input: &FrameInput,
        link: &mut dyn ByteLink,
    ) -> Result<(), ProtocolError> {
        match self.toss.as_mut() {
            None => {
                self.marquee.advance();
                if input.confirm {
                    self.toss = Some(CoinToss::new());
                }
            }
            Some(toss) => {
                if let Some(outcome) = toss.poll(input, link)? {
                    self.toss = None;
                    match outcome {
                        TossOutcome::Serve => self.enter_ball_select(),
                        TossOutcome::Receive => self.enter_waiting(),
                    }
                }
            }
        }
        Ok(())
    }

    fn tick_ball_select(&mut self, input: &FrameInput) {
        if input.right {
            self.serve_pick = self.serve_pick.next();
        } else if input.left {
            self.serve_pick = self.serve_pick.prev();
        }
        if input.confirm {
            self.ball = Projectile::serve(self.serve_pick);
            self.ball_ticks = 0;
            self.state = State::GameOn;
        }
    }

    fn tick_waiting(&mut self, input: &FrameInput, link: &mut dyn ByteLink) {
        // the paddle stays live while the opponent has the ball
        self.paddle.poll(input);
        if let Some(ball) = self.receiver.poll(link) {
            self.ball = ball;
            self.ball_ticks = 0;
            self.state = State::GameOn;
        }
    }

    fn tick_game_on(&mut self, now: Instant, input: &FrameInput, link: &mut dyn ByteLink) {
        if let Some(until) = self.lose_until {
            // the loser watches the whole animation
            if now >= until {
                self.lose_until = None;
                self.enter_ball_select();
            }
            return;
        }

        self.paddle.poll(input);

        self.ball_ticks += 1;
        let gate = if self.ball.delta_x == 0 {
            BALL_TICKS / 2
        } else {
            BALL_TICKS
        };
        if self.ball_ticks < gate {
            return;
        }
        self.ball_ticks = 0;

        match self.ball.advance(&self.paddle) {
            FieldEvent::Miss => self.lose_until = Some(now + LOSE_HOLD),
            FieldEvent::Sent => {
                send_ball(link, self.ball);
                self.enter_waiting();
            }
            FieldEvent::Bounce | FieldEvent::None => {}
        }
    }

    fn enter_ball_select(&mut self) {
        self.serve_pick = StartPosition::N;
        self.state = State::BallSelect;
    }

    fn enter_waiting(&mut self) {
        self.receiver = BallReceiver::new();
        self.state = State::Waiting;
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

impl Game {
    pub fn draw(&self, frame: &mut Frame, link_up: bool) {
        let colors = self.theme.colors();
        let area = frame.area();

        if area.width < MIN_COLS || area.height < MIN_ROWS {
            let popup = Paragraph::new("Terminal too small!\nPlease resize.")
                .block(
                    Block::default()
                        .title("Warning")
                        .borders(Borders::ALL)
                        .border_type(BorderType::Thick),
                )
                .style(Style::default().fg(colors.text))
                .alignment(Alignment::Center);
            frame.render_widget(popup, area);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Fill(1),   // play field / begin screen
                Constraint::Length(3), // controls bar
            ])
            .split(area);

        match self.state {
            State::Begin => self.draw_begin(frame, layout[0]),
            _ => self.draw_matrix(frame, layout[0]),
        }

        let controls = Paragraph::new(self.controls_text(link_up))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(Style::default().fg(colors.border)),
            )
            .style(Style::default().fg(colors.text))
            .alignment(Alignment::Center);
        frame.render_widget(controls, layout[1]);
    }

    fn draw_begin(&self, frame: &mut Frame, area: Rect) {
        let colors = self.theme.colors();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(8), Constraint::Length(1)])
            .flex(Flex::Center)
            .split(area);

        match self.toss.as_ref() {
            None => {
                let title = BigText::builder()
                    .pixel_size(PixelSize::Quadrant)
                    .style(Style::new().fg(colors.accent))
                    .lines(vec!["TENNIS".into()])
                    .alignment(Alignment::Center)
                    .build();
                frame.render_widget(title, rows[0]);

                let prompt = Paragraph::new(self.marquee.window(MARQUEE_WIDTH))
                    .style(Style::default().fg(colors.text))
                    .alignment(Alignment::Center);
                frame.render_widget(prompt, rows[1]);
            }
            Some(toss) => {
                let letter = match toss.choice() {
                    Choice::Rock => "R",
                    Choice::Paper => "P",
                    Choice::Scissors => "S",
                };
                let glyph = BigText::builder()
                    .pixel_size(PixelSize::Full)
                    .style(Style::new().fg(colors.accent))
                    .lines(vec![letter.into()])
                    .alignment(Alignment::Center)
                    .build();
                frame.render_widget(glyph, rows[0]);

                let status = if toss.confirmed() {
                    "locked in - waiting for the opponent"
                } else {
                    "rock / paper / scissors decides who serves"
                };
                let status = Paragraph::new(status)
                    .style(Style::default().fg(colors.text))
                    .alignment(Alignment::Center);
                frame.render_widget(status, rows[1]);
            }
        }
    }

    fn draw_matrix(&self, frame: &mut Frame, area: Rect) {
        let colors = self.theme.colors();

        let mut board = centered_rect(MATRIX_W, MATRIX_H, area.width, area.height);
        board.x += area.x;
        board.y += area.y;

        let block = Block::default()
            .title(" terminal.tennis ")
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .style(Style::default().fg(colors.border).bg(colors.background))
            .title_alignment(Alignment::Center);
        frame.render_widget(block, board);

        let inner = board.inner(Margin::new(1, 1));

        // Ratatui alternates two buffers and never resets them between draws;
        // without this Clear, cells lit two frames ago bleed back in as
        // ghost pixels.
        frame.render_widget(Clear, inner);

        match self.state {
            State::BallSelect => {
                self.light_paddle(frame, inner);
                self.light_cell(frame, inner, self.serve_pick.marker(), colors.marker);
                self.light_cell(frame, inner, (SERVE_X, SERVE_Y), colors.ball);
            }
            State::Waiting => {
                self.light_paddle(frame, inner);
            }
            State::GameOn => {
                if self.lose_until.is_some() {
                    for cell in SAD_FACE {
                        self.light_cell(frame, inner, cell, colors.ball);
                    }
                } else {
                    self.light_paddle(frame, inner);
                    self.light_cell(frame, inner, (self.ball.x, self.ball.y), colors.ball);
                }
            }
            State::Begin => {}
        }
    }

    fn light_paddle(&self, frame: &mut Frame, inner: Rect) {
        let colors = self.theme.colors();
        for x in self.paddle.span() {
            self.light_cell(frame, inner, (x, 0), colors.paddle);
        }
    }

    fn light_cell(
        &self,
        frame: &mut Frame,
        inner: Rect,
        (x, y): (i8, i8),
        color: ratatui::style::Color,
    ) {
        // y = 0 is the near edge, drawn at the bottom
        let cell = Rect::new(
            inner.x + x as u16 * CELL_W,
            inner.y + (MAX_Y - y) as u16 * CELL_H,
            CELL_W,
            CELL_H,
        );
        let lit = Block::default().style(Style::default().bg(color));
        frame.render_widget(lit, cell);
    }

    fn controls_text(&self, link_up: bool) -> String {
        let hint = match self.state {
            State::Begin => {
                if self.toss.is_some() {
                    " ←/→ pick  |  Enter lock in  |  Esc quit "
                } else {
                    " Enter start  |  Esc quit "
                }
            }
            State::BallSelect => " ←/→ aim the serve  |  Enter serve  |  Esc quit ",
            State::Waiting => " ←/→ move paddle  ·  waiting for the ball ",
            State::GameOn => {
                if self.lose_until.is_some() {
                    " point lost "
                } else {
                    " ←/→ move paddle  |  Esc quit "
                }
            }
        };
        if link_up {
            hint.to_string()
        } else {
            format!("{hint}|  link down ")
        }
    }
}

#[cfg(test)]
impl Game {
    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn ball(&self) -> Projectile {
        self.ball
    }

    pub(crate) fn paddle_span(&self) -> std::ops::RangeInclusive<i8> {
        self.paddle.span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::TestLink;

    const IDLE: FrameInput = FrameInput {
        left: false,
        right: false,
        confirm: false,
    };

    const CONFIRM: FrameInput = FrameInput {
        left: false,
        right: false,
        confirm: true,
    };

    const RIGHT: FrameInput = FrameInput {
        left: false,
        right: true,
        confirm: false,
    };

    fn tick(game: &mut Game, now: Instant, input: &FrameInput, link: &mut TestLink) {
        game.tick(now, input, link).expect("no protocol error");
    }

    /// Run the opening coin toss to completion; the scripted opponent byte
    /// decides which way it goes.
    fn play_toss(game: &mut Game, link: &mut TestLink, opponent: u8) {
        let now = Instant::now();
        assert_eq!(game.state(), State::Begin);
        tick(game, now, &CONFIRM, link); // leave the start prompt
        link.push_inbound(&[opponent]);
        tick(game, now, &CONFIRM, link); // lock in the default Rock
    }

    #[test]
    fn winning_the_toss_leads_to_ball_select() {
        let mut game = Game::new(MatrixTheme::Amber);
        let mut link = TestLink::new();
        play_toss(&mut game, &mut link, b'S'); // Rock beats Scissors
        assert_eq!(game.state(), State::BallSelect);
        assert_eq!(link.sent, vec![b'R']);
    }

    #[test]
    fn losing_the_toss_leads_to_waiting() {
        let mut game = Game::new(MatrixTheme::Amber);
        let mut link = TestLink::new();
        play_toss(&mut game, &mut link, b'P'); // Paper beats Rock
        assert_eq!(game.state(), State::Waiting);
    }

    #[test]
    fn tied_toss_stays_in_begin_and_replays() {
        let mut game = Game::new(MatrixTheme::Amber);
        let mut link = TestLink::new();
        play_toss(&mut game, &mut link, b'R');
        assert_eq!(game.state(), State::Begin);

        // replay: cycle to Paper, opponent sends Rock again
        let now = Instant::now();
        tick(&mut game, now, &RIGHT, &mut link);
        link.push_inbound(&[b'R']);
        tick(&mut game, now, &CONFIRM, &mut link);
        assert_eq!(game.state(), State::BallSelect);
    }

    #[test]
    fn straight_serve_crosses_the_field_and_hands_off() {
        let mut game = Game::new(MatrixTheme::Amber);
        let mut link = TestLink::new();
        play_toss(&mut game, &mut link, b'S');
        let now = Instant::now();

        // serve the default direction, straight up
        tick(&mut game, now, &CONFIRM, &mut link);
        assert_eq!(game.state(), State::GameOn);
        assert_eq!(
            game.ball(),
            Projectile {
                x: 3,
                y: 0,
                delta_x: 0,
                delta_y: 1,
            }
        );

        // straight flight integrates every BALL_TICKS / 2 frames
        for expected_y in 1..=4 {
            for _ in 0..(BALL_TICKS / 2) {
                tick(&mut game, now, &IDLE, &mut link);
            }
            assert_eq!(game.ball().y, expected_y);
        }
        assert_eq!(game.state(), State::GameOn);

        // the next integration crosses the far edge
        for _ in 0..(BALL_TICKS / 2) {
            tick(&mut game, now, &IDLE, &mut link);
        }
        assert_eq!(game.state(), State::Waiting);
        assert_eq!(link.sent, vec![b'R', 3, 4, 0, 0xFF]);
    }

    #[test]
    fn received_ball_resumes_simulation_with_authority() {
        let mut game = Game::new(MatrixTheme::Amber);
        let mut link = TestLink::new();
        play_toss(&mut game, &mut link, b'P');
        assert_eq!(game.state(), State::Waiting);
        let now = Instant::now();

        // bytes trickle in across frames; the paddle stays live throughout
        link.push_inbound(&[3, 4]);
        tick(&mut game, now, &RIGHT, &mut link);
        assert_eq!(game.state(), State::Waiting);
        assert_eq!(game.paddle_span(), 3..=5);

        link.push_inbound(&[1, 0xFF]);
        tick(&mut game, now, &IDLE, &mut link);
        assert_eq!(game.state(), State::GameOn);
        assert_eq!(
            game.ball(),
            Projectile {
                x: 3,
                y: 4,
                delta_x: 1,
                delta_y: -1,
            }
        );
    }

    #[test]
    fn miss_shows_the_glyph_then_returns_to_ball_select() {
        let mut game = Game::new(MatrixTheme::Amber);
        let mut link = TestLink::new();
        play_toss(&mut game, &mut link, b'P');

        // a ball dropping straight down the left edge, far from the paddle
        link.push_inbound(&[0, 0, 0, 0xFF]);
        let t0 = Instant::now();
        tick(&mut game, t0, &IDLE, &mut link);
        assert_eq!(game.state(), State::GameOn);

        for _ in 0..(BALL_TICKS / 2) {
            tick(&mut game, t0, &IDLE, &mut link);
        }
        // the point is over but the glyph holds the state
        assert_eq!(game.state(), State::GameOn);

        // input cannot skip the hold
        tick(&mut game, t0 + LOSE_HOLD / 2, &CONFIRM, &mut link);
        assert_eq!(game.state(), State::GameOn);

        // once the hold elapses the loser serves again
        tick(&mut game, t0 + LOSE_HOLD, &IDLE, &mut link);
        assert_eq!(game.state(), State::BallSelect);
    }

    #[test]
    fn serve_direction_cycles_and_initializes_the_ball() {
        let mut game = Game::new(MatrixTheme::Amber);
        let mut link = TestLink::new();
        play_toss(&mut game, &mut link, b'S');
        let now = Instant::now();

        // N -> NNE -> NE
        tick(&mut game, now, &RIGHT, &mut link);
        tick(&mut game, now, &RIGHT, &mut link);
        tick(&mut game, now, &CONFIRM, &mut link);
        assert_eq!(game.state(), State::GameOn);
        assert_eq!(
            game.ball(),
            Projectile {
                x: 3,
                y: 0,
                delta_x: 1,
                delta_y: 1,
            }
        );
    }
}
