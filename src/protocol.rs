use std::error::Error;
use std::fmt::{self, Display};

use crate::game::FrameInput;
use crate::projectile::Projectile;

// ---------------------------------------------------------------------------
// The byte link the two devices share
// ---------------------------------------------------------------------------

/// One end of the point-to-point link. Sends are fire-and-forget and receives
/// are non-blocking polls; the transport below is assumed to deliver bytes
/// in order. Corruption and loss have no recovery path here.
pub trait ByteLink {
    fn send(&mut self, byte: u8);
    fn try_recv(&mut self) -> Option<u8>;
}

// ---------------------------------------------------------------------------
// Ball handoff: four bytes, fixed order (x, y, delta_x, delta_y)
// ---------------------------------------------------------------------------

/// Hand the ball to the opponent. The mirror into their frame happens here,
/// on the sending side, and nowhere else.
pub fn send_ball(link: &mut dyn ByteLink, ball: Projectile) {
    let wire = ball.into_remote_frame();
    link.send(wire.x as u8);
    link.send(wire.y as u8);
    link.send(wire.delta_x as u8);
    link.send(wire.delta_y as u8);
}

/// Reassembles an inbound ball one byte at a time. Polled every frame while
/// the device is waiting, so local input stays live; zero, some, or all of
/// the four bytes may arrive between two polls.
#[derive(Debug)]
pub struct BallReceiver {
    bytes: [u8; 4],
    filled: usize,
}

impl BallReceiver {
    pub fn new() -> Self {
        Self {
            bytes: [0; 4],
            filled: 0,
        }
    }

    pub fn poll(&mut self, link: &mut dyn ByteLink) -> Option<Projectile> {
        while self.filled < self.bytes.len() {
            self.bytes[self.filled] = link.try_recv()?;
            self.filled += 1;
        }
        self.filled = 0;
        Some(Projectile {
            x: self.bytes[0] as i8,
            y: self.bytes[1] as i8,
            delta_x: self.bytes[2] as i8,
            delta_y: self.bytes[3] as i8,
        })
    }
}

// ---------------------------------------------------------------------------
// Coin toss: one round of rock/paper/scissors decides who serves first
// ---------------------------------------------------------------------------

/// A player's choice. The wire encoding is the ASCII initial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// Both sides restart a tied round from this choice.
    pub const DEFAULT: Choice = Choice::Rock;

    pub fn wire(self) -> u8 {
        match self {
            Choice::Rock => b'R',
            Choice::Paper => b'P',
            Choice::Scissors => b'S',
        }
    }

    pub fn next(self) -> Self {
        match self {
            Choice::Rock => Choice::Paper,
            Choice::Paper => Choice::Scissors,
            Choice::Scissors => Choice::Rock,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Choice::Rock => Choice::Scissors,
            Choice::Paper => Choice::Rock,
            Choice::Scissors => Choice::Paper,
        }
    }

    fn beats(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Paper, Choice::Rock)
                | (Choice::Scissors, Choice::Paper)
        )
    }
}

impl TryFrom<u8> for Choice {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'R' => Ok(Choice::Rock),
            b'P' => Ok(Choice::Paper),
            b'S' => Ok(Choice::Scissors),
            other => Err(ProtocolError::UnknownChoice(other)),
        }
    }
}

/// How the toss came out for the local side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TossOutcome {
    /// Won: this side picks the serve direction.
    Serve,
    /// Lost: the opponent serves, expect an inbound handoff.
    Receive,
}

/// One symmetric coin-toss exchange, polled per frame. The opponent's byte
/// may arrive before the local choice is confirmed; reception never blocks
/// choice-cycling. A tie resets both sides to the same default and the round
/// runs again.
#[derive(Debug)]
pub struct CoinToss {
    choice: Choice,
    confirmed: bool,
    theirs: Option<Choice>,
}

impl CoinToss {
    pub fn new() -> Self {
        Self {
            choice: Choice::DEFAULT,
            confirmed: false,
            theirs: None,
        }
    }

    pub fn choice(&self) -> Choice {
        self.choice
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn poll(
        &mut self,
        input: &FrameInput,
        link: &mut dyn ByteLink,
    ) -> Result<Option<TossOutcome>, ProtocolError> {
        if !self.confirmed {
            if input.right {
                self.choice = self.choice.next();
            } else if input.left {
                self.choice = self.choice.prev();
            }
            if input.confirm {
                link.send(self.choice.wire());
                self.confirmed = true;
            }
        }

        if self.theirs.is_none() {
            if let Some(byte) = link.try_recv() {
                self.theirs = Some(Choice::try_from(byte)?);
            }
        }

        match (self.confirmed, self.theirs) {
            (true, Some(theirs)) if self.choice == theirs => {
                *self = CoinToss::new();
                Ok(None)
            }
            (true, Some(theirs)) if self.choice.beats(theirs) => Ok(Some(TossOutcome::Serve)),
            (true, Some(_)) => Ok(Some(TossOutcome::Receive)),
            _ => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire decoding errors
// ---------------------------------------------------------------------------

/// A byte that decodes to none of the defined values. The transport is
/// trusted, so this indicates a peer speaking a different protocol, not a
/// transmission fault to recover from.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum ProtocolError {
    UnknownChoice(u8),
    UnknownDirection(u8),
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownChoice(byte) => {
                write!(f, "unknown coin-toss choice byte 0x{byte:02x}")
            }
            ProtocolError::UnknownDirection(byte) => {
                write!(f, "unknown serve direction value {byte}")
            }
        }
    }
}

impl Error for ProtocolError {}

// ---------------------------------------------------------------------------
// In-memory link for tests
// ---------------------------------------------------------------------------
