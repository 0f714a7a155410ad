use crate::paddle::Paddle;
use crate::protocol::ProtocolError;

/// Play field, in the device-local frame: x runs 0..=6 across the matrix,
/// y runs 0..=4 with y = 0 at this player's near edge (where the paddle sits)
/// and y = 4 at the far edge facing the opponent.
pub const MAX_X: i8 = 6;
pub const MAX_Y: i8 = 4;

/// Every serve leaves from the middle of the near edge.
pub const SERVE_X: i8 = 3;
pub const SERVE_Y: i8 = 0;

/// The seven compass directions a serving player can pick from,
/// left to right across the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    Wnw,
    Nw,
    Nnw,
    N,
    Nne,
    Ne,
    Ene,
}

impl StartPosition {
    /// Serve velocity for each direction. The vertical component keeps its
    /// magnitude for the life of the point; only its sign changes on bounces.
    pub fn velocity(self) -> (i8, i8) {
        match self {
            StartPosition::Wnw => (-2, 1),
            StartPosition::Nw => (-1, 1),
            StartPosition::Nnw => (-1, 2),
            StartPosition::N => (0, 1),
            StartPosition::Nne => (1, 2),
            StartPosition::Ne => (1, 1),
            StartPosition::Ene => (2, 1),
        }
    }

    /// Field cell lit up as a preview while this direction is being picked.
    pub fn marker(self) -> (i8, i8) {
        match self {
            StartPosition::Wnw => (1, 1),
            StartPosition::Nw => (1, 2),
            StartPosition::Nnw => (2, 2),
            StartPosition::N => (3, 3),
            StartPosition::Nne => (4, 2),
            StartPosition::Ne => (5, 2),
            StartPosition::Ene => (5, 1),
        }
    }

    /// One step leftward (toward WNW), stopping at the end of the arc.
    pub fn prev(self) -> Self {
        match self {
            StartPosition::Wnw | StartPosition::Nw => StartPosition::Wnw,
            StartPosition::Nnw => StartPosition::Nw,
            StartPosition::N => StartPosition::Nnw,
            StartPosition::Nne => StartPosition::N,
            StartPosition::Ne => StartPosition::Nne,
            StartPosition::Ene => StartPosition::Ne,
        }
    }

    /// One step rightward (toward ENE), stopping at the end of the arc.
    pub fn next(self) -> Self {
        match self {
            StartPosition::Wnw => StartPosition::Nw,
            StartPosition::Nw => StartPosition::Nnw,
            StartPosition::Nnw => StartPosition::N,
            StartPosition::N => StartPosition::Nne,
            StartPosition::Nne => StartPosition::Ne,
            StartPosition::Ne | StartPosition::Ene => StartPosition::Ene,
        }
    }
}

impl TryFrom<u8> for StartPosition {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StartPosition::Wnw),
            1 => Ok(StartPosition::Nw),
            2 => Ok(StartPosition::Nnw),
            3 => Ok(StartPosition::N),
            4 => Ok(StartPosition::Nne),
            5 => Ok(StartPosition::Ne),
            6 => Ok(StartPosition::Ene),
            other => Err(ProtocolError::UnknownDirection(other)),
        }
    }
}

/// What a single physics step did with the ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    /// Ball still in flight on this device.
    None,
    /// Ball came off the paddle.
    Bounce,
    /// Ball crossed the near edge with no paddle under it; the point is over.
    Miss,
    /// Ball crossed the far edge; simulation authority moves to the opponent.
    Sent,
}

/// The ball. Exactly one of the two linked devices simulates it at a time;
/// after a `Sent` event the local copy is dead until a new one arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projectile {
    pub x: i8,
    pub y: i8,
    pub delta_x: i8,
    pub delta_y: i8,
}

impl Projectile {
    pub fn serve(position: StartPosition) -> Self {
        let (delta_x, delta_y) = position.velocity();
        Self {
            x: SERVE_X,
            y: SERVE_Y,
            delta_x,
            delta_y,
        }
    }

    /// One simulation step against the local paddle.
    ///
    /// Checks, in order: paddle bounce, near-edge miss, far-edge handoff.
    /// The side walls are clamped independently of those, and the velocity is
    /// integrated into the position afterwards. On `Miss` and `Sent` the ball
    /// is left where it was; the state machine takes over from there.
    pub fn advance(&mut self, paddle: &Paddle) -> FieldEvent {
        let mut event = FieldEvent::None;

        if self.hits(paddle) {
            self.y = 0;
            self.delta_y = -self.delta_y;

            // Re-aim off the strike position: the half of the paddle nearer
            // the top field edge returns the ball left, the other half right,
            // dead center keeps the current angle.
            let span = paddle.span();
            let mid = (span.start() + span.end()) / 2;
            if self.x < mid {
                self.delta_x = -1;
            } else if self.x > mid {
                self.delta_x = 1;
            }
            event = FieldEvent::Bounce;
        } else if self.y + self.delta_y < 0 {
            return FieldEvent::Miss;
        } else if self.y + self.delta_y > MAX_Y {
            return FieldEvent::Sent;
        }

        if self.x + self.delta_x < 0 {
            self.x = 0;
            self.delta_x = -self.delta_x;
        } else if self.x + self.delta_x > MAX_X {
            self.x = MAX_X;
            self.delta_x = -self.delta_x;
        }

        self.x += self.delta_x;
        self.y += self.delta_y;
        event
    }

    fn hits(&self, paddle: &Paddle) -> bool {
        paddle.span().contains(&self.x) && self.y + self.delta_y <= 0 && self.delta_y < 0
    }

    /// Re-express the ball in the opposing device's frame: its x axis runs the
    /// other way and the ball flies away from us, toward its owner's paddle.
    /// Applied exactly once, at the handoff boundary; applying it twice gives
    /// back the original.
    pub fn into_remote_frame(self) -> Self {
        Self {
            x: MAX_X - self.x,
            y: self.y,
            delta_x: -self.delta_x,
            delta_y: -self.delta_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid_paddle() -> Paddle {
        // fresh paddle: span 2..=4 in the ball frame, midpoint 3
        Paddle::new()
    }

    #[test]
    fn serve_table_is_exact() {
        let cases = [
            (StartPosition::Wnw, (-2, 1)),
            (StartPosition::Nw, (-1, 1)),
            (StartPosition::Nnw, (-1, 2)),
            (StartPosition::N, (0, 1)),
            (StartPosition::Nne, (1, 2)),
            (StartPosition::Ne, (1, 1)),
            (StartPosition::Ene, (2, 1)),
        ];
        for (position, (dx, dy)) in cases {
            let ball = Projectile::serve(position);
            assert_eq!((ball.x, ball.y), (SERVE_X, SERVE_Y), "{position:?}");
            assert_eq!((ball.delta_x, ball.delta_y), (dx, dy), "{position:?}");
        }
    }

    #[test]
    fn out_of_range_direction_is_an_error() {
        assert!(StartPosition::try_from(6).is_ok());
        assert_eq!(
            StartPosition::try_from(7),
            Err(ProtocolError::UnknownDirection(7))
        );
        assert_eq!(
            StartPosition::try_from(255),
            Err(ProtocolError::UnknownDirection(255))
        );
    }

    #[test]
    fn direction_cycling_saturates_at_both_ends() {
        assert_eq!(StartPosition::Wnw.prev(), StartPosition::Wnw);
        assert_eq!(StartPosition::Ene.next(), StartPosition::Ene);
        assert_eq!(StartPosition::N.next(), StartPosition::Nne);
        assert_eq!(StartPosition::N.prev(), StartPosition::Nnw);
    }

    #[test]
    fn ball_over_paddle_bounces_instead_of_missing() {
        let paddle = mid_paddle();
        let mut ball = Projectile {
            x: 3,
            y: 0,
            delta_x: 0,
            delta_y: -1,
        };
        let event = ball.advance(&paddle);
        assert_eq!(event, FieldEvent::Bounce);
        assert!(ball.delta_y > 0);
        assert_eq!(ball.y, 1); // snapped to the edge, then integrated upward
    }

    #[test]
    fn bounce_reaims_by_strike_position() {
        let paddle = mid_paddle(); // span 2..=4, midpoint 3

        let mut above = Projectile {
            x: 2,
            y: 0,
            delta_x: 1,
            delta_y: -1,
        };
        assert_eq!(above.advance(&paddle), FieldEvent::Bounce);
        assert_eq!(above.delta_x, -1);

        let mut below = Projectile {
            x: 4,
            y: 0,
            delta_x: -1,
            delta_y: -1,
        };
        assert_eq!(below.advance(&paddle), FieldEvent::Bounce);
        assert_eq!(below.delta_x, 1);

        // dead center keeps both the sign and the magnitude
        let mut center = Projectile {
            x: 3,
            y: 0,
            delta_x: -2,
            delta_y: -1,
        };
        assert_eq!(center.advance(&paddle), FieldEvent::Bounce);
        assert_eq!(center.delta_x, -2);
    }

    #[test]
    fn crossing_the_near_edge_without_a_paddle_is_a_miss() {
        let paddle = mid_paddle(); // covers x 2..=4
        let mut ball = Projectile {
            x: 0,
            y: 0,
            delta_x: 0,
            delta_y: -1,
        };
        let before = ball;
        assert_eq!(ball.advance(&paddle), FieldEvent::Miss);
        assert_eq!(ball, before);
    }

    #[test]
    fn crossing_the_far_edge_hands_off() {
        let paddle = mid_paddle();
        let mut ball = Projectile {
            x: 3,
            y: 4,
            delta_x: 0,
            delta_y: 1,
        };
        let before = ball;
        assert_eq!(ball.advance(&paddle), FieldEvent::Sent);
        assert_eq!(ball, before);
    }

    #[test]
    fn side_walls_clamp_and_reflect() {
        let paddle = mid_paddle();

        let mut right = Projectile {
            x: 6,
            y: 2,
            delta_x: 1,
            delta_y: 1,
        };
        assert_eq!(right.advance(&paddle), FieldEvent::None);
        assert_eq!(right.delta_x, -1);
        assert_eq!(right.x, 5); // clamped to 6, reflected, then integrated

        let mut left = Projectile {
            x: 0,
            y: 2,
            delta_x: -1,
            delta_y: 1,
        };
        assert_eq!(left.advance(&paddle), FieldEvent::None);
        assert_eq!(left.delta_x, 1);
        assert_eq!(left.x, 1);
    }

    #[test]
    fn wall_reflection_also_applies_on_a_bounce_tick() {
        use crate::paddle::Slide;

        // paddle slid all the way right: span 4..=6, midpoint 5
        let mut paddle = mid_paddle();
        paddle.slide(Slide::Right);
        paddle.slide(Slide::Right);
        assert_eq!(paddle.span(), 4..=6);

        // strikes the end of the paddle sitting on the wall; the re-aim sends
        // it into the wall and the clamp reflects it on the same tick
        let mut ball = Projectile {
            x: 6,
            y: 0,
            delta_x: 0,
            delta_y: -1,
        };
        assert_eq!(ball.advance(&paddle), FieldEvent::Bounce);
        assert_eq!(ball.delta_x, -1);
        assert_eq!((ball.x, ball.y), (5, 1));
    }

    #[test]
    fn remote_frame_mirror_is_an_involution() {
        let ball = Projectile {
            x: 5,
            y: 4,
            delta_x: 2,
            delta_y: 1,
        };
        let mirrored = ball.into_remote_frame();
        assert_eq!(mirrored, Projectile {
            x: 1,
            y: 4,
            delta_x: -2,
            delta_y: -1,
        });
        assert_eq!(mirrored.into_remote_frame(), ball);
    }
}
