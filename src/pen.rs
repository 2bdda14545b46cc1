// ============================================================================
// pen.rs — Branches
// Growth agents: identity, position on the torus, facing, and the per-tick
// move / branch / turn rule.
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::config::{BRANCH_THRESHOLD, CANVAS_SIZE, DRAW_SIDES, TURN_THRESHOLD};

// ======================== Random Draws ========================

/// Source of uniform integer draws in `[0, sides)`.
pub trait Dice {
    fn roll(&mut self, sides: u32) -> u32;
}

impl<R: Rng + ?Sized> Dice for R {
    fn roll(&mut self, sides: u32) -> u32 {
        self.gen_range(0..sides)
    }
}

// ======================== Facing ========================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    Up,
    Right,
    Down,
    Left,
}

impl Facing {
    /// Clockwise order; rotation is arithmetic on the index.
    pub const ALL: [Facing; 4] = [Facing::Up, Facing::Right, Facing::Down, Facing::Left];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    pub fn clockwise(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn counterclockwise(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn random<D: Dice + ?Sized>(dice: &mut D) -> Self {
        Self::from_index(dice.roll(4) as usize)
    }
}

// ======================== Identity ========================

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PenId(u64);

static NEXT_PEN_ID: AtomicU64 = AtomicU64::new(0);

impl PenId {
    fn next() -> Self {
        PenId(NEXT_PEN_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

// ======================== Pen ========================

#[derive(Clone, Debug)]
pub struct Pen {
    id: PenId,
    x: u32,
    y: u32,
    facing: Facing,
}

/// What a single [`Pen::step`] decided after moving.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepAction {
    Straight,
    Turned,
    Branched { siblings: usize },
}

impl Pen {
    /// New pen with a fresh identity. Coordinates are wrapped onto the canvas.
    pub fn new(x: u32, y: u32, facing: Facing) -> Self {
        Self {
            id: PenId::next(),
            x: x % CANVAS_SIZE,
            y: y % CANVAS_SIZE,
            facing,
        }
    }

    /// The pen every cycle starts from: canvas center, random facing.
    pub fn seed<D: Dice + ?Sized>(dice: &mut D) -> Self {
        Self::new(CANVAS_SIZE / 2, CANVAS_SIZE / 2, Facing::random(dice))
    }

    pub fn id(&self) -> PenId {
        self.id
    }

    /// Always on the canvas: only `new` (which wraps) and `advance` set it.
    pub fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Move one cell forward on the torus.
    pub fn advance(&mut self) {
        let last = CANVAS_SIZE - 1;
        match self.facing {
            Facing::Up => self.y = if self.y == 0 { last } else { self.y - 1 },
            Facing::Down => self.y = if self.y == last { 0 } else { self.y + 1 },
            Facing::Left => self.x = if self.x == 0 { last } else { self.x - 1 },
            Facing::Right => self.x = if self.x == last { 0 } else { self.x + 1 },
        }
    }

    /// Advance, then maybe branch or turn. Siblings start at the new position
    /// and are pushed to `out`; they never act in the tick that created them.
    pub fn step<D: Dice + ?Sized>(&mut self, dice: &mut D, out: &mut Vec<Pen>) -> StepAction {
        self.advance();

        if dice.roll(DRAW_SIDES) > BRANCH_THRESHOLD {
            let before = out.len();
            match dice.roll(3) {
                0 => out.push(Pen::new(self.x, self.y, self.facing.clockwise())),
                1 => out.push(Pen::new(self.x, self.y, self.facing.counterclockwise())),
                _ => {
                    out.push(Pen::new(self.x, self.y, self.facing.clockwise()));
                    out.push(Pen::new(self.x, self.y, self.facing.counterclockwise()));
                }
            }
            StepAction::Branched {
                siblings: out.len() - before,
            }
        } else if dice.roll(DRAW_SIDES) > TURN_THRESHOLD {
            self.facing = if dice.roll(2) == 0 {
                self.facing.clockwise()
            } else {
                self.facing.counterclockwise()
            };
            StepAction::Turned
        } else {
            StepAction::Straight
        }
    }
}
