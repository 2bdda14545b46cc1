// ============================================================================
// testing.rs — Branches
// Test doubles: scripted random draws and a texture allocator that counts.
// ============================================================================

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::canvas::{CanvasTexture, Rgba, TextureAllocator};
use crate::pen::Dice;

/// Replays queued draws in order; returns 0 once the queue is empty, which
/// means "no branch, no turn" for a pen.
#[derive(Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn new(rolls: &[u32]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        let value = self.rolls.pop_front().unwrap_or(0);
        assert!(value < sides, "scripted roll {value} out of range for {sides} sides");
        value
    }
}

// ======================== Textures ========================

#[derive(Default)]
pub struct CountingAllocator {
    allocated: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
}

impl CountingAllocator {
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }

    /// Handle that keeps reading the counters after the allocator is moved.
    pub fn counters(&self) -> Counters {
        Counters {
            allocated: Rc::clone(&self.allocated),
            released: Rc::clone(&self.released),
        }
    }
}

pub struct Counters {
    allocated: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
}

impl Counters {
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }

    pub fn live(&self) -> usize {
        self.allocated() - self.released()
    }
}

impl TextureAllocator for CountingAllocator {
    type Texture = CountingTexture;

    fn allocate(&mut self, side: u32, pixels: &[Rgba]) -> CountingTexture {
        assert_eq!(pixels.len(), (side * side) as usize);
        self.allocated.set(self.allocated.get() + 1);
        CountingTexture {
            uploads: 0,
            last_upload_len: 0,
            released: Rc::clone(&self.released),
            is_released: false,
        }
    }
}

pub struct CountingTexture {
    uploads: usize,
    last_upload_len: usize,
    released: Rc<Cell<usize>>,
    is_released: bool,
}

impl CountingTexture {
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn last_upload_len(&self) -> usize {
        self.last_upload_len
    }
}

impl CanvasTexture for CountingTexture {
    fn upload(&mut self, pixels: &[Rgba]) {
        assert!(!self.is_released, "upload after release");
        self.uploads += 1;
        self.last_upload_len = pixels.len();
    }

    fn release(&mut self) {
        assert!(!self.is_released, "texture released twice");
        self.is_released = true;
        self.released.set(self.released.get() + 1);
    }
}
