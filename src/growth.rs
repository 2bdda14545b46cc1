// ============================================================================
// growth.rs — Branches
// One simulation tick: collision against a frozen snapshot, trail drawing
// through a single batch, and deferred registry changes.
// ============================================================================

use crate::canvas::{Canvas, CanvasTexture, Rgba};
use crate::config::{BACKGROUND, OCCUPANCY_MARKER, TRAIL_SATURATION, TRAIL_VALUE};
use crate::pen::{Dice, PenId};
use crate::registry::PenRegistry;

// ======================== Trail Hue ========================

/// Hue shared by every trail pixel drawn in the same tick, in whole degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrailHue(u16);

impl TrailHue {
    pub fn new(degrees: u16) -> Self {
        Self(degrees % 360)
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    pub fn color(self) -> Rgba {
        Rgba::from_hsv(self.0 as f32, TRAIL_SATURATION, TRAIL_VALUE)
    }

    pub fn advance(&mut self) {
        self.0 = (self.0 + 1) % 360;
    }
}

// ======================== Tick ========================

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Pens that survived and left a trail pixel.
    pub drawn: usize,
    pub removed: usize,
    pub spawned: usize,
    /// Registry size after the tick.
    pub live: usize,
}

/// Advance every live pen once.
///
/// Collisions are decided against the canvas as it was before this tick, so
/// two pens entering the same empty cell in one tick both survive it. The
/// occupancy marker only discourages that, it does not prevent it.
pub fn grow<T, D>(
    pens: &mut PenRegistry,
    canvas: &mut Canvas<T>,
    hue: &mut TrailHue,
    dice: &mut D,
) -> TickReport
where
    T: CanvasTexture,
    D: Dice + ?Sized,
{
    let snapshot = canvas.snapshot();
    let mut batch = canvas.begin_batch();
    let trail = hue.color();

    let mut doomed: Vec<PenId> = Vec::new();
    let mut spawned = Vec::new();
    let mut drawn = 0;

    for pen in pens.iter_mut() {
        let (x, y) = pen.position();
        let here = snapshot.get(x, y);
        if here != BACKGROUND && here != OCCUPANCY_MARKER {
            doomed.push(pen.id());
            continue;
        }

        batch.write_pixel(x, y, trail);
        drawn += 1;
        pen.step(dice, &mut spawned);

        let (x, y) = pen.position();
        if snapshot.get(x, y) == BACKGROUND {
            batch.write_pixel(x, y, OCCUPANCY_MARKER);
        }
    }

    let removed = doomed.len();
    for id in doomed {
        log::trace!("pen {} hit a trail", id.value());
        pens.remove(id);
    }
    let spawned_count = spawned.len();
    pens.append(spawned);

    hue.advance();
    batch.commit();

    TickReport {
        drawn,
        removed,
        spawned: spawned_count,
        live: pens.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BRANCH_THRESHOLD, CANVAS_SIZE};
    use crate::pen::{Facing, Pen};
    use crate::testing::{CountingAllocator, CountingTexture, ScriptedDice};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CENTER: u32 = CANVAS_SIZE / 2;

    fn fresh_canvas() -> (CountingAllocator, Canvas<CountingTexture>) {
        let mut allocator = CountingAllocator::default();
        let canvas = Canvas::create(BACKGROUND, &mut allocator);
        (allocator, canvas)
    }

    fn paint(canvas: &mut Canvas<CountingTexture>, cells: &[(u32, u32)], color: Rgba) {
        let mut batch = canvas.begin_batch();
        for &(x, y) in cells {
            batch.write_pixel(x, y, color);
        }
        batch.commit();
    }

    #[test]
    fn hue_wraps_after_359() {
        let mut hue = TrailHue::new(358);
        hue.advance();
        assert_eq!(hue.degrees(), 359);
        hue.advance();
        assert_eq!(hue.degrees(), 0);
        assert_eq!(TrailHue::new(725).degrees(), 5);
    }

    #[test]
    fn quiet_tick_draws_trail_and_marks_next_cell() {
        let (_allocator, mut canvas) = fresh_canvas();
        let mut pens = PenRegistry::with_seed(Pen::new(CENTER, CENTER, Facing::Right));
        let mut hue = TrailHue::new(42);
        let trail = hue.color();

        let report = grow(&mut pens, &mut canvas, &mut hue, &mut ScriptedDice::default());

        assert_eq!(canvas.pixel(CENTER, CENTER), trail);
        assert_eq!(canvas.pixel(CENTER + 1, CENTER), OCCUPANCY_MARKER);
        assert_eq!(pens.len(), 1);
        let pen = pens.iter().next().expect("pen survives");
        assert_eq!(pen.facing(), Facing::Right);
        assert_eq!(pen.position(), (CENTER + 1, CENTER));
        assert_eq!(hue.degrees(), 43);
        assert_eq!(
            report,
            TickReport {
                drawn: 1,
                removed: 0,
                spawned: 0,
                live: 1
            }
        );
        assert_eq!(canvas.texture().map(|t| t.uploads()), Some(1));
        canvas.destroy();
    }

    #[test]
    fn random_tick_from_seed_keeps_one_or_two_pens() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let (_allocator, mut canvas) = fresh_canvas();
            let mut pens = PenRegistry::with_seed(Pen::seed(&mut rng));
            let mut hue = TrailHue::default();
            let trail = hue.color();

            grow(&mut pens, &mut canvas, &mut hue, &mut rng);

            assert_eq!(canvas.pixel(CENTER, CENTER), trail);
            let (x, y) = pens.iter().next().expect("seed survives").position();
            let next = canvas.pixel(x, y);
            assert!(next == OCCUPANCY_MARKER || next == trail);
            assert!(matches!(pens.len(), 1..=3));
            canvas.destroy();
        }
    }

    #[test]
    fn pen_on_a_trail_is_removed_without_drawing_or_branching() {
        let (_allocator, mut canvas) = fresh_canvas();
        let old_trail = TrailHue::new(200).color();
        paint(&mut canvas, &[(CENTER, CENTER)], old_trail);

        let mut pens = PenRegistry::with_seed(Pen::new(CENTER, CENTER, Facing::Up));
        let mut hue = TrailHue::new(10);
        // Would branch into two siblings if the pen were allowed to step.
        let mut dice = ScriptedDice::new(&[BRANCH_THRESHOLD + 1, 2]);

        let report = grow(&mut pens, &mut canvas, &mut hue, &mut dice);

        assert!(pens.is_empty());
        assert_eq!(report.removed, 1);
        assert_eq!(report.spawned, 0);
        assert_eq!(dice.remaining(), 2, "a removed pen draws nothing");
        assert_eq!(canvas.pixel(CENTER, CENTER), old_trail);
        assert_eq!(canvas.pixel(CENTER, CENTER - 1), BACKGROUND);
        canvas.destroy();
    }

    #[test]
    fn pen_built_past_the_edge_draws_on_the_wrapped_cell() {
        let (_allocator, mut canvas) = fresh_canvas();
        let mut pens = PenRegistry::with_seed(Pen::new(CANVAS_SIZE, 5, Facing::Down));
        let mut hue = TrailHue::default();
        let trail = hue.color();

        grow(&mut pens, &mut canvas, &mut hue, &mut ScriptedDice::default());

        assert_eq!(canvas.pixel(0, 5), trail);
        assert_eq!(canvas.pixel(0, 6), OCCUPANCY_MARKER);
        assert_eq!(canvas.pixel(CANVAS_SIZE - 1, 5), BACKGROUND);
        canvas.destroy();
    }

    #[test]
    fn pen_on_a_marker_survives() {
        let (_allocator, mut canvas) = fresh_canvas();
        paint(&mut canvas, &[(CENTER, CENTER)], OCCUPANCY_MARKER);
        let mut pens = PenRegistry::with_seed(Pen::new(CENTER, CENTER, Facing::Down));
        let mut hue = TrailHue::default();

        grow(&mut pens, &mut canvas, &mut hue, &mut ScriptedDice::default());

        assert_eq!(pens.len(), 1);
        assert_eq!(canvas.pixel(CENTER, CENTER), TrailHue::default().color());
        canvas.destroy();
    }

    #[test]
    fn marker_only_claims_background_cells() {
        let (_allocator, mut canvas) = fresh_canvas();
        let old_trail = TrailHue::new(90).color();
        paint(&mut canvas, &[(CENTER, CENTER - 1)], old_trail);
        let mut pens = PenRegistry::with_seed(Pen::new(CENTER, CENTER, Facing::Up));
        let mut hue = TrailHue::default();

        grow(&mut pens, &mut canvas, &mut hue, &mut ScriptedDice::default());
        assert_eq!(canvas.pixel(CENTER, CENTER - 1), old_trail);

        // Next tick it stands on that trail and dies.
        grow(&mut pens, &mut canvas, &mut hue, &mut ScriptedDice::default());
        assert!(pens.is_empty());
        canvas.destroy();
    }

    #[test]
    fn siblings_join_after_the_pass_and_do_not_act() {
        let (_allocator, mut canvas) = fresh_canvas();
        let parent = Pen::new(CENTER, CENTER, Facing::Up);
        let parent_id = parent.id();
        let mut pens = PenRegistry::with_seed(parent);
        let mut hue = TrailHue::default();
        let mut dice = ScriptedDice::new(&[BRANCH_THRESHOLD + 1, 2]);

        let report = grow(&mut pens, &mut canvas, &mut hue, &mut dice);

        assert_eq!(report.spawned, 2);
        assert_eq!(pens.len(), 3);
        let mut order = pens.iter();
        assert_eq!(order.next().map(Pen::id), Some(parent_id));
        for sibling in order {
            assert_eq!(sibling.position(), (CENTER, CENTER - 1), "siblings have not moved");
        }
        // Only the parent drew this tick.
        assert_eq!(canvas.pixel(CENTER + 1, CENTER - 1), BACKGROUND);
        assert_eq!(canvas.pixel(CENTER - 1, CENTER - 1), BACKGROUND);
        canvas.destroy();
    }

    #[test]
    fn two_pens_entering_one_cell_in_a_tick_both_survive_it() {
        let (_allocator, mut canvas) = fresh_canvas();
        let target = (CENTER, CENTER);
        let mut pens = PenRegistry::new();
        pens.append(vec![
            Pen::new(CENTER - 1, CENTER, Facing::Right),
            Pen::new(CENTER + 1, CENTER, Facing::Left),
        ]);
        let mut hue = TrailHue::default();

        let report = grow(&mut pens, &mut canvas, &mut hue, &mut ScriptedDice::default());

        assert_eq!(report.removed, 0);
        assert_eq!(pens.len(), 2);
        assert!(pens.iter().all(|p| p.position() == target));
        assert_eq!(canvas.pixel(target.0, target.1), OCCUPANCY_MARKER);

        // Both stand on a marker, so both draw there next tick and walk on.
        let report = grow(&mut pens, &mut canvas, &mut hue, &mut ScriptedDice::default());
        assert_eq!(report.drawn, 2);
        assert_eq!(pens.len(), 2);
        canvas.destroy();
    }

    #[test]
    fn registry_changes_only_by_tick_batches() {
        let (_allocator, mut canvas) = fresh_canvas();
        let mut rng = StdRng::seed_from_u64(3);
        let mut pens = PenRegistry::with_seed(Pen::seed(&mut rng));
        let mut hue = TrailHue::default();

        for _ in 0..500 {
            let before = pens.len();
            let report = grow(&mut pens, &mut canvas, &mut hue, &mut rng);
            assert_eq!(report.live, before - report.removed + report.spawned);
            assert_eq!(report.drawn + report.removed, before);
            if pens.is_empty() {
                break;
            }
        }
        canvas.destroy();
    }
}
