//! Piecewise particle trajectory.
//!
//! An ordered, contiguous sequence of helix pieces representing a
//! particle whose momentum changes discretely at material crossings.
//! Piece `i+1` begins where piece `i` ends; begin times are strictly
//! increasing.

use log::warn;

use crate::constants::TBUFF;
use crate::time_range::TimeRange;
use crate::trajectory::{LoopHelix, MomBasis};
use crate::vectors::{Mom4, Vec3, Vec4};

#[derive(Clone, Debug)]
pub struct PiecewiseTrajectory {
    pieces: Vec<LoopHelix>,
}

impl PiecewiseTrajectory {
    /// Start a piecewise trajectory from a single piece.
    pub fn new(piece: LoopHelix) -> Self {
        Self { pieces: vec![piece] }
    }

    pub fn pieces(&self) -> &[LoopHelix] {
        &self.pieces
    }

    pub fn front(&self) -> &LoopHelix {
        self.pieces.first().expect("piecewise trajectory is never empty")
    }

    pub fn back(&self) -> &LoopHelix {
        self.pieces.last().expect("piecewise trajectory is never empty")
    }

    /// Total range `[first.begin, last.end)`.
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.front().range().begin(), self.back().range().end())
    }

    pub fn in_range(&self, t: f64) -> bool {
        self.range().in_range(t)
    }

    pub fn mass(&self) -> f64 {
        self.front().mass()
    }

    pub fn charge(&self) -> i32 {
        self.front().charge()
    }

    /// Index of the piece whose range contains `t`, clamped to the end
    /// pieces when `t` lies outside the total range.
    pub fn nearest_index(&self, t: f64) -> usize {
        // pieces are ordered by begin time; the containing piece is the
        // last one beginning at or before t
        let n = self.pieces.partition_point(|p| p.range().begin() <= t);
        n.saturating_sub(1)
    }

    pub fn nearest_piece(&self, t: f64) -> &LoopHelix {
        &self.pieces[self.nearest_index(t)]
    }

    /// Append a piece at the back.
    ///
    /// The piece must begin no earlier than the current back piece's
    /// begin (within the piece buffer). Appending earlier than that is a
    /// caller bug: the new begin is clamped forward, or, when only one
    /// piece exists, the front piece is pulled back to accommodate.
    pub fn append(&mut self, mut piece: LoopHelix) {
        let back_begin = self.back().range().begin();
        if piece.range().begin() < back_begin - TBUFF {
            if self.pieces.len() == 1 {
                // pull the single front piece back instead
                let front = &mut self.pieces[0];
                let mut range = *front.range();
                range.set_begin(piece.range().begin() - TBUFF);
                front.set_range(range);
            } else {
                warn!(
                    "out-of-order append at {} before back piece begin {}; clamping",
                    piece.range().begin(),
                    back_begin
                );
                let mut range = *piece.range();
                range.set_begin(back_begin + TBUFF);
                range.set_end(range.end().max(back_begin + 2.0 * TBUFF));
                piece.set_range(range);
            }
        }
        // close the previous back piece at the new begin
        let begin = piece.range().begin();
        let prev = self.pieces.last_mut().expect("piecewise trajectory is never empty");
        let mut prange = *prev.range();
        prange.set_end(begin);
        prev.set_range(prange);
        self.pieces.push(piece);
    }

    pub fn position3(&self, t: f64) -> Vec3 {
        self.nearest_piece(t).position3(t)
    }

    pub fn position4(&self, t: f64) -> Vec4 {
        self.nearest_piece(t).position4(t)
    }

    pub fn momentum3(&self, t: f64) -> Vec3 {
        self.nearest_piece(t).momentum3(t)
    }

    pub fn momentum4(&self, t: f64) -> Mom4 {
        self.nearest_piece(t).momentum4(t)
    }

    /// Scalar momentum in MeV/c.
    pub fn momentum(&self, t: f64) -> f64 {
        self.nearest_piece(t).momentum(t)
    }

    pub fn velocity(&self, t: f64) -> Vec3 {
        self.nearest_piece(t).velocity(t)
    }

    pub fn direction(&self, t: f64, basis: MomBasis) -> Vec3 {
        self.nearest_piece(t).direction(t, basis)
    }
}
