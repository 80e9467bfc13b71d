use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::{Coordinate, MAX_EXTENT};

/// Remaining chocolate of a Chomp game.
///
/// The shape is a staircase stored as its boundary corners: sorted by descending
/// `x`, with strictly increasing `y`. Every corner spans the rectangle
/// `[1, x] × [1, y]` and the union of those rectangles is the playable area.
/// No corner dominates another. An empty corner list is the terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    corners: Vec<Coordinate>,
}

impl Region {
    /// Creates the full `width × height` bar.
    pub fn new(width: u8, height: u8) -> Self {
        debug_assert!(
            width <= MAX_EXTENT && height <= MAX_EXTENT,
            "region extents are capped at {MAX_EXTENT}"
        );
        if width == 0 || height == 0 {
            return Self::default();
        }
        Self {
            corners: vec![Coordinate::new(width, height)],
        }
    }

    /// Builds a region from boundary corners given in any order.
    /// Returns `None` when the corners do not form a valid staircase.
    pub fn from_corners<I>(corners: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut corners: Vec<Coordinate> = corners.into_iter().collect();
        let in_range =
            |c: &Coordinate| (1..=MAX_EXTENT).contains(&c.x) && (1..=MAX_EXTENT).contains(&c.y);
        if !corners.iter().all(in_range) {
            return None;
        }

        corners.sort_by(|left, right| right.x.cmp(&left.x));
        if corners
            .windows(2)
            .any(|pair| pair[0].x <= pair[1].x || pair[0].y >= pair[1].y)
        {
            return None;
        }

        Some(Self { corners })
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// Boundary corners, largest `x` first.
    pub fn corners(&self) -> &[Coordinate] {
        &self.corners
    }

    /// Extent along the column axis (0 when empty).
    pub fn width(&self) -> u8 {
        self.corners.first().map_or(0, |corner| corner.x)
    }

    /// Extent along the row axis (0 when empty).
    pub fn height(&self) -> u8 {
        self.corners.last().map_or(0, |corner| corner.y)
    }

    /// Returns whether `cell` is still on the bar, i.e. is a legal move.
    pub fn contains(&self, cell: Coordinate) -> bool {
        cell.x >= 1 && cell.y >= 1 && self.corners.iter().any(|corner| corner.dominates(cell))
    }

    /// Number of remaining cells.
    pub fn cell_count(&self) -> u16 {
        let mut covered_rows = 0u16;
        let mut total = 0u16;
        for corner in &self.corners {
            let rows = u16::from(corner.y) - covered_rows;
            total += u16::from(corner.x) * rows;
            covered_rows = u16::from(corner.y);
        }
        total
    }

    /// Every legal move, each cell exactly once.
    ///
    /// Order: corners from widest to narrowest; within a corner, columns advance
    /// fastest, then rows. Rows already covered by a wider corner are skipped, so the
    /// first move is always `(1, 1)` and the last is the top of the narrowest corner.
    pub fn moves(&self) -> Moves<'_> {
        Moves {
            corners: &self.corners,
            index: 0,
            col: 1,
            row: 1,
        }
    }

    /// Removes `cell` and everything up-and-right of it.
    /// Returns `false` and leaves the region untouched when `cell` is not a legal move.
    pub fn chomp(&mut self, cell: Coordinate) -> bool {
        if cell.x < 1 || cell.y < 1 {
            return false;
        }
        let Some(start) = self.corners.iter().position(|corner| corner.dominates(cell)) else {
            return false;
        };

        // Corners containing `cell` form one contiguous run.
        let end = self.corners[start..]
            .iter()
            .position(|corner| !corner.dominates(cell))
            .map_or(self.corners.len(), |offset| start + offset);
        let widest = self.corners[start].x;
        let tallest = self.corners[end - 1].y;
        self.corners.drain(start..end);

        if cell.y > 1 {
            self.insert_corner(Coordinate::new(widest, cell.y - 1));
        }
        if cell.x > 1 {
            self.insert_corner(Coordinate::new(cell.x - 1, tallest));
        }

        true
    }

    /// Compact key: bit `2x - 1` marks a corner in column `x`, bit `2y - 2` a corner
    /// in row `y`. A staircase has at most one corner per row and per column, so the
    /// key is injective for extents up to 16.
    pub fn key(&self) -> u32 {
        self.corners.iter().fold(0u32, |key, corner| {
            let x = u32::from(corner.x);
            let y = u32::from(corner.y);
            key | (1 << (2 * x - 1)) | (1 << (2 * y - 2))
        })
    }

    fn insert_corner(&mut self, corner: Coordinate) {
        if self.corners.iter().any(|existing| existing.dominates(corner)) {
            return;
        }
        let at = self.corners.partition_point(|existing| existing.x > corner.x);
        self.corners.insert(at, corner);
    }
}

impl Hash for Region {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.key());
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = usize::from(self.width());
        let mut row = 0u8;
        for corner in &self.corners {
            let filled = usize::from(corner.x);
            while row < corner.y {
                writeln!(f, "{}{}", " ".repeat(width - filled), "X".repeat(filled))?;
                row += 1;
            }
        }
        Ok(())
    }
}

/// Iterator returned by [`Region::moves`].
#[derive(Debug, Clone)]
pub struct Moves<'a> {
    corners: &'a [Coordinate],
    index: usize,
    col: u8,
    row: u8,
}

impl Iterator for Moves<'_> {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        loop {
            let corner = *self.corners.get(self.index)?;
            if self.row > corner.y {
                // The next corner is taller; its lower rows were emitted already.
                self.index += 1;
                continue;
            }

            let cell = Coordinate::new(self.col, self.row);
            if self.col == corner.x {
                self.col = 1;
                self.row += 1;
            } else {
                self.col += 1;
            }
            return Some(cell);
        }
    }
}
