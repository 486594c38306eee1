//! Dungeon features and the terrain grid

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::math::Coord;

/// Dungeon feature of a single cell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum Feature {
    #[default]
    RockWall = 0,
    StoneWall = 1,
    Tree = 2,
    ClosedDoor = 3,
    Floor = 4,
    OpenDoor = 5,
    ShallowWater = 6,
    DeepWater = 7,
    Lava = 8,
}

impl Feature {
    /// Blocks movement and projectiles
    pub const fn is_solid(&self) -> bool {
        matches!(
            self,
            Feature::RockWall | Feature::StoneWall | Feature::Tree | Feature::ClosedDoor
        )
    }

    pub const fn is_water(&self) -> bool {
        matches!(self, Feature::ShallowWater | Feature::DeepWater)
    }

    /// Something can stand or roll on it
    pub const fn has_solid_floor(&self) -> bool {
        !self.is_solid() && !matches!(self, Feature::DeepWater | Feature::Lava)
    }

    /// Description with an indefinite article, for collision messages
    pub const fn description(&self) -> &'static str {
        match self {
            Feature::RockWall => "a rock wall",
            Feature::StoneWall => "a stone wall",
            Feature::Tree => "a tree",
            Feature::ClosedDoor => "a closed door",
            Feature::Floor => "the floor",
            Feature::OpenDoor => "an open door",
            Feature::ShallowWater => "some shallow water",
            Feature::DeepWater => "some deep water",
            Feature::Lava => "some lava",
        }
    }

    pub const fn glyph(&self) -> char {
        match self {
            Feature::RockWall => '#',
            Feature::StoneWall => 'X',
            Feature::Tree => 'T',
            Feature::ClosedDoor => '+',
            Feature::Floor => '.',
            Feature::OpenDoor => '\'',
            Feature::ShallowWater => 'W',
            Feature::DeepWater => 'w',
            Feature::Lava => 'l',
        }
    }

    pub const fn from_glyph(c: char) -> Option<Feature> {
        Some(match c {
            '#' => Feature::RockWall,
            'X' => Feature::StoneWall,
            'T' => Feature::Tree,
            '+' => Feature::ClosedDoor,
            '.' => Feature::Floor,
            '\'' => Feature::OpenDoor,
            'W' => Feature::ShallowWater,
            'w' => Feature::DeepWater,
            'l' => Feature::Lava,
            _ => return None,
        })
    }
}

/// Errors from parsing an ASCII map
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("map is empty")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown map glyph '{glyph}' at {x},{y}")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
}

/// Rectangular terrain grid. The outermost ring of cells is never in bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Feature>,
}

/// A parsed ASCII map: terrain plus the positions of actor glyphs
#[derive(Debug, Clone)]
pub struct AsciiMap {
    pub grid: Grid,
    /// Letters and '@' found on the map, each standing on floor
    pub markers: Vec<(char, Coord)>,
}

impl Grid {
    /// Grid filled with rock
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Feature::RockWall; width * height],
        }
    }

    /// Open floor surrounded by a single ring of rock
    pub fn open(width: usize, height: usize) -> Self {
        let mut grid = Self::new(width, height);
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                grid.cells[y * width + x] = Feature::Floor;
            }
        }
        grid
    }

    /// Parse a map drawn with feature glyphs. Letters and '@' are actor
    /// markers on floor.
    pub fn from_ascii(text: &str) -> Result<AsciiMap, MapError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(MapError::Empty);
        };
        let width = first.chars().count();
        let height = rows.len();

        let mut grid = Self::new(width, height);
        let mut markers = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(MapError::Ragged {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let feature = match Feature::from_glyph(glyph) {
                    Some(f) => f,
                    None if glyph == '@' || glyph.is_ascii_alphabetic() => {
                        markers.push((glyph, Coord::new(x as i32, y as i32)));
                        Feature::Floor
                    }
                    None => return Err(MapError::UnknownGlyph { glyph, x, y }),
                };
                grid.cells[y * width + x] = feature;
            }
        }

        Ok(AsciiMap { grid, markers })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the cell array matches the dimensions. Only a damaged save
    /// can break this.
    pub fn is_consistent(&self) -> bool {
        self.width.checked_mul(self.height) == Some(self.cells.len())
    }

    /// Inside the map array at all
    pub fn in_map(&self, c: Coord) -> bool {
        c.x >= 0 && c.y >= 0 && (c.x as usize) < self.width && (c.y as usize) < self.height
    }

    /// Inside the playable area (excludes the outer ring)
    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x >= 1
            && c.y >= 1
            && (c.x as usize) + 1 < self.width
            && (c.y as usize) + 1 < self.height
    }

    pub(crate) fn index(&self, c: Coord) -> Option<usize> {
        self.in_map(c)
            .then(|| c.y as usize * self.width + c.x as usize)
    }

    /// Feature at a cell; anything off the map reads as rock
    pub fn feature(&self, c: Coord) -> Feature {
        self.index(c)
            .map(|i| self.cells[i])
            .unwrap_or(Feature::RockWall)
    }

    pub fn set(&mut self, c: Coord, feature: Feature) {
        if let Some(i) = self.index(c) {
            self.cells[i] = feature;
        }
    }

    pub fn is_solid(&self, c: Coord) -> bool {
        self.feature(c).is_solid()
    }

    pub fn has_floor(&self, c: Coord) -> bool {
        self.feature(c).has_solid_floor()
    }

    pub fn is_water(&self, c: Coord) -> bool {
        self.feature(c).is_water()
    }

    pub fn describe(&self, c: Coord) -> &'static str {
        self.feature(c).description()
    }
}
