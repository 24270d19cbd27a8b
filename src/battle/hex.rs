//! Hex coordinate system for scenario maps (axial and cube coordinates)
//!
//! Positions are stored in axial coordinates (q, r). Cube coordinates add the
//! redundant `s = -q - r` and are used for distance and rounding. Every
//! function here is pure.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

use crate::core::error::{HexhavenError, Result};

/// Axial hex coordinate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

/// Cube hex coordinate. Always satisfies `q + r + s == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeCoord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl CubeCoord {
    /// Build a cube coordinate. Panics if the zero-sum constraint is broken,
    /// which can only happen through a programming error.
    pub fn new(q: i32, r: i32, s: i32) -> Self {
        assert!(q + r + s == 0, "cube coordinate ({q}, {r}, {s}) does not sum to 0");
        Self { q, r, s }
    }

    /// Checked constructor for coordinates coming from outside the engine
    pub fn try_new(q: i32, r: i32, s: i32) -> Result<Self> {
        if q + r + s != 0 {
            return Err(HexhavenError::InvalidCube { q, r, s });
        }
        Ok(Self { q, r, s })
    }

    pub fn to_axial(self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }

    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s - other.s).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Round fractional cube coordinates to the nearest hex.
    ///
    /// The component with the largest rounding error is recomputed from the
    /// other two so the result keeps q + r + s = 0.
    pub fn round(q: f64, r: f64, s: f64) -> Self {
        let mut rq = q.round();
        let mut rr = r.round();
        let mut rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        } else {
            rs = -rq - rr;
        }

        Self::new(rq as i32, rr as i32, rs as i32)
    }
}

impl From<HexCoord> for CubeCoord {
    fn from(hex: HexCoord) -> Self {
        hex.to_cube()
    }
}

impl From<CubeCoord> for HexCoord {
    fn from(cube: CubeCoord) -> Self {
        cube.to_axial()
    }
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    pub fn to_cube(self) -> CubeCoord {
        CubeCoord::new(self.q, self.r, self.s())
    }

    /// Hex distance: (|dq| + |dr| + |ds|) / 2
    pub fn distance(&self, other: &Self) -> u32 {
        self.to_cube().distance(&other.to_cube())
    }

    /// The neighbouring hex in a direction
    pub fn neighbor(&self, direction: HexDirection) -> HexCoord {
        *self + direction.offset()
    }

    /// Get all 6 neighboring hex coordinates, in `HexDirection::all()` order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        HexDirection::all().map(|d| self.neighbor(d))
    }

    /// Get hex coordinates in a line from self to other (inclusive)
    ///
    /// Samples `distance + 1` evenly spaced points and rounds each one.
    pub fn line_to(&self, other: &Self) -> Vec<HexCoord> {
        let n = self.distance(other);
        if n == 0 {
            return vec![*self];
        }

        let (a, b) = (self.to_cube(), other.to_cube());
        let mut results = Vec::with_capacity(n as usize + 1);
        for i in 0..=n {
            let t = f64::from(i) / f64::from(n);
            let q = lerp(a.q, b.q, t);
            let r = lerp(a.r, b.r, t);
            let s = lerp(a.s, b.s, t);
            results.push(CubeCoord::round(q, r, s).to_axial());
        }
        results
    }

    /// Get all hexes within range (inclusive), center included
    pub fn hexes_in_range(&self, range: u32) -> Vec<HexCoord> {
        let range = signed_extent(range);
        let mut results = Vec::new();
        for q in -range..=range {
            for r in (-range).max(-q - range)..=range.min(-q + range) {
                results.push(HexCoord::new(self.q + q, self.r + r));
            }
        }
        results
    }

    /// Hexes at exactly `radius` from self, walked clockwise starting from
    /// the west corner
    pub fn ring(&self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![*self];
        }

        let radius = signed_extent(radius);
        let mut results = Vec::with_capacity(6 * radius as usize);
        let mut hex = *self + HexDirection::West.offset() * radius;
        // From the west corner each side runs two directions further round
        let walk = [
            HexDirection::SouthEast,
            HexDirection::East,
            HexDirection::NorthEast,
            HexDirection::NorthWest,
            HexDirection::West,
            HexDirection::SouthWest,
        ];
        for direction in walk {
            for _ in 0..radius {
                results.push(hex);
                hex = hex.neighbor(direction);
            }
        }
        results
    }
}

/// Largest extent whose offsets (`-q - r` and friends) stay inside `i32`
const MAX_EXTENT: i32 = i32::MAX / 2;

fn signed_extent(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX).min(MAX_EXTENT)
}

fn lerp(a: i32, b: i32, t: f64) -> f64 {
    f64::from(a) + f64::from(b - a) * t
}

impl Add for HexCoord {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Sub for HexCoord {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.q - rhs.q, self.r - rhs.r)
    }
}

impl Mul<i32> for HexCoord {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Self::new(self.q * rhs, self.r * rhs)
    }
}

/// The six hex directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// Get the hex offset for this direction
    pub fn offset(&self) -> HexCoord {
        match self {
            HexDirection::East => HexCoord::new(1, 0),
            HexDirection::NorthEast => HexCoord::new(1, -1),
            HexDirection::NorthWest => HexCoord::new(0, -1),
            HexDirection::West => HexCoord::new(-1, 0),
            HexDirection::SouthWest => HexCoord::new(-1, 1),
            HexDirection::SouthEast => HexCoord::new(0, 1),
        }
    }

    /// Direction whose offset equals `offset`, if it is a unit step
    pub fn from_offset(offset: HexCoord) -> Option<Self> {
        Self::all().into_iter().find(|d| d.offset() == offset)
    }

    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            HexDirection::East => HexDirection::West,
            HexDirection::NorthEast => HexDirection::SouthWest,
            HexDirection::NorthWest => HexDirection::SouthEast,
            HexDirection::West => HexDirection::East,
            HexDirection::SouthWest => HexDirection::NorthEast,
            HexDirection::SouthEast => HexDirection::NorthWest,
        }
    }

    /// All directions
    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::East,
            HexDirection::NorthEast,
            HexDirection::NorthWest,
            HexDirection::West,
            HexDirection::SouthWest,
            HexDirection::SouthEast,
        ]
    }
}
