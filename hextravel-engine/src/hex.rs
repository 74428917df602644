//! Axial hex coordinates and the pure geometry the travel engine builds on.
//!
//! Coordinates are pointy-top axial `(q, r)` with the implicit cube axis
//! `s = -q - r`. Every function here is total over integer inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

use crate::constants::LINE_NUDGE;
use crate::numbers::round_f64_to_i32;

/// Integer hex coordinate in the axial system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct AxialCoord {
    pub q: i32,
    pub r: i32,
}

impl AxialCoord {
    pub const ORIGIN: Self = Self { q: 0, r: 0 };

    /// The six unit offsets, starting east and turning counter-clockwise.
    pub const DIRECTIONS: [Self; 6] = [
        Self { q: 1, r: 0 },
        Self { q: 1, r: -1 },
        Self { q: 0, r: -1 },
        Self { q: -1, r: 0 },
        Self { q: -1, r: 1 },
        Self { q: 0, r: 1 },
    ];

    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Implicit third cube axis.
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> u32 {
        distance(self, other)
    }

    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        neighbors(self)
    }

    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        distance(self, other) == 1
    }
}

impl Add for AxialCoord {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.q + other.q, self.r + other.r)
    }
}

impl Sub for AxialCoord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.q - other.q, self.r - other.r)
    }
}

impl fmt::Display for AxialCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.q, self.r)
    }
}

/// Failure to parse a `q,r` coordinate string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseCoordError {
    #[error("expected `q,r` but got {0:?}")]
    Shape(String),
    #[error("invalid {axis} component {value:?}")]
    Component { axis: &'static str, value: String },
}

impl FromStr for AxialCoord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((q, r)) = s.split_once(',') else {
            return Err(ParseCoordError::Shape(s.to_string()));
        };
        let parse = |axis: &'static str, raw: &str| {
            raw.trim()
                .parse::<i32>()
                .map_err(|_| ParseCoordError::Component {
                    axis,
                    value: raw.trim().to_string(),
                })
        };
        Ok(Self::new(parse("q", q)?, parse("r", r)?))
    }
}

/// Hex distance: the largest absolute cube-axis delta.
#[must_use]
pub fn distance(a: AxialCoord, b: AxialCoord) -> u32 {
    let dq = (i64::from(a.q) - i64::from(b.q)).unsigned_abs();
    let dr = (i64::from(a.r) - i64::from(b.r)).unsigned_abs();
    let ds = (i64::from(a.s()) - i64::from(b.s())).unsigned_abs();
    u32::try_from(dq.max(dr).max(ds)).unwrap_or(u32::MAX)
}

#[must_use]
pub fn neighbors(a: AxialCoord) -> [AxialCoord; 6] {
    AxialCoord::DIRECTIONS.map(|d| a + d)
}

/// Every hex on the straight line from `a` to `b`, both endpoints included.
///
/// Samples `distance(a, b) + 1` evenly spaced points in cube space and rounds
/// each to its hex, so consecutive entries are always adjacent. The line is
/// always traced from the smaller endpoint, which makes `line(b, a)` the exact
/// reverse of `line(a, b)`.
#[must_use]
pub fn line(a: AxialCoord, b: AxialCoord) -> Vec<AxialCoord> {
    if b < a {
        let mut reversed = line(b, a);
        reversed.reverse();
        return reversed;
    }
    let steps = distance(a, b);
    if steps == 0 {
        return vec![a];
    }

    let (aq, ar) = (f64::from(a.q) + LINE_NUDGE, f64::from(a.r) + LINE_NUDGE);
    let (bq, br) = (f64::from(b.q) + LINE_NUDGE, f64::from(b.r) + LINE_NUDGE);
    let total = f64::from(steps);
    (0..=steps)
        .map(|i| {
            let t = f64::from(i) / total;
            cube_round(lerp(aq, bq, t), lerp(ar, br, t))
        })
        .collect()
}

/// All hexes within `radius` of `center`, center included.
#[must_use]
pub fn coords_in_radius(center: AxialCoord, radius: u32) -> Vec<AxialCoord> {
    let n = i32::try_from(radius).unwrap_or(i32::MAX);
    let mut out = Vec::new();
    for dq in -n..=n {
        let lo = (-n).max(-dq - n);
        let hi = n.min(-dq + n);
        for dr in lo..=hi {
            out.push(center + AxialCoord::new(dq, dr));
        }
    }
    out
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn cube_round(fq: f64, fr: f64) -> AxialCoord {
    let fs = -fq - fr;
    let mut q = fq.round();
    let mut r = fr.round();
    let s = fs.round();

    let dq = (q - fq).abs();
    let dr = (r - fr).abs();
    let ds = (s - fs).abs();

    if dq > dr && dq > ds {
        q = -r - s;
    } else if dr > ds {
        r = -q - s;
    }
    AxialCoord::new(round_f64_to_i32(q), round_f64_to_i32(r))
}
