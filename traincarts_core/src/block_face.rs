// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;

use cgmath::{vec3, InnerSpace, Vector3, Zero};
use smallvec::SmallVec;

use crate::coordinates::BlockCoordinate;

/// One of the 26 directions from a block to its neighbours, or [BlockFace::SELF].
///
/// NORTH is -Z, SOUTH is +Z, EAST is +X and WEST is -X.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockFace {
    dx: i8,
    dy: i8,
    dz: i8,
}

/// Horizontal faces in clockwise notch order, starting at NORTH.
const NOTCHES: [BlockFace; 8] = [
    BlockFace::NORTH,
    BlockFace::NORTH_EAST,
    BlockFace::EAST,
    BlockFace::SOUTH_EAST,
    BlockFace::SOUTH,
    BlockFace::SOUTH_WEST,
    BlockFace::WEST,
    BlockFace::NORTH_WEST,
];

impl BlockFace {
    pub const SELF: BlockFace = BlockFace::raw(0, 0, 0);
    pub const NORTH: BlockFace = BlockFace::raw(0, 0, -1);
    pub const EAST: BlockFace = BlockFace::raw(1, 0, 0);
    pub const SOUTH: BlockFace = BlockFace::raw(0, 0, 1);
    pub const WEST: BlockFace = BlockFace::raw(-1, 0, 0);
    pub const UP: BlockFace = BlockFace::raw(0, 1, 0);
    pub const DOWN: BlockFace = BlockFace::raw(0, -1, 0);
    pub const NORTH_EAST: BlockFace = BlockFace::raw(1, 0, -1);
    pub const SOUTH_EAST: BlockFace = BlockFace::raw(1, 0, 1);
    pub const SOUTH_WEST: BlockFace = BlockFace::raw(-1, 0, 1);
    pub const NORTH_WEST: BlockFace = BlockFace::raw(-1, 0, -1);

    pub const CARDINALS: [BlockFace; 4] = [
        BlockFace::NORTH,
        BlockFace::EAST,
        BlockFace::SOUTH,
        BlockFace::WEST,
    ];

    const fn raw(dx: i8, dy: i8, dz: i8) -> BlockFace {
        BlockFace { dx, dy, dz }
    }

    /// Builds a face from per-axis signs. Returns None if any component is outside [-1, 1].
    pub fn new(dx: i32, dy: i32, dz: i32) -> Option<BlockFace> {
        let range = -1..=1;
        if range.contains(&dx) && range.contains(&dy) && range.contains(&dz) {
            Some(BlockFace::raw(dx as i8, dy as i8, dz as i8))
        } else {
            None
        }
    }

    /// All 26 faces, excluding SELF.
    pub fn all() -> impl Iterator<Item = BlockFace> {
        (-1..=1)
            .flat_map(|dx| (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| (dx, dy, dz))))
            .filter(|&(dx, dy, dz)| dx != 0 || dy != 0 || dz != 0)
            .map(|(dx, dy, dz)| BlockFace::raw(dx, dy, dz))
    }

    /// The face whose components are the signs of the difference between two blocks.
    pub fn between(from: BlockCoordinate, to: BlockCoordinate) -> BlockFace {
        BlockFace::raw(
            (to.x - from.x).signum() as i8,
            (to.y - from.y).signum() as i8,
            (to.z - from.z).signum() as i8,
        )
    }

    #[inline]
    pub fn mod_x(&self) -> i32 {
        self.dx as i32
    }
    #[inline]
    pub fn mod_y(&self) -> i32 {
        self.dy as i32
    }
    #[inline]
    pub fn mod_z(&self) -> i32 {
        self.dz as i32
    }

    pub fn opposite(&self) -> BlockFace {
        BlockFace::raw(-self.dx, -self.dy, -self.dz)
    }

    pub fn is_self(&self) -> bool {
        *self == BlockFace::SELF
    }
    /// True for faces with a vertical component and no horizontal one.
    pub fn is_vertical(&self) -> bool {
        self.dy != 0 && self.dx == 0 && self.dz == 0
    }
    /// True for faces with a horizontal component and no vertical one.
    pub fn is_horizontal(&self) -> bool {
        self.dy == 0 && (self.dx != 0 || self.dz != 0)
    }
    pub fn is_cardinal(&self) -> bool {
        self.dy == 0 && (self.dx == 0) != (self.dz == 0)
    }
    pub fn is_sub_cardinal(&self) -> bool {
        self.dy == 0 && self.dx != 0 && self.dz != 0
    }
    pub fn is_along_x(&self) -> bool {
        self.dx != 0 && self.dy == 0 && self.dz == 0
    }
    pub fn is_along_y(&self) -> bool {
        self.is_vertical()
    }
    pub fn is_along_z(&self) -> bool {
        self.dz != 0 && self.dx == 0 && self.dy == 0
    }

    /// This face with its vertical component dropped.
    pub fn horizontal(&self) -> BlockFace {
        BlockFace::raw(self.dx, 0, self.dz)
    }

    /// Clockwise position from NORTH in 45 degree steps, if horizontal.
    pub fn notch(&self) -> Option<usize> {
        NOTCHES.iter().position(|x| x == self)
    }

    pub fn from_notch(notch: i32) -> BlockFace {
        NOTCHES[notch.rem_euclid(8) as usize]
    }

    /// Rotates a horizontal face clockwise by the given number of 45 degree notches.
    /// Other faces are returned unchanged.
    pub fn rotate(&self, notches: i32) -> BlockFace {
        match self.notch() {
            Some(n) => BlockFace::from_notch(n as i32 + notches),
            None => *self,
        }
    }

    pub fn vector(&self) -> Vector3<f64> {
        vec3(self.dx as f64, self.dy as f64, self.dz as f64)
    }

    pub fn unit_vector(&self) -> Vector3<f64> {
        if self.is_self() {
            Vector3::zero()
        } else {
            self.vector().normalize()
        }
    }

    /// X component of the normalized horizontal direction; 0 for faces without one.
    pub fn cos(&self) -> f64 {
        match self.horizontal_length() {
            Some(len) => self.dx as f64 / len,
            None => 0.0,
        }
    }

    /// Z component of the normalized horizontal direction; 0 for faces without one.
    pub fn sin(&self) -> f64 {
        match self.horizontal_length() {
            Some(len) => self.dz as f64 / len,
            None => 0.0,
        }
    }

    fn horizontal_length(&self) -> Option<f64> {
        if self.dx == 0 && self.dz == 0 {
            None
        } else {
            Some(((self.dx as f64).powi(2) + (self.dz as f64).powi(2)).sqrt())
        }
    }

    /// Yaw in degrees, as atan2(dz, dx). EAST is 0 and SOUTH is 90.
    pub fn yaw(&self) -> f64 {
        if self.dx == 0 && self.dz == 0 {
            0.0
        } else {
            (self.dz as f64).atan2(self.dx as f64).to_degrees()
        }
    }

    /// The cardinal faces making up this face's horizontal part, north/south first.
    /// A cardinal face returns itself twice.
    pub fn cardinal_components(&self) -> [BlockFace; 2] {
        match (self.dx, self.dz) {
            (0, 0) => [*self, *self],
            (dx, 0) => [BlockFace::raw(dx, 0, 0); 2],
            (0, dz) => [BlockFace::raw(0, 0, dz); 2],
            (dx, dz) => [BlockFace::raw(0, 0, dz), BlockFace::raw(dx, 0, 0)],
        }
    }

    /// The horizontal faces in the given list that form a positive dot product with this face.
    pub fn aligned_with(&self, candidates: &[BlockFace]) -> SmallVec<[BlockFace; 4]> {
        let v = self.vector();
        candidates
            .iter()
            .filter(|c| c.vector().dot(v) > 0.0)
            .copied()
            .collect()
    }

    /// Quantizes the horizontal part of a vector to a face. Returns SELF if the vector
    /// has no horizontal part.
    pub fn from_vector(v: Vector3<f64>, allow_sub_cardinal: bool) -> BlockFace {
        if v.x * v.x + v.z * v.z < 1e-12 {
            return BlockFace::SELF;
        }
        let yaw = v.z.atan2(v.x).to_degrees();
        if allow_sub_cardinal {
            BlockFace::from_notch(((yaw + 90.0) / 45.0).round() as i32)
        } else {
            BlockFace::from_notch(2 * ((yaw + 90.0) / 90.0).round() as i32)
        }
    }
}

impl Debug for BlockFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vertical = match self.dy {
            1 => "UP",
            -1 => "DOWN",
            _ => "",
        };
        let horizontal = match (self.dx, self.dz) {
            (0, -1) => "NORTH",
            (1, -1) => "NORTH_EAST",
            (1, 0) => "EAST",
            (1, 1) => "SOUTH_EAST",
            (0, 1) => "SOUTH",
            (-1, 1) => "SOUTH_WEST",
            (-1, 0) => "WEST",
            (-1, -1) => "NORTH_WEST",
            _ => "",
        };
        match (vertical.is_empty(), horizontal.is_empty()) {
            (true, true) => f.write_str("SELF"),
            (false, false) => write!(f, "{}_{}", vertical, horizontal),
            (true, false) => f.write_str(horizontal),
            (false, true) => f.write_str(vertical),
        }
    }
}
