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
use std::ops::RangeInclusive;

use anyhow::{ensure, Result};
use cgmath::{vec3, Vector3};

use crate::block_face::BlockFace;

/// Edge length of a chunk, in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// A 3D coordinate of a block in the world. A block spans `[x, x+1)` on each axis.
///
/// Note that the impls of PartialOrd and Ord are meant for tiebreaking (e.g. for sorted data structures) and don't
/// have a lot of semantic meaning on their own.
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct BlockCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Debug for BlockCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("[{}, {}, {}]", self.x, self.y, self.z))
    }
}

impl BlockCoordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn chunk(&self) -> ChunkCoordinate {
        ChunkCoordinate {
            x: self.x.div_euclid(CHUNK_SIZE),
            y: self.y.div_euclid(CHUNK_SIZE),
            z: self.z.div_euclid(CHUNK_SIZE),
        }
    }

    pub fn try_delta(&self, x: i32, y: i32, z: i32) -> Option<BlockCoordinate> {
        let x = self.x.checked_add(x)?;
        let y = self.y.checked_add(y)?;
        let z = self.z.checked_add(z)?;

        Some(BlockCoordinate { x, y, z })
    }

    /// The neighbouring block in the given direction. Saturates at the edge of the world.
    #[inline]
    pub fn relative(&self, face: BlockFace) -> BlockCoordinate {
        BlockCoordinate {
            x: self.x.saturating_add(face.mod_x()),
            y: self.y.saturating_add(face.mod_y()),
            z: self.z.saturating_add(face.mod_z()),
        }
    }

    #[inline]
    pub fn up(&self) -> BlockCoordinate {
        self.relative(BlockFace::UP)
    }

    #[inline]
    pub fn down(&self) -> BlockCoordinate {
        self.relative(BlockFace::DOWN)
    }

    /// Centre of the block.
    pub fn mid(&self) -> Vector3<f64> {
        vec3(self.mid_x(), self.mid_y(), self.mid_z())
    }
    pub fn mid_x(&self) -> f64 {
        self.x as f64 + 0.5
    }
    pub fn mid_y(&self) -> f64 {
        self.y as f64 + 0.5
    }
    pub fn mid_z(&self) -> f64 {
        self.z as f64 + 0.5
    }

    /// Returns the Manhattan distance between the two coordinates
    pub fn manhattan_distance(&self, other: BlockCoordinate) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
            .saturating_add(self.z.abs_diff(other.z))
    }

    /// The block that contains the given continuous position.
    pub fn containing(position: Vector3<f64>) -> Result<BlockCoordinate> {
        Ok(BlockCoordinate {
            x: try_floor(position.x)?,
            y: try_floor(position.y)?,
            z: try_floor(position.z)?,
        })
    }
}

#[inline]
fn try_floor(value: f64) -> Result<i32> {
    ensure!(value.is_finite(), "val was not finite");
    let value = value.floor();
    ensure!(
        value <= (i32::MAX as f64) && value >= (i32::MIN as f64),
        "Value is out of bounds as i32"
    );
    Ok(value as i32)
}

/// Represents a location of a map chunk.
///
/// Each coordinate spans 16 blocks, covering the range [chunk_coord.x * 16, chunk_coord.x * 16 + 15].
/// e.g. chunk 0,1,2 covers x:[0, 15], y:[16, 31], z:[32, 47]
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoordinate {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        let result = Self { x, y, z };
        debug_assert!(result.is_in_bounds());
        result
    }

    /// Returns true if the coordinate is in-bounds. Because *block* coordinates need to
    /// fit into an i32, not every possible chunk coordinate is actually in-bounds.
    pub fn is_in_bounds(&self) -> bool {
        const BOUNDS_RANGE: RangeInclusive<i32> =
            (i32::MIN / CHUNK_SIZE)..=(i32::MAX / CHUNK_SIZE);
        BOUNDS_RANGE.contains(&self.x)
            && BOUNDS_RANGE.contains(&self.y)
            && BOUNDS_RANGE.contains(&self.z)
    }

    /// Adds the given offset to the coordinate, and returns it, if it is in-bounds.
    pub fn try_delta(&self, x: i32, y: i32, z: i32) -> Option<ChunkCoordinate> {
        let x = self.x.checked_add(x)?;
        let y = self.y.checked_add(y)?;
        let z = self.z.checked_add(z)?;
        let candidate = ChunkCoordinate { x, y, z };
        if candidate.is_in_bounds() {
            Some(candidate)
        } else {
            None
        }
    }
}

impl Debug for ChunkCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("chunk[{}, {}, {}]", self.x, self.y, self.z))
    }
}
