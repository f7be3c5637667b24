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

//! The world as seen by the rail engine: a block shape per coordinate and a
//! loaded/unloaded bit per chunk.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::block_face::BlockFace;
use crate::coordinates::{BlockCoordinate, ChunkCoordinate};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Straight and sloped rails need a cardinal direction, got {0:?}")]
    NotCardinal(BlockFace),
    #[error("Curved rails need a sub-cardinal direction, got {0:?}")]
    NotSubCardinal(BlockFace),
    #[error("Vertical rails need a cardinal facing, got {0:?}")]
    BadVerticalFacing(BlockFace),
}

/// Shape of a regular (floor or ceiling) rail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RailData {
    direction: BlockFace,
    sloped: bool,
    upside_down: bool,
}

impl RailData {
    /// A straight rail running along the axis of `direction`.
    pub fn straight(direction: BlockFace) -> Result<RailData, MapError> {
        if !direction.is_cardinal() {
            return Err(MapError::NotCardinal(direction));
        }
        Ok(RailData {
            direction,
            sloped: false,
            upside_down: false,
        })
    }

    /// A curve. Its direction points at the corner the curve bends around; the curve
    /// connects the two faces opposite to that corner.
    pub fn curved(direction: BlockFace) -> Result<RailData, MapError> {
        if !direction.is_sub_cardinal() {
            return Err(MapError::NotSubCardinal(direction));
        }
        Ok(RailData {
            direction,
            sloped: false,
            upside_down: false,
        })
    }

    /// A slope ascending toward `direction`.
    pub fn sloped(direction: BlockFace) -> Result<RailData, MapError> {
        if !direction.is_cardinal() {
            return Err(MapError::NotCardinal(direction));
        }
        Ok(RailData {
            direction,
            sloped: true,
            upside_down: false,
        })
    }

    pub fn upside_down(self) -> RailData {
        RailData {
            upside_down: true,
            ..self
        }
    }

    pub fn direction(&self) -> BlockFace {
        self.direction
    }
    pub fn is_sloped(&self) -> bool {
        self.sloped
    }
    pub fn is_curved(&self) -> bool {
        self.direction.is_sub_cardinal()
    }
    pub fn is_upside_down(&self) -> bool {
        self.upside_down
    }

    /// The faces a cart may leave this rail through.
    pub fn connections(&self) -> SmallVec<[BlockFace; 2]> {
        if self.is_curved() {
            let [a, b] = self.direction.cardinal_components();
            smallvec![a.opposite(), b.opposite()]
        } else {
            smallvec![self.direction, self.direction.opposite()]
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VerticalRailData {
    facing: BlockFace,
}

impl VerticalRailData {
    /// A vertical rail mounted on the wall that lies toward `facing`.
    pub fn new(facing: BlockFace) -> Result<VerticalRailData, MapError> {
        if !facing.is_cardinal() {
            return Err(MapError::BadVerticalFacing(facing));
        }
        Ok(VerticalRailData { facing })
    }

    pub fn facing(&self) -> BlockFace {
        self.facing
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BlockShape {
    #[default]
    Air,
    Solid,
    Rail(RailData),
    VerticalRail(VerticalRailData),
}

impl BlockShape {
    pub fn is_solid(&self) -> bool {
        matches!(self, BlockShape::Solid)
    }
    pub fn rail(&self) -> Option<RailData> {
        match self {
            BlockShape::Rail(data) => Some(*data),
            _ => None,
        }
    }
    pub fn vertical_rail(&self) -> Option<VerticalRailData> {
        match self {
            BlockShape::VerticalRail(data) => Some(*data),
            _ => None,
        }
    }
}

/// Read-only block queries consumed by the rail engine.
pub trait MapView {
    fn block(&self, coord: BlockCoordinate) -> BlockShape;
    fn is_loaded(&self, chunk: ChunkCoordinate) -> bool;
}

/// An in-memory map. Unset blocks are air and every chunk is loaded unless
/// explicitly unloaded.
#[derive(Clone, Debug, Default)]
pub struct SparseMap {
    blocks: FxHashMap<BlockCoordinate, BlockShape>,
    unloaded: FxHashSet<ChunkCoordinate>,
}

impl SparseMap {
    pub fn new() -> SparseMap {
        SparseMap::default()
    }

    pub fn set(&mut self, coord: BlockCoordinate, shape: BlockShape) {
        if shape == BlockShape::Air {
            self.blocks.remove(&coord);
        } else {
            self.blocks.insert(coord, shape);
        }
    }

    pub fn clear(&mut self, coord: BlockCoordinate) {
        self.blocks.remove(&coord);
    }

    pub fn unload_chunk(&mut self, chunk: ChunkCoordinate) {
        self.unloaded.insert(chunk);
    }

    pub fn load_chunk(&mut self, chunk: ChunkCoordinate) {
        self.unloaded.remove(&chunk);
    }

    /// Places a rail along with the solid block it rests on (or hangs from).
    pub fn lay_rail(&mut self, coord: BlockCoordinate, rail: RailData) {
        let support = if rail.is_upside_down() {
            coord.up()
        } else {
            coord.down()
        };
        self.set(support, BlockShape::Solid);
        self.set(coord, BlockShape::Rail(rail));
    }

    /// Lays `len` straight rails starting at `start` and heading toward `direction`.
    /// Returns the coordinate of the last rail.
    pub fn lay_straight(
        &mut self,
        start: BlockCoordinate,
        direction: BlockFace,
        len: u32,
    ) -> Result<BlockCoordinate, MapError> {
        let rail = RailData::straight(direction)?;
        let mut coord = start;
        for i in 0..len {
            if i > 0 {
                coord = coord.relative(direction);
            }
            self.lay_rail(coord, rail);
        }
        Ok(coord)
    }

    /// Stacks `height` vertical rails on top of each other, starting at `base`, with
    /// a solid wall behind them. Returns the coordinate of the topmost rail.
    pub fn raise_vertical(
        &mut self,
        base: BlockCoordinate,
        facing: BlockFace,
        height: u32,
    ) -> Result<BlockCoordinate, MapError> {
        let rail = VerticalRailData::new(facing)?;
        let mut coord = base;
        for i in 0..height {
            if i > 0 {
                coord = coord.up();
            }
            self.set(coord.relative(facing), BlockShape::Solid);
            self.set(coord, BlockShape::VerticalRail(rail));
        }
        Ok(coord)
    }
}

impl MapView for SparseMap {
    fn block(&self, coord: BlockCoordinate) -> BlockShape {
        self.blocks.get(&coord).copied().unwrap_or_default()
    }

    fn is_loaded(&self, chunk: ChunkCoordinate) -> bool {
        !self.unloaded.contains(&chunk)
    }
}
