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

//! Classification of world blocks into rail types.

use std::fmt::Debug;

use cgmath::Vector3;
use smallvec::SmallVec;
use traincarts_core::{BlockCoordinate, BlockFace, BlockShape, MapView};

use crate::cart::Cart;

pub mod logic;
mod none;
mod regular;
mod vertical;

pub use logic::{RailLogic, RailLogicKind, VerticalSlopeKind};
pub use none::NoRail;
pub use regular::RegularRail;
pub use vertical::VerticalRail;

pub static REGULAR: RegularRail = RegularRail;
pub static VERTICAL: VerticalRail = VerticalRail;
/// Returned wherever no rail is found. Never matches a block.
pub static NONE: NoRail = NoRail;

/// Rail types in the order they are tried.
pub static RAIL_TYPES: [&dyn RailType; 2] = [&VERTICAL, &REGULAR];

/// Where a cart placed on a rail ends up, and which way it faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnLocation {
    pub position: Vector3<f64>,
    pub yaw: f64,
}

pub trait RailType: Debug + Sync {
    fn name(&self) -> &'static str;

    fn is_rail(&self, block: BlockShape) -> bool;

    /// True only for the type used when no rail is present.
    fn is_none(&self) -> bool {
        false
    }

    /// Finds the anchor of the rail governing a cart whose position lies in `candidate`.
    fn find_rail(&self, map: &dyn MapView, candidate: BlockCoordinate) -> Option<BlockCoordinate>;

    /// The block a cart sits in while on the given rail.
    fn find_minecart_pos(&self, track: BlockCoordinate) -> BlockCoordinate {
        track
    }

    /// Directions a cart may leave the rail in.
    fn possible_directions(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
    ) -> SmallVec<[BlockFace; 2]>;

    /// Maps a heading onto one of [RailType::possible_directions], if it can be.
    fn resolve_direction(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        heading: BlockFace,
    ) -> Option<BlockFace>;

    /// The block a cart reaches after leaving `track` in `direction`. The result is a
    /// candidate and still has to go through [find_rail].
    fn next_pos(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        direction: BlockFace,
    ) -> Option<BlockCoordinate>;

    /// The direction of the rail block itself.
    fn direction(&self, map: &dyn MapView, track: BlockCoordinate) -> BlockFace;

    /// The movement policy for a cart on this rail. Always returns a policy.
    fn logic(&self, cart: &Cart, map: &dyn MapView, track: BlockCoordinate) -> &'static RailLogic;

    fn spawn_location(
        &self,
        map: &dyn MapView,
        track: BlockCoordinate,
        direction: BlockFace,
    ) -> SpawnLocation;

    fn is_upside_down(&self, _map: &dyn MapView, _track: BlockCoordinate) -> bool {
        false
    }

    fn is_vertical(&self) -> bool {
        false
    }

    /// Called for the type of a block a cart runs into. Returning false lets the cart pass.
    fn on_collide(&self, _cart: &Cart, _block: BlockCoordinate, _hit_face: BlockFace) -> bool {
        true
    }

    /// Called for the cart's own rail type when it runs into a block. Returning false lets
    /// the cart pass.
    fn on_block_collision(
        &self,
        _cart: &Cart,
        _rail: BlockCoordinate,
        _hit_block: BlockCoordinate,
        _hit_face: BlockFace,
    ) -> bool {
        true
    }

    /// Whether hitting `hit_block` should stop the whole train.
    fn is_head_on_collision(
        &self,
        cart: &Cart,
        rail: BlockCoordinate,
        hit_block: BlockCoordinate,
    ) -> bool {
        let face = BlockFace::between(rail, hit_block).horizontal();
        !face.is_self() && (cart.direction_to == Some(face) || cart.direction() == face)
    }

    fn on_pre_move(&self, _cart: &mut Cart) {}

    fn on_post_move(&self, _cart: &mut Cart) {}
}

/// Finds the rail governing a cart whose position lies in `candidate`, falling back to [NONE].
pub fn find_rail(
    map: &dyn MapView,
    candidate: BlockCoordinate,
) -> (&'static dyn RailType, BlockCoordinate) {
    for rail_type in RAIL_TYPES {
        if let Some(anchor) = rail_type.find_rail(map, candidate) {
            return (rail_type, anchor);
        }
    }
    (&NONE, candidate)
}

/// The rail type of a single block, without searching neighbouring blocks.
pub fn rail_type_of(map: &dyn MapView, block: BlockCoordinate) -> &'static dyn RailType {
    let shape = map.block(block);
    RAIL_TYPES
        .iter()
        .copied()
        .find(|t| t.is_rail(shape))
        .unwrap_or(&NONE)
}
