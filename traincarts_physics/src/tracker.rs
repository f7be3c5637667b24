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

use anyhow::{Context, Result};
use traincarts_core::{BlockCoordinate, BlockFace, MapView};

use crate::cart::Cart;
use crate::error::PhysicsError;
use crate::rails::{self, RailLogic, RailType, NONE};

/// Binds a cart to the rail block it is on and the policy governing it.
///
/// The policy is snapshotted for the duration of the movement stages, so that nothing
/// between pre-move and post-move sees it change.
#[derive(Clone, Debug)]
pub struct RailTracker {
    rail_pos: BlockCoordinate,
    rail_type: &'static dyn RailType,
    rail_logic: &'static RailLogic,
    rail_direction: BlockFace,
    snapshot: Option<&'static RailLogic>,
    last_pos: BlockCoordinate,
    last_type: &'static dyn RailType,
    last_logic: &'static RailLogic,
    /// False until the first refresh places the cart on a rail (or on none).
    resolved: bool,
}

impl RailTracker {
    pub(crate) fn new() -> RailTracker {
        let origin = BlockCoordinate::new(0, 0, 0);
        RailTracker {
            rail_pos: origin,
            rail_type: &NONE,
            rail_logic: RailLogic::air(),
            rail_direction: BlockFace::SELF,
            snapshot: None,
            last_pos: origin,
            last_type: &NONE,
            last_logic: RailLogic::air(),
            resolved: false,
        }
    }

    pub fn rail_pos(&self) -> BlockCoordinate {
        self.rail_pos
    }
    pub fn rail_type(&self) -> &'static dyn RailType {
        self.rail_type
    }
    pub fn rail_direction(&self) -> BlockFace {
        self.rail_direction
    }

    /// The policy in effect: the snapshot while one is held, else the live policy.
    pub fn rail_logic(&self) -> &'static RailLogic {
        self.snapshot.unwrap_or(self.rail_logic)
    }
    pub fn live_rail_logic(&self) -> &'static RailLogic {
        self.rail_logic
    }
    pub fn is_snapshotted(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn last_pos(&self) -> BlockCoordinate {
        self.last_pos
    }
    pub fn last_type(&self) -> &'static dyn RailType {
        self.last_type
    }
    pub fn last_logic(&self) -> &'static RailLogic {
        self.last_logic
    }
    pub fn has_block_changed(&self) -> bool {
        self.rail_pos != self.last_pos
    }
    /// Whether the tracker has been resolved against the map at least once.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn snapshot_rail_logic(&mut self) {
        self.snapshot = Some(self.rail_logic);
    }
    pub(crate) fn set_live_rail_logic(&mut self) {
        self.snapshot = None;
    }

    pub(crate) fn update_last(&mut self) {
        self.last_pos = self.rail_pos;
        self.last_type = self.rail_type;
        self.last_logic = self.rail_logic;
    }

    #[cfg(test)]
    pub(crate) fn force(&mut self, rail_pos: BlockCoordinate, logic: &'static RailLogic) {
        self.rail_pos = rail_pos;
        self.rail_logic = logic;
        self.rail_direction = logic.direction();
    }
}

impl Cart {
    /// Re-resolves the rail under the cart. Returns the old and new anchor if the cart
    /// moved onto a different rail block. The first resolve never reports a change.
    pub(crate) fn refresh_rail_tracker(
        &mut self,
        map: &dyn MapView,
    ) -> Result<Option<(BlockCoordinate, BlockCoordinate)>> {
        let candidate = BlockCoordinate::containing(self.position)
            .with_context(|| PhysicsError::NonFinitePosition(self.id, self.position))?;
        self.on_ground = candidate
            .try_delta(0, -1, 0)
            .is_some_and(|below| map.block(below).is_solid());

        let (rail_type, anchor) = rails::find_rail(map, candidate);
        let logic = rail_type.logic(self, map, anchor);
        let previous = self.rail_tracker.rail_pos;
        let was_none = self.rail_tracker.rail_type.is_none();

        let tracker = &mut self.rail_tracker;
        tracker.rail_type = rail_type;
        tracker.rail_pos = anchor;
        tracker.rail_logic = logic;
        tracker.rail_direction = rail_type.direction(map, anchor);

        if !tracker.resolved {
            tracker.resolved = true;
            tracker.update_last();
            return Ok(None);
        }
        if previous != anchor {
            if !was_none || !rail_type.is_none() {
                tracing::debug!(cart = ?self.id, from = ?previous, to = ?anchor, rail = rail_type.name(), "Rail changed");
            }
            self.on_block_change(previous, anchor);
            return Ok(Some((previous, anchor)));
        }
        Ok(None)
    }
}
