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

//! Queries used to decide whether two carts can form or stay in a train.

use traincarts_core::MapView;

use super::Cart;
use crate::settings::TrainCartsConfig;
use crate::walker;

/// How many rail blocks to walk when looking for another cart.
fn max_steps(config: &TrainCartsConfig) -> usize {
    config.max_cart_distance.ceil().max(0.0) as usize + 2
}

impl Cart {
    /// Whether `other` is within `max_cart_distance`. Height only counts when either cart
    /// is derailed or climbing a vertical rail.
    pub fn is_near_of(&self, other: &Cart, config: &TrainCartsConfig) -> bool {
        let max = config.max_cart_distance;
        let dx = self.position.x - other.position.x;
        let dz = self.position.z - other.position.z;
        if dx * dx + dz * dz > max * max {
            return false;
        }
        if self.is_derailed()
            || self.is_on_vertical()
            || other.is_derailed()
            || other.is_on_vertical()
        {
            return (self.position.y - other.position.y).abs() <= max;
        }
        true
    }

    /// Whether this cart can follow the rails to `other`.
    pub fn is_following_on_track(
        &self,
        other: &Cart,
        map: &dyn MapView,
        config: &TrainCartsConfig,
    ) -> bool {
        if !self.is_near_of(other, config) {
            return false;
        }
        // Derailed carts keep their train together
        if self.is_derailed() || other.is_derailed() {
            return true;
        }
        let own = self.rail_pos();
        let target = other.rail_pos();
        if own == target {
            return true;
        }
        let steps = max_steps(config);
        if self.is_moving() {
            walker::can_reach(map, own, self.direction_to(), target, steps)
                || walker::is_connected(map, own, target, true, steps)
        } else {
            walker::is_connected(map, own, target, false, steps)
        }
    }
}

/// Whether two carts are linked by rails, looking from whichever of them is moving.
pub fn is_track_connected(
    a: &Cart,
    b: &Cart,
    map: &dyn MapView,
    config: &TrainCartsConfig,
) -> bool {
    match (a.is_moving(), b.is_moving()) {
        (true, true) => {
            a.is_following_on_track(b, map, config) || b.is_following_on_track(a, map, config)
        }
        (true, false) => a.is_following_on_track(b, map, config),
        (false, true) => b.is_following_on_track(a, map, config),
        (false, false) => {
            let steps = max_steps(config);
            a.is_near_of(b, config)
                && walker::is_connected(map, a.rail_pos(), b.rail_pos(), false, steps)
        }
    }
}
