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

use crate::cart::CartId;
use crate::settings::TrainCartsConfig;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TrainId(pub u64);

/// Sources of automatic slowdown a train can opt out of.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SlowdownMode {
    /// Velocity decays every tick while on rails.
    Friction,
    /// Slopes and vertical rails pull carts downward.
    Gravity,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainProperties {
    pub speed_limit: f64,
    pub cart_distance: f64,
    pub manual_movement_allowed: bool,
    slow_friction: bool,
    slow_gravity: bool,
}

impl TrainProperties {
    pub fn from_config(config: &TrainCartsConfig) -> TrainProperties {
        TrainProperties {
            speed_limit: config.default_speed_limit,
            cart_distance: config.cart_distance,
            manual_movement_allowed: false,
            slow_friction: true,
            slow_gravity: true,
        }
    }

    pub fn is_slowing_down(&self, mode: SlowdownMode) -> bool {
        match mode {
            SlowdownMode::Friction => self.slow_friction,
            SlowdownMode::Gravity => self.slow_gravity,
        }
    }

    pub fn set_slowing_down(&mut self, mode: SlowdownMode, enabled: bool) {
        match mode {
            SlowdownMode::Friction => self.slow_friction = enabled,
            SlowdownMode::Gravity => self.slow_gravity = enabled,
        }
    }
}

/// An ordered chain of carts. Index 0 is the head.
///
/// Membership is only changed through [crate::railway::Railway].
#[derive(Clone, Debug)]
pub struct Train {
    id: TrainId,
    members: Vec<CartId>,
    properties: TrainProperties,
    last_tick: Option<u64>,
}

impl Train {
    pub(crate) fn new(id: TrainId, members: Vec<CartId>, properties: TrainProperties) -> Train {
        Train {
            id,
            members,
            properties,
            last_tick: None,
        }
    }

    pub fn id(&self) -> TrainId {
        self.id
    }
    pub fn members(&self) -> &[CartId] {
        &self.members
    }
    pub fn len(&self) -> usize {
        self.members.len()
    }
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
    pub fn head(&self) -> Option<CartId> {
        self.members.first().copied()
    }
    pub fn tail(&self) -> Option<CartId> {
        self.members.last().copied()
    }
    pub fn index_of(&self, cart: CartId) -> Option<usize> {
        self.members.iter().position(|&x| x == cart)
    }
    pub fn contains(&self, cart: CartId) -> bool {
        self.index_of(cart).is_some()
    }

    /// The member `offset` places away from `cart`, toward the tail for positive offsets.
    pub fn neighbour(&self, cart: CartId, offset: isize) -> Option<CartId> {
        let index = self.index_of(cart)?.checked_add_signed(offset)?;
        self.members.get(index).copied()
    }

    pub fn properties(&self) -> &TrainProperties {
        &self.properties
    }
    pub fn properties_mut(&mut self) -> &mut TrainProperties {
        &mut self.properties
    }

    /// The last tick this train's physics ran in.
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Records that the train is being ticked. Returns false if it already ran this tick.
    pub(crate) fn mark_ticked(&mut self, tick: u64) -> bool {
        if self.last_tick == Some(tick) {
            false
        } else {
            self.last_tick = Some(tick);
            true
        }
    }

    pub(crate) fn set_last_tick(&mut self, tick: Option<u64>) {
        self.last_tick = tick;
    }

    pub(crate) fn reverse_members(&mut self) {
        self.members.reverse();
    }

    pub(crate) fn append(&mut self, members: Vec<CartId>) {
        self.members.extend(members);
    }

    pub(crate) fn split_off(&mut self, index: usize) -> Vec<CartId> {
        self.members.split_off(index)
    }

    pub(crate) fn take_members(&mut self) -> Vec<CartId> {
        std::mem::take(&mut self.members)
    }

    pub(crate) fn remove_member(&mut self, index: usize) -> CartId {
        self.members.remove(index)
    }
}
