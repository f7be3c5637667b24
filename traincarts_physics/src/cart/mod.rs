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

use cgmath::{vec3, InnerSpace, Vector3, Zero};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use traincarts_core::{BlockCoordinate, BlockFace, MapView};

use crate::rails::{RailLogic, RailType};
use crate::settings::TrainCartsConfig;
use crate::tracker::RailTracker;
use crate::train::TrainId;

pub mod connectivity;
mod direction;
pub(crate) mod physics;

/// Carts die once their accumulated damage exceeds this.
pub const MAXIMUM_DAMAGE_SUSTAINED: f64 = 40.0;
/// Speeds below this count as standing still.
const MIN_MOVE_SPEED: f64 = 0.001;
/// Chunks in each horizontal direction that must be loaded around a cart.
const LOADED_CHUNK_RANGE: i32 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CartId(pub u64);

/// Someone riding a cart.
#[derive(Clone, Debug, PartialEq)]
pub struct Passenger {
    pub dead: bool,
    /// The passenger's own movement input, as a velocity.
    pub velocity: Vector3<f64>,
    /// Forward input, positive when walking forward.
    pub forward_movement: f64,
    pub look_direction: Vector3<f64>,
}

impl Default for Passenger {
    fn default() -> Self {
        Passenger {
            dead: false,
            velocity: Vector3::zero(),
            forward_movement: 0.0,
            look_direction: Vector3::zero(),
        }
    }
}

/// A single rail vehicle.
#[derive(Clone, Debug)]
pub struct Cart {
    pub(crate) id: CartId,
    pub(crate) train: Option<TrainId>,
    pub(crate) position: Vector3<f64>,
    pub(crate) last_position: Vector3<f64>,
    /// Displacement over the previous tick.
    pub(crate) moved: Vector3<f64>,
    pub(crate) velocity: Vector3<f64>,
    pub(crate) yaw: f64,
    pub(crate) pitch: f64,
    pub(crate) direction: Option<BlockFace>,
    pub(crate) direction_to: Option<BlockFace>,
    pub(crate) direction_from: Option<BlockFace>,
    pub(crate) shaking: u32,
    pub(crate) damage: f64,
    pub(crate) fall_distance: f64,
    pub(crate) on_ground: bool,
    pub(crate) dead: bool,
    pub(crate) unloaded: bool,
    pub(crate) movement_controlled: bool,
    pub(crate) ignore_all_collisions: bool,
    pub(crate) collision_ignore: FxHashMap<CartId, u32>,
    pub(crate) collision_enter_timer: u32,
    pub(crate) passengers: SmallVec<[Passenger; 2]>,
    pub(crate) rail_tracker: RailTracker,
    /// Spacing correction computed for this tick.
    pub(crate) speed_factor: Vector3<f64>,
}

impl Cart {
    pub fn new(id: CartId, position: Vector3<f64>) -> Cart {
        Cart {
            id,
            train: None,
            position,
            last_position: position,
            moved: Vector3::zero(),
            velocity: Vector3::zero(),
            yaw: 0.0,
            pitch: 0.0,
            direction: None,
            direction_to: None,
            direction_from: None,
            shaking: 0,
            damage: 0.0,
            fall_distance: 0.0,
            on_ground: false,
            dead: false,
            unloaded: false,
            movement_controlled: false,
            ignore_all_collisions: false,
            collision_ignore: FxHashMap::default(),
            collision_enter_timer: 0,
            passengers: SmallVec::new(),
            rail_tracker: RailTracker::new(),
            speed_factor: Vector3::zero(),
        }
    }

    pub fn id(&self) -> CartId {
        self.id
    }
    pub fn train(&self) -> Option<TrainId> {
        self.train
    }
    pub fn position(&self) -> Vector3<f64> {
        self.position
    }
    /// Position at the start of the current tick.
    pub fn last_position(&self) -> Vector3<f64> {
        self.last_position
    }
    /// How far the cart moved during the previous tick.
    pub fn moved(&self) -> Vector3<f64> {
        self.moved
    }
    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }
    pub fn set_velocity(&mut self, velocity: Vector3<f64>) {
        self.velocity = velocity;
    }
    /// Moves the cart without physics.
    pub fn teleport(&mut self, position: Vector3<f64>) {
        self.position = position;
    }
    pub fn yaw(&self) -> f64 {
        self.yaw
    }
    pub fn pitch(&self) -> f64 {
        self.pitch
    }
    pub fn damage(&self) -> f64 {
        self.damage
    }
    pub fn shaking(&self) -> u32 {
        self.shaking
    }
    pub fn fall_distance(&self) -> f64 {
        self.fall_distance
    }
    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }
    pub fn is_dead(&self) -> bool {
        self.dead
    }
    pub fn is_unloaded(&self) -> bool {
        self.unloaded
    }
    pub fn speed_factor(&self) -> Vector3<f64> {
        self.speed_factor
    }

    pub fn rail_tracker(&self) -> &RailTracker {
        &self.rail_tracker
    }
    pub fn rail_logic(&self) -> &'static RailLogic {
        self.rail_tracker.rail_logic()
    }
    pub fn rail_type(&self) -> &'static dyn RailType {
        self.rail_tracker.rail_type()
    }
    pub fn rail_pos(&self) -> BlockCoordinate {
        self.rail_tracker.rail_pos()
    }

    pub fn is_derailed(&self) -> bool {
        self.rail_type().is_none()
    }
    pub fn is_flying(&self) -> bool {
        self.is_derailed() && !self.on_ground
    }
    pub fn is_on_vertical(&self) -> bool {
        self.rail_type().is_vertical()
    }
    pub fn is_on_slope(&self) -> bool {
        self.rail_logic().is_sloped()
    }

    pub fn is_moving(&self) -> bool {
        self.velocity.magnitude2() > MIN_MOVE_SPEED * MIN_MOVE_SPEED
    }
    pub fn is_moving_horizontally(&self) -> bool {
        self.velocity.x.abs() > MIN_MOVE_SPEED || self.velocity.z.abs() > MIN_MOVE_SPEED
    }
    pub fn is_moving_vertically(&self) -> bool {
        if self.on_ground {
            self.velocity.y > MIN_MOVE_SPEED
        } else {
            self.is_derailed() || self.velocity.y.abs() > MIN_MOVE_SPEED
        }
    }
    pub fn is_moving_vertical_only(&self) -> bool {
        self.is_moving_vertically() && !self.is_moving_horizontally()
    }

    /// Whether the cart's velocity points into the given face.
    pub fn is_heading_to(&self, face: BlockFace) -> bool {
        self.velocity.dot(face.vector()) > 0.0
    }

    /// Velocity along the direction of travel, as seen by the current rail.
    pub fn forward_force(&self) -> f64 {
        self.rail_logic().forward_velocity(self)
    }
    pub fn set_forward_force(&mut self, force: f64) {
        self.rail_logic().set_forward_velocity(self, force);
    }

    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }
    pub fn passengers_mut(&mut self) -> &mut [Passenger] {
        &mut self.passengers
    }
    pub fn add_passenger(&mut self, passenger: Passenger) {
        self.passengers.push(passenger);
    }
    /// Removes all passengers and blocks them from re-entering for a while.
    pub fn eject(&mut self, config: &TrainCartsConfig) {
        self.passengers.clear();
        self.reset_collision_enter(config);
    }

    /// Disables gravity while some outside force moves the cart.
    pub fn set_movement_controlled(&mut self, controlled: bool) {
        self.movement_controlled = controlled;
    }

    pub fn ignore_collision(&mut self, other: CartId, ticks: u32) {
        if ticks > 0 {
            self.collision_ignore.insert(other, ticks);
        }
    }
    pub fn is_collision_ignored(&self, other: CartId) -> bool {
        self.ignore_all_collisions || self.collision_ignore.contains_key(&other)
    }
    pub fn set_ignore_collisions(&mut self, ignore: bool) {
        self.ignore_all_collisions = ignore;
    }
    pub fn can_collision_enter(&self) -> bool {
        self.collision_enter_timer == 0
    }
    pub fn reset_collision_enter(&mut self, config: &TrainCartsConfig) {
        self.collision_enter_timer = config.collision_re_enter_delay;
    }

    /// Velocity to push something at `position` out of the way of this cart, sideways
    /// relative to the cart's direction of travel.
    pub fn push_sideways(&self, position: Vector3<f64>, config: &TrainCartsConfig) -> Vector3<f64> {
        let offset = vec3(position.x - self.position.x, 0.0, position.z - self.position.z);
        let forward = self.direction().unit_vector();
        let forward = vec3(forward.x, 0.0, forward.z);
        let side = if forward.magnitude2() > 0.0 {
            let lateral = vec3(-forward.z, 0.0, forward.x);
            if offset.dot(lateral) < 0.0 {
                -lateral
            } else {
                lateral
            }
        } else if offset.magnitude2() > 0.0 {
            offset.normalize()
        } else {
            return Vector3::zero();
        };
        side.normalize() * config.push_away_force
    }

    /// Hurts the cart, killing it once the accumulated damage is too high.
    pub fn apply_damage(&mut self, amount: f64) {
        if self.dead {
            return;
        }
        self.shaking = 10;
        self.damage += amount * 10.0;
        if self.damage > MAXIMUM_DAMAGE_SUSTAINED {
            tracing::debug!(cart = ?self.id, "Cart destroyed by damage");
            self.kill();
        }
    }

    pub(crate) fn kill(&mut self) {
        self.dead = true;
        self.velocity = Vector3::zero();
    }

    /// Turns the cart around.
    pub fn reverse(&mut self, reverse_velocity: bool) {
        if reverse_velocity {
            self.velocity = -self.velocity;
        }
        let direction = self.direction().opposite();
        self.set_direction(direction);
    }

    /// Halts the cart. Unless `cancel_location_change` is set, the position change of the
    /// current tick is kept.
    pub fn stop(&mut self, cancel_location_change: bool) {
        self.velocity = Vector3::zero();
        if cancel_location_change {
            self.position = self.last_position;
        }
    }

    /// Distance from the cart to the centre of its rail block, for signs and detectors.
    /// Halved on diagonal rails where blocks are passed twice as fast.
    pub fn calc_sub_block_distance(&self) -> f64 {
        let mid = self.rail_tracker.rail_pos().mid();
        let distance = vec3(self.position.x - mid.x, 0.0, self.position.z - mid.z).magnitude();
        if self.direction().is_sub_cardinal() {
            distance * 0.5
        } else {
            distance
        }
    }

    /// Sets the rotation, preferring whichever of the two equivalent orientations is closest
    /// to the previous yaw.
    pub fn set_rotation_wrap(&mut self, yaw: f64, pitch: f64) {
        if !yaw.is_finite() || !pitch.is_finite() {
            return;
        }
        let change = wrap_angle(yaw - self.yaw);
        let mut yaw = self.yaw + change;
        let mut pitch = pitch;
        if change > 90.0 {
            yaw -= 180.0;
            pitch = -pitch;
        } else if change < -90.0 {
            yaw += 180.0;
            pitch = -pitch;
        }
        self.yaw = wrap_angle(yaw);
        self.pitch = pitch;
    }

    /// Re-evaluates whether the cart's surroundings are loaded.
    pub(crate) fn refresh_unloaded(&mut self, map: &dyn MapView) -> bool {
        let Ok(block) = BlockCoordinate::containing(self.position) else {
            return self.unloaded;
        };
        let chunk = block.chunk();
        let range = -LOADED_CHUNK_RANGE..=LOADED_CHUNK_RANGE;
        self.unloaded = !range.clone().all(|dx| {
            range.clone().all(|dz| {
                chunk
                    .try_delta(dx, 0, dz)
                    .is_some_and(|c| map.is_loaded(c))
            })
        });
        self.unloaded
    }
}

/// Wraps an angle in degrees into [-180, 180).
pub(crate) fn wrap_angle(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}
