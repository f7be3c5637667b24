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

//! The per-cart tick: start, pre-move, move and post-move.

use anyhow::{ensure, Context, Result};
use cgmath::{vec3, InnerSpace, Vector3};
use traincarts_core::{BlockCoordinate, BlockFace, MapView};

use super::Cart;
use crate::error::{CartSignal, PhysicsError, StageResult};
use crate::rails;
use crate::settings::TrainCartsConfig;
use crate::train::{SlowdownMode, TrainProperties};

/// Distance kept between a cart and a block it collided with.
const COLLISION_EPS: f64 = 1e-4;
/// Height above the cart's reference point at which railed carts test for collisions.
const RAILED_REACH_HEIGHT: f64 = 0.5;
/// Carts slower than this (squared) pick up passenger steering input.
const MANUAL_STEERING_MAX_SPEED_SQ: f64 = 0.01;
const MANUAL_STEERING_FACTOR: f64 = 0.1;

/// Everything a cart needs from its surroundings during a tick.
pub(crate) struct TickContext<'a> {
    pub(crate) map: &'a dyn MapView,
    pub(crate) config: &'a TrainCartsConfig,
    pub(crate) properties: &'a TrainProperties,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct MoveOutcome {
    /// The cart ran head-on into a block; the whole train has to stop.
    pub(crate) head_on: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PostMoveOutcome {
    pub(crate) moved: Option<(Vector3<f64>, Vector3<f64>)>,
    pub(crate) passengers_changed: bool,
}

/// Replaces NaN components with zero. Returns true if anything was replaced.
fn sanitize_nan(v: &mut Vector3<f64>) -> bool {
    let mut fixed = false;
    for c in [&mut v.x, &mut v.y, &mut v.z] {
        if c.is_nan() {
            *c = 0.0;
            fixed = true;
        }
    }
    fixed
}

fn axis_face(axis: usize, sign: i32) -> BlockFace {
    let mut d = [0; 3];
    d[axis] = sign;
    BlockFace::new(d[0], d[1], d[2]).unwrap_or(BlockFace::SELF)
}

fn block_axis(block: BlockCoordinate, axis: usize) -> i32 {
    match axis {
        0 => block.x,
        1 => block.y,
        _ => block.z,
    }
}

impl Cart {
    pub(crate) fn on_physics_start(&mut self) {
        self.collision_ignore.retain(|_, ticks| {
            *ticks = ticks.saturating_sub(1);
            *ticks > 0
        });
        self.collision_enter_timer = self.collision_enter_timer.saturating_sub(1);
        if sanitize_nan(&mut self.velocity) {
            tracing::warn!(cart = ?self.id, "Velocity contained NaN, reset to zero");
        }
        self.moved = self.position - self.last_position;
        self.last_position = self.position;
    }

    pub(crate) fn on_physics_pre_move(&mut self, ctx: &TickContext) -> StageResult {
        self.rail_tracker.snapshot_rail_logic();

        self.shaking = self.shaking.saturating_sub(1);
        if self.damage > 0.0 {
            self.damage = (self.damage - 1.0).max(0.0);
        }

        if self.position.y < ctx.config.void_depth {
            tracing::debug!(cart = ?self.id, y = self.position.y, "Cart fell into the void");
            self.kill();
            return Err(CartSignal::Missing);
        }

        let logic = self.rail_logic();
        if !self.movement_controlled {
            self.velocity.y -= logic.gravity_multiplier(ctx.properties, ctx.config);
        }
        if !self.is_derailed() {
            self.fall_distance = 0.0;
        }

        logic.on_pre_move(self, ctx.properties);
        self.rail_type().on_pre_move(self);

        if ctx.properties.manual_movement_allowed {
            for passenger in &self.passengers {
                let input = vec3(passenger.velocity.x, 0.0, passenger.velocity.z);
                let speed_sq = self.velocity.x.powi(2) + self.velocity.z.powi(2);
                if input.magnitude2() > 1e-4 && speed_sq < MANUAL_STEERING_MAX_SPEED_SQ {
                    self.velocity += input * MANUAL_STEERING_FACTOR;
                }
            }
        }
        Ok(())
    }

    /// Applies the velocity one axis at a time (y, x, z), stopping at solid blocks.
    pub(crate) fn on_physics_move(&mut self, ctx: &TickContext) -> Result<MoveOutcome> {
        let mut outcome = MoveOutcome::default();
        let start_y = self.position.y;
        let reach = if self.is_derailed() {
            vec3(0.0, 0.0, 0.0)
        } else {
            vec3(0.0, RAILED_REACH_HEIGHT, 0.0)
        };
        for axis in [1usize, 0, 2] {
            let delta = self.velocity[axis];
            if delta == 0.0 {
                continue;
            }
            let mut target = self.position;
            target[axis] += delta;
            let current = BlockCoordinate::containing(self.position + reach)
                .with_context(|| PhysicsError::NonFinitePosition(self.id, self.position))?;
            let hit = BlockCoordinate::containing(target + reach)
                .with_context(|| PhysicsError::NonFinitePosition(self.id, target))?;
            if hit != current
                && !self.ignore_all_collisions
                && ctx.map.block(hit).is_solid()
            {
                let sign = if delta > 0.0 { 1 } else { -1 };
                let hit_face = axis_face(axis, -sign);
                if self.on_block_collision(ctx.map, hit, hit_face, &mut outcome) {
                    let face_coord = block_axis(hit, axis) as f64;
                    let boundary = if delta > 0.0 {
                        face_coord - COLLISION_EPS
                    } else {
                        face_coord + 1.0 + COLLISION_EPS
                    };
                    target[axis] = boundary - reach[axis];
                    self.velocity[axis] = 0.0;
                }
            }
            self.position = target;
        }
        let p = self.position;
        ensure!(
            p.x.is_finite() && p.y.is_finite() && p.z.is_finite(),
            PhysicsError::NonFinitePosition(self.id, p)
        );
        let dropped = start_y - p.y;
        if self.is_derailed() && dropped > 0.0 {
            self.fall_distance += dropped;
        }
        Ok(outcome)
    }

    /// Runs the collision hooks. Returns true if the default collision handling applies.
    fn on_block_collision(
        &self,
        map: &dyn MapView,
        hit: BlockCoordinate,
        hit_face: BlockFace,
        outcome: &mut MoveOutcome,
    ) -> bool {
        if !rails::rail_type_of(map, hit).on_collide(self, hit, hit_face) {
            return false;
        }
        let rail_type = self.rail_type();
        let rail = self.rail_pos();
        if !rail_type.on_block_collision(self, rail, hit, hit_face) {
            return false;
        }
        if rail_type.is_head_on_collision(self, rail, hit) {
            tracing::debug!(cart = ?self.id, block = ?hit, "Head-on collision");
            outcome.head_on = true;
        }
        true
    }

    pub(crate) fn on_physics_post_move(
        &mut self,
        ctx: &TickContext,
    ) -> StageResult<PostMoveOutcome> {
        self.check_missing(ctx.map)?;

        sanitize_nan(&mut self.velocity);
        let max = ctx.properties.speed_limit;
        if ctx.config.legacy_speed_limiting {
            self.velocity.x = self.velocity.x.clamp(-max, max);
            self.velocity.y = self.velocity.y.clamp(-max, max);
            self.velocity.z = self.velocity.z.clamp(-max, max);
        } else {
            let speed = self.velocity.magnitude();
            if speed > max {
                self.velocity *= max / speed;
            }
        }

        let logic = self.rail_logic();
        logic.on_spacing_update(&mut self.velocity, self.speed_factor, ctx.config);
        if !logic.has_vertical_movement() {
            self.velocity.y = 0.0;
        }

        self.direction_from = self.direction_to;
        self.rail_tracker.update_last();

        let mut outcome = PostMoveOutcome::default();
        if self.position != self.last_position {
            outcome.moved = Some((self.last_position, self.position));
        }

        logic.on_post_move(self);
        self.rail_type().on_post_move(self);

        self.apply_friction(ctx);
        self.apply_manual_movement(ctx.properties);

        logic.on_rotation_update(self);
        self.rail_tracker.set_live_rail_logic();

        self.check_missing(ctx.map)?;
        let before = self.passengers.len();
        self.passengers.retain(|p| !p.dead);
        outcome.passengers_changed = self.passengers.len() != before;
        Ok(outcome)
    }

    fn apply_friction(&mut self, ctx: &TickContext) {
        if self.is_derailed() || !ctx.properties.is_slowing_down(SlowdownMode::Friction) {
            return;
        }
        let factor = if ctx.config.slow_down_empty_carts && self.passengers.is_empty() {
            ctx.config.slow_down_multiplier_slow
        } else {
            ctx.config.slow_down_multiplier_normal
        };
        self.velocity *= factor;
    }

    /// Passengers pressing forward push the cart along where they look.
    fn apply_manual_movement(&mut self, properties: &TrainProperties) {
        if !properties.manual_movement_allowed || self.is_derailed() {
            return;
        }
        for passenger in &self.passengers {
            if passenger.forward_movement <= 0.0
                || self.velocity.magnitude2() >= MANUAL_STEERING_MAX_SPEED_SQ
            {
                continue;
            }
            let look = vec3(passenger.look_direction.x, 0.0, passenger.look_direction.z);
            if look.magnitude2() > 1e-8 {
                self.velocity += look.normalize() * MANUAL_STEERING_FACTOR;
            }
        }
    }

    /// Fails with Missing for dead carts and Unloaded for carts outside loaded chunks.
    pub(crate) fn check_missing(&mut self, map: &dyn MapView) -> StageResult {
        if self.dead {
            return Err(CartSignal::Missing);
        }
        if self.refresh_unloaded(map) {
            return Err(CartSignal::Unloaded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartId;
    use traincarts_core::{BlockShape, SparseMap};

    #[test]
    fn test_sanitize_nan() {
        let mut v = vec3(f64::NAN, 1.0, f64::NAN);
        assert!(sanitize_nan(&mut v));
        assert_eq!(v, vec3(0.0, 1.0, 0.0));
        assert!(!sanitize_nan(&mut v));
    }

    #[test]
    fn test_start_counts_down_timers() {
        let mut cart = Cart::new(CartId(1), vec3(0.5, 0.0, 0.5));
        cart.ignore_collision(CartId(2), 1);
        cart.ignore_collision(CartId(3), 2);
        cart.collision_enter_timer = 1;
        cart.on_physics_start();
        assert!(!cart.is_collision_ignored(CartId(2)));
        assert!(cart.is_collision_ignored(CartId(3)));
        assert!(cart.can_collision_enter());
    }

    #[test]
    fn test_falling_cart_lands() {
        let mut map = SparseMap::new();
        map.set(BlockCoordinate::new(0, 0, 0), BlockShape::Solid);
        let config = TrainCartsConfig::default();
        let properties = TrainProperties::from_config(&config);
        let ctx = TickContext {
            map: &map,
            config: &config,
            properties: &properties,
        };
        let mut cart = Cart::new(CartId(1), vec3(0.5, 1.05, 0.5));
        cart.refresh_rail_tracker(&map).unwrap();
        cart.velocity = vec3(0.0, -0.3, 0.0);
        let outcome = cart.on_physics_move(&ctx).unwrap();
        assert!(!outcome.head_on);
        assert!((cart.position.y - (1.0 + COLLISION_EPS)).abs() < 1e-9);
        assert_eq!(cart.velocity.y, 0.0);
        // Only the distance actually fallen counts, not the blocked velocity
        assert!((cart.fall_distance() - (0.05 - COLLISION_EPS)).abs() < 1e-9);
    }
}
