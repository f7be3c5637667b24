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

//! The arena owning all carts and trains, and the per-tick driver.

use anyhow::{bail, ensure, Context, Result};
use cgmath::{Vector3, Zero};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use traincarts_core::{BlockCoordinate, BlockFace, MapView};

use crate::cart::physics::TickContext;
use crate::cart::{connectivity, Cart, CartId};
use crate::error::{CartSignal, PhysicsError};
use crate::rails;
use crate::settings::TrainCartsConfig;
use crate::spacing::{self, SpacingSample};
use crate::train::{Train, TrainId, TrainProperties};
use crate::walker::TrackWalkingPoint;

/// Things that happened during a tick, for the host to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    Moved {
        cart: CartId,
        from: Vector3<f64>,
        to: Vector3<f64>,
    },
    /// The cart moved onto a different rail block.
    BlockChanged {
        cart: CartId,
        from: BlockCoordinate,
        to: BlockCoordinate,
    },
    /// The cart died and was removed.
    Died { cart: CartId },
    /// `cart` ran head-on into a block and the train was stopped.
    TrainStopped { train: TrainId, cart: CartId },
    PassengersChanged { cart: CartId },
}

/// Outcome of ticking one train.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainTickReport {
    /// False if the train had already been ticked this tick.
    pub ticked: bool,
    /// Carts that died. They have been removed from the arena.
    pub missing: Vec<CartId>,
    /// Carts skipped because their surroundings are not loaded.
    pub unloaded: Vec<CartId>,
    /// Whether a head-on collision stopped the train.
    pub stopped: bool,
}

#[derive(Debug, Default)]
pub struct TickSummary {
    pub trains_ticked: usize,
    pub missing: Vec<CartId>,
    pub unloaded: Vec<CartId>,
    /// Trains whose tick was aborted by a fault.
    pub failed: Vec<(TrainId, anyhow::Error)>,
}

impl TickSummary {
    fn absorb(&mut self, report: TrainTickReport) {
        if report.ticked {
            self.trains_ticked += 1;
        }
        self.missing.extend(report.missing);
        self.unloaded.extend(report.unloaded);
    }
}

/// Owns every cart and train. Carts and trains refer to each other by id only.
pub struct Railway {
    config: TrainCartsConfig,
    tick: u64,
    carts: FxHashMap<CartId, Cart>,
    trains: FxHashMap<TrainId, Train>,
    next_cart_id: u64,
    next_train_id: u64,
    events: Vec<CartEvent>,
}

impl Railway {
    pub fn new(config: TrainCartsConfig) -> Result<Railway> {
        config.validate()?;
        Ok(Railway {
            config,
            tick: 0,
            carts: FxHashMap::default(),
            trains: FxHashMap::default(),
            next_cart_id: 1,
            next_train_id: 1,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &TrainCartsConfig {
        &self.config
    }

    /// The number of the tick in progress (or last finished).
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn cart(&self, id: CartId) -> Option<&Cart> {
        self.carts.get(&id)
    }
    pub fn cart_mut(&mut self, id: CartId) -> Option<&mut Cart> {
        self.carts.get_mut(&id)
    }
    pub fn carts(&self) -> impl Iterator<Item = &Cart> {
        self.carts.values()
    }
    pub fn cart_count(&self) -> usize {
        self.carts.len()
    }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.trains.get(&id)
    }
    pub fn train_mut(&mut self, id: TrainId) -> Option<&mut Train> {
        self.trains.get_mut(&id)
    }
    pub fn trains(&self) -> impl Iterator<Item = &Train> {
        self.trains.values()
    }
    pub fn train_count(&self) -> usize {
        self.trains.len()
    }
    pub fn train_of(&self, cart: CartId) -> Option<TrainId> {
        self.carts.get(&cart).and_then(|c| c.train)
    }

    /// Takes the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<CartEvent> {
        std::mem::take(&mut self.events)
    }

    fn cart_ref(&self, id: CartId) -> Result<&Cart> {
        Ok(self.carts.get(&id).ok_or(PhysicsError::CartNotFound(id))?)
    }

    fn train_id_of(&self, cart: CartId) -> Result<TrainId> {
        let train = self.cart_ref(cart)?.train;
        Ok(train.ok_or(PhysicsError::MembershipMismatch(cart, None))?)
    }

    fn train_ref_mut(&mut self, id: TrainId) -> Result<&mut Train> {
        Ok(self
            .trains
            .get_mut(&id)
            .ok_or(PhysicsError::TrainNotFound(id))?)
    }

    fn alloc_cart(&mut self, position: Vector3<f64>) -> CartId {
        let id = CartId(self.next_cart_id);
        self.next_cart_id += 1;
        self.carts.insert(id, Cart::new(id, position));
        id
    }

    fn new_train(&mut self, members: Vec<CartId>) -> TrainId {
        let id = TrainId(self.next_train_id);
        self.next_train_id += 1;
        for member in &members {
            if let Some(cart) = self.carts.get_mut(member) {
                cart.train = Some(id);
            }
        }
        let properties = TrainProperties::from_config(&self.config);
        self.trains.insert(id, Train::new(id, members, properties));
        id
    }

    /// Creates a cart in a train of its own.
    pub fn spawn_cart(&mut self, position: Vector3<f64>) -> Result<CartId> {
        ensure!(
            position.x.is_finite() && position.y.is_finite() && position.z.is_finite(),
            PhysicsError::NonFinitePosition(CartId(self.next_cart_id), position)
        );
        let id = self.alloc_cart(position);
        self.new_train(vec![id]);
        Ok(id)
    }

    /// Places a train of `count` carts on the rails, the head on `rail` facing `direction`
    /// and the others following behind it `cart_distance` apart.
    pub fn spawn_train(
        &mut self,
        map: &dyn MapView,
        rail: BlockCoordinate,
        direction: BlockFace,
        count: usize,
    ) -> Result<TrainId> {
        ensure!(count > 0, "A train needs at least one cart");
        let (rail_type, anchor) = rails::find_rail(map, rail);
        ensure!(!rail_type.is_none(), "No rail at {:?}", rail);
        let heading = rail_type
            .resolve_direction(map, anchor, direction)
            .with_context(|| format!("Rail at {:?} does not run toward {:?}", anchor, direction))?;
        let spawn = rail_type.spawn_location(map, anchor, heading);

        let mut placements = vec![(spawn.position, heading)];
        let mut walker = TrackWalkingPoint::new(map, spawn.position, anchor, heading.opposite());
        for placed in 1..count {
            if !walker.move_by(self.config.cart_distance) {
                bail!(
                    "Track behind {:?} ends after {} of {} carts",
                    anchor,
                    placed,
                    count
                );
            }
            placements.push((walker.position(), walker.current_direction().opposite()));
        }

        let mut members = Vec::with_capacity(count);
        for (position, facing) in placements {
            let id = self.alloc_cart(position);
            if let Some(cart) = self.carts.get_mut(&id) {
                cart.set_direction(facing);
                cart.yaw = spawn.yaw;
            }
            members.push(id);
        }
        let id = self.new_train(members);
        tracing::debug!(train = ?id, ?anchor, count, "Spawned train");
        Ok(id)
    }

    /// Couples the train of `a` to the train of `b`, with `a` just ahead of `b`. Trains are
    /// turned around as needed. Returns the merged train.
    pub fn connect(&mut self, a: CartId, b: CartId) -> Result<TrainId> {
        let ta = self.train_id_of(a)?;
        let tb = self.train_id_of(b)?;
        ensure!(ta != tb, "Carts {:?} and {:?} are already in train {:?}", a, b, ta);
        let mut reverse = [false; 2];
        let ends = [(a, ta, true), (b, tb, false)];
        for (i, (cart, train_id, at_tail)) in ends.into_iter().enumerate() {
            let train = self
                .trains
                .get(&train_id)
                .ok_or(PhysicsError::TrainNotFound(train_id))?;
            let (wanted, other) = if at_tail {
                (train.tail(), train.head())
            } else {
                (train.head(), train.tail())
            };
            if wanted != Some(cart) {
                ensure!(
                    other == Some(cart),
                    PhysicsError::NotAtTrainEnd(cart, train_id)
                );
                reverse[i] = true;
            }
        }
        for (train_id, reverse) in [(ta, reverse[0]), (tb, reverse[1])] {
            if reverse {
                tracing::debug!(train = ?train_id, "Reversing train to couple it");
                self.train_ref_mut(train_id)?.reverse_members();
            }
        }

        let mut absorbed = self
            .trains
            .remove(&tb)
            .ok_or(PhysicsError::TrainNotFound(tb))?;
        let moved = absorbed.take_members();
        for member in &moved {
            if let Some(cart) = self.carts.get_mut(member) {
                cart.train = Some(ta);
            }
        }
        let train = self.train_ref_mut(ta)?;
        train.append(moved);
        // A train that already ran this tick must not run again
        let last_tick = train.last_tick().max(absorbed.last_tick());
        train.set_last_tick(last_tick);
        tracing::debug!(train = ?ta, absorbed = ?tb, len = train.len(), "Coupled trains");
        Ok(ta)
    }

    /// Splits off the members from `index` onward into a new train, which is returned.
    pub fn split(&mut self, train_id: TrainId, index: usize) -> Result<TrainId> {
        let train = self.train_ref_mut(train_id)?;
        let len = train.len();
        ensure!(
            index > 0 && index < len,
            PhysicsError::SplitOutOfRange(train_id, len, index)
        );
        let tail = train.split_off(index);
        let properties = train.properties().clone();
        let last_tick = train.last_tick();

        let id = TrainId(self.next_train_id);
        self.next_train_id += 1;
        for member in &tail {
            if let Some(cart) = self.carts.get_mut(member) {
                cart.train = Some(id);
            }
        }
        let mut split = Train::new(id, tail, properties);
        split.set_last_tick(last_tick);
        self.trains.insert(id, split);
        tracing::debug!(train = ?train_id, split = ?id, index, "Split train");
        Ok(id)
    }

    /// Takes a cart out of the arena. Removing an interior member leaves the carts behind
    /// it in a new train; removing an end member keeps the train as it is.
    pub fn remove_cart(&mut self, cart: CartId) -> Result<Cart> {
        let train_id = self.train_id_of(cart)?;
        let train = self.train_ref_mut(train_id)?;
        let index = train
            .index_of(cart)
            .ok_or(PhysicsError::MembershipMismatch(cart, Some(train_id)))?;
        if index > 0 && index + 1 < train.len() {
            self.split(train_id, index + 1)?;
        }
        let train = self.train_ref_mut(train_id)?;
        train.remove_member(index);
        if train.is_empty() {
            self.trains.remove(&train_id);
        }
        let mut removed = self
            .carts
            .remove(&cart)
            .ok_or(PhysicsError::CartNotFound(cart))?;
        removed.train = None;
        Ok(removed)
    }

    /// Kills a cart. It is removed during its train's next tick.
    pub fn kill_cart(&mut self, cart: CartId) -> Result<()> {
        let cart = self
            .carts
            .get_mut(&cart)
            .ok_or(PhysicsError::CartNotFound(cart))?;
        cart.kill();
        Ok(())
    }

    pub fn stop_train(&mut self, train_id: TrainId) -> Result<()> {
        let members = self
            .trains
            .get(&train_id)
            .ok_or(PhysicsError::TrainNotFound(train_id))?
            .members();
        for member in members {
            if let Some(cart) = self.carts.get_mut(member) {
                cart.stop(false);
            }
        }
        Ok(())
    }

    pub fn is_near_of(&self, a: CartId, b: CartId) -> Result<bool> {
        Ok(self.cart_ref(a)?.is_near_of(self.cart_ref(b)?, &self.config))
    }

    pub fn is_following_on_track(&self, map: &dyn MapView, a: CartId, b: CartId) -> Result<bool> {
        Ok(self
            .cart_ref(a)?
            .is_following_on_track(self.cart_ref(b)?, map, &self.config))
    }

    pub fn is_track_connected(&self, map: &dyn MapView, a: CartId, b: CartId) -> Result<bool> {
        Ok(connectivity::is_track_connected(
            self.cart_ref(a)?,
            self.cart_ref(b)?,
            map,
            &self.config,
        ))
    }

    /// Starts a new tick. Events not drained by now are dropped.
    pub fn begin_tick(&mut self) {
        self.tick += 1;
        if !self.events.is_empty() {
            tracing::debug!(count = self.events.len(), "Dropping undrained cart events");
            self.events.clear();
        }
    }

    /// Starts a new tick and runs every train once, in id order.
    pub fn tick(&mut self, map: &dyn MapView) -> TickSummary {
        self.begin_tick();
        let mut ids: Vec<TrainId> = self.trains.keys().copied().collect();
        ids.sort();
        let mut summary = TickSummary::default();
        for id in ids {
            // Coupling or deaths earlier in the tick may have removed it
            if !self.trains.contains_key(&id) {
                continue;
            }
            match self.advance_train(map, id) {
                Ok(report) => summary.absorb(report),
                Err(err) => summary.failed.push((id, err)),
            }
        }
        summary
    }

    /// Runs the train `cart` belongs to, unless it already ran this tick.
    pub fn advance_cart(&mut self, map: &dyn MapView, cart: CartId) -> Result<TrainTickReport> {
        let train = self.train_id_of(cart)?;
        self.advance_train(map, train)
    }

    /// Runs one tick of physics for a train, unless it already ran this tick.
    pub fn advance_train(&mut self, map: &dyn MapView, id: TrainId) -> Result<TrainTickReport> {
        let span = tracing::debug_span!("train_tick", train = id.0, tick = self.tick);
        let _enter = span.enter();

        let mut report = TrainTickReport::default();
        let result = {
            let Railway {
                config,
                tick,
                carts,
                trains,
                events,
                ..
            } = &mut *self;
            let train = trains
                .get_mut(&id)
                .ok_or(PhysicsError::TrainNotFound(id))?;
            if !train.mark_ticked(*tick) {
                return Ok(report);
            }
            report.ticked = true;
            let ctx = TickContext {
                map,
                config: &*config,
                properties: train.properties(),
            };
            run_train(&ctx, &*train, carts, events, &mut report)
        };

        match result {
            Ok(()) => {
                for &cart in &report.missing {
                    self.remove_cart(cart)
                        .with_context(|| format!("Removing dead cart {:?}", cart))?;
                    tracing::debug!(?cart, "Cart died");
                    self.events.push(CartEvent::Died { cart });
                }
                Ok(report)
            }
            Err(err) => {
                tracing::error!(train = id.0, "Train tick aborted: {:?}", err);
                self.release_snapshots(id);
                Err(err.context(format!("Ticking train {:?}", id)))
            }
        }
    }

    fn release_snapshots(&mut self, id: TrainId) {
        let Some(train) = self.trains.get(&id) else {
            return;
        };
        for member in train.members() {
            if let Some(cart) = self.carts.get_mut(member) {
                cart.rail_tracker.set_live_rail_logic();
            }
        }
    }
}

fn record_signal(report: &mut TrainTickReport, cart: &mut Cart, signal: CartSignal) {
    cart.rail_tracker.set_live_rail_logic();
    match signal {
        CartSignal::Missing => report.missing.push(cart.id),
        CartSignal::Unloaded => {
            tracing::debug!(cart = ?cart.id, "Cart entered an unloaded area");
            report.unloaded.push(cart.id)
        }
    }
}

/// The group tick: every stage runs for all members before the next stage starts.
fn run_train(
    ctx: &TickContext,
    train: &Train,
    carts: &mut FxHashMap<CartId, Cart>,
    events: &mut Vec<CartEvent>,
    report: &mut TrainTickReport,
) -> Result<()> {
    let members: SmallVec<[CartId; 8]> = train.members().iter().copied().collect();
    let mut active: SmallVec<[CartId; 8]> = SmallVec::new();
    for &id in &members {
        let cart = carts.get_mut(&id).ok_or(PhysicsError::CartNotFound(id))?;
        ensure!(
            cart.train == Some(train.id()),
            PhysicsError::MembershipMismatch(id, cart.train)
        );
        if cart.dead {
            report.missing.push(id);
            continue;
        }
        if cart.refresh_unloaded(ctx.map) {
            report.unloaded.push(id);
            continue;
        }
        cart.on_physics_start();
        if let Some((from, to)) = cart
            .refresh_rail_tracker(ctx.map)
            .with_context(|| format!("Refreshing the rail of cart {:?}", id))?
        {
            events.push(CartEvent::BlockChanged { cart: id, from, to });
        }
        cart.update_direction();
        active.push(id);
    }

    let (samples, live_ids): (SmallVec<[SpacingSample; 8]>, SmallVec<[CartId; 8]>) = members
        .iter()
        .filter(|id| !report.missing.contains(id))
        .filter_map(|id| carts.get(id))
        .map(|cart| (cart.spacing_sample(), cart.id))
        .unzip();
    let factors = spacing::calculate_speed_factors(&samples, ctx.properties.cart_distance);
    for (id, factor) in live_ids.iter().zip(factors) {
        if !active.contains(id) {
            continue;
        }
        if let Some(cart) = carts.get_mut(id) {
            cart.speed_factor = factor;
        }
    }

    let mut moving: SmallVec<[CartId; 8]> = SmallVec::new();
    for id in active {
        let cart = carts.get_mut(&id).ok_or(PhysicsError::CartNotFound(id))?;
        match cart.on_physics_pre_move(ctx) {
            Ok(()) => moving.push(id),
            Err(signal) => record_signal(report, cart, signal),
        }
    }

    let mut head_on = None;
    for &id in &moving {
        let cart = carts.get_mut(&id).ok_or(PhysicsError::CartNotFound(id))?;
        let outcome = cart
            .on_physics_move(ctx)
            .with_context(|| format!("Moving cart {:?}", id))?;
        if outcome.head_on && head_on.is_none() {
            head_on = Some(id);
        }
    }
    if let Some(culprit) = head_on {
        for id in &moving {
            if let Some(cart) = carts.get_mut(id) {
                cart.velocity = Vector3::zero();
            }
        }
        report.stopped = true;
        events.push(CartEvent::TrainStopped {
            train: train.id(),
            cart: culprit,
        });
    }

    for &id in &moving {
        let cart = carts.get_mut(&id).ok_or(PhysicsError::CartNotFound(id))?;
        match cart.on_physics_post_move(ctx) {
            Ok(outcome) => {
                if let Some((from, to)) = outcome.moved {
                    events.push(CartEvent::Moved { cart: id, from, to });
                }
                if outcome.passengers_changed {
                    events.push(CartEvent::PassengersChanged { cart: id });
                }
            }
            Err(signal) => record_signal(report, cart, signal),
        }
    }
    Ok(())
}
