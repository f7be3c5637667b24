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

//! Tick-driven physics for carts and trains running on a block rail network.
//!
//! A host owns a [railway::Railway] arena and a [MapView] of the world, and calls
//! [railway::Railway::tick] once per simulation step.

pub mod cart;
pub mod error;
pub mod rails;
pub mod railway;
pub mod settings;
pub mod spacing;
pub mod tracker;
pub mod train;
pub mod walker;

#[cfg(test)]
mod tests;

pub use cart::{Cart, CartId, Passenger};
pub use error::{CartSignal, PhysicsError, StageResult};
pub use railway::{CartEvent, Railway, TickSummary, TrainTickReport};
pub use settings::TrainCartsConfig;
pub use train::{SlowdownMode, Train, TrainId, TrainProperties};

pub use traincarts_core::{BlockCoordinate, BlockFace, BlockShape, MapView, RailData, SparseMap};
