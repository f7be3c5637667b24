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

use cgmath::Vector3;
use thiserror::Error;

use crate::cart::CartId;
use crate::train::TrainId;

/// Expected outcomes that end a cart's tick early. Neither is a fault.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSignal {
    /// The cart died or no longer exists.
    #[error("cart is missing")]
    Missing,
    /// The cart's surroundings are not loaded; it is revisited once they are.
    #[error("cart is in an unloaded area")]
    Unloaded,
}

/// Result of a single pipeline stage.
pub type StageResult<T = ()> = Result<T, CartSignal>;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("Cart {0:?} not found")]
    CartNotFound(CartId),
    #[error("Train {0:?} not found")]
    TrainNotFound(TrainId),
    #[error("Cart {0:?} reached a non-finite position {1:?}")]
    NonFinitePosition(CartId, Vector3<f64>),
    #[error("Cart {0:?} claims train {1:?}, but is not one of its members")]
    MembershipMismatch(CartId, Option<TrainId>),
    #[error("Cart {0:?} is not at either end of train {1:?}")]
    NotAtTrainEnd(CartId, TrainId),
    #[error("Cannot split train {0:?} of {1} carts at index {2}")]
    SplitOutOfRange(TrainId, usize, usize),
}
