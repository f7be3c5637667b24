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

//! Runs a train around a small demo layout and prints where its carts end up.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cgmath::vec3;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use traincarts_physics::{
    BlockCoordinate, BlockFace, CartEvent, RailData, Railway, SparseMap, TrainCartsConfig,
};

#[derive(Parser, Debug, Clone)]
struct SimArgs {
    /// Directory holding traincarts.ron. Defaults are used when absent.
    #[arg(short, long, value_name = "CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[arg(short, long, default_value_t = 200)]
    ticks: u64,

    /// Number of carts in the train
    #[arg(long, default_value_t = 3)]
    cars: usize,

    /// Initial speed in blocks per tick
    #[arg(long, default_value_t = 0.3)]
    speed: f64,

    /// Print cart positions every this many ticks
    #[arg(long, default_value_t = 20)]
    report_every: u64,
}

/// A straight run into a curve, a climb up a slope, an upper level and a wall to climb.
fn demo_layout() -> Result<SparseMap> {
    let mut map = SparseMap::new();
    map.lay_straight(BlockCoordinate::new(0, 0, 0), BlockFace::EAST, 12)?;
    // Connects WEST and SOUTH
    map.lay_rail(
        BlockCoordinate::new(12, 0, 0),
        RailData::curved(BlockFace::NORTH_EAST)?,
    );
    map.lay_straight(BlockCoordinate::new(12, 0, 1), BlockFace::SOUTH, 8)?;
    map.lay_rail(
        BlockCoordinate::new(12, 0, 9),
        RailData::sloped(BlockFace::SOUTH)?,
    );
    map.lay_straight(BlockCoordinate::new(12, 1, 10), BlockFace::SOUTH, 10)?;
    // The slope bends up into the vertical rails above it
    map.lay_rail(
        BlockCoordinate::new(12, 1, 20),
        RailData::sloped(BlockFace::SOUTH)?,
    );
    map.raise_vertical(BlockCoordinate::new(12, 2, 20), BlockFace::SOUTH, 6)?;
    Ok(map)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = SimArgs::parse();
    let config = match &args.config_dir {
        Some(dir) => TrainCartsConfig::load(dir)?,
        None => TrainCartsConfig::default(),
    };
    let map = demo_layout().context("Building demo layout")?;
    let mut railway = Railway::new(config)?;
    let train = railway
        .spawn_train(&map, BlockCoordinate::new(8, 0, 0), BlockFace::EAST, args.cars)
        .context("Placing the train")?;
    let members = railway
        .train(train)
        .map(|t| t.members().to_vec())
        .unwrap_or_default();
    for &id in &members {
        if let Some(cart) = railway.cart_mut(id) {
            cart.set_velocity(vec3(args.speed, 0.0, 0.0));
        }
    }

    for _ in 0..args.ticks {
        let summary = railway.tick(&map);
        for (train, err) in &summary.failed {
            tracing::error!(train = train.0, "Tick failed: {:?}", err);
        }
        for event in railway.drain_events() {
            match event {
                CartEvent::BlockChanged { cart, from, to } => {
                    tracing::debug!(?cart, ?from, ?to, "Block changed")
                }
                CartEvent::Died { cart } => tracing::info!(?cart, "Cart died"),
                CartEvent::TrainStopped { train, cart } => {
                    tracing::info!(?train, ?cart, "Train stopped by a collision")
                }
                _ => {}
            }
        }
        let tick = railway.current_tick();
        if args.report_every > 0 && tick % args.report_every == 0 {
            for &id in &members {
                let Some(cart) = railway.cart(id) else {
                    continue;
                };
                let p = cart.position();
                println!(
                    "tick {:>5} cart {:>3} at ({:>8.3}, {:>7.3}, {:>8.3}) speed {:.4} on {:?}",
                    tick,
                    id.0,
                    p.x,
                    p.y,
                    p.z,
                    cgmath::InnerSpace::magnitude(cart.velocity()),
                    cart.rail_logic().kind()
                );
            }
        }
    }
    Ok(())
}
