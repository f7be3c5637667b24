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

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-wide tuning. Distances are in blocks and speeds in blocks per tick.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct TrainCartsConfig {
    /// Clamp each velocity axis separately instead of scaling the whole vector.
    pub legacy_speed_limiting: bool,
    /// Use the stronger pre-slope gravity on vertical rails.
    pub legacy_vertical_gravity: bool,
    /// Target gap between the centres of neighbouring carts.
    pub cart_distance: f64,
    /// Gain applied to the spacing correction's dot product with velocity.
    pub cart_distance_forcer: f64,
    /// Gain applied to the spacing correction vector itself.
    pub cart_distance_forcer_constant: f64,
    /// Carts further apart than this are not considered near each other.
    pub max_cart_distance: f64,
    pub slow_down_multiplier_normal: f64,
    pub slow_down_multiplier_slow: f64,
    /// Ticks before a cart may be entered again after a collision ejected a passenger.
    pub collision_re_enter_delay: u32,
    pub push_away_force: f64,
    /// Slow down carts without passengers using `slow_down_multiplier_slow`.
    pub slow_down_empty_carts: bool,
    /// Speed limit given to newly created trains.
    pub default_speed_limit: f64,
    /// Carts below this height die.
    pub void_depth: f64,
}

pub const FILENAME: &str = "traincarts.ron";

impl Default for TrainCartsConfig {
    fn default() -> Self {
        Self {
            legacy_speed_limiting: false,
            legacy_vertical_gravity: false,
            cart_distance: 1.5,
            cart_distance_forcer: 0.0,
            cart_distance_forcer_constant: 0.0,
            max_cart_distance: 4.0,
            slow_down_multiplier_normal: 0.997,
            slow_down_multiplier_slow: 0.96,
            collision_re_enter_delay: 100,
            push_away_force: 0.2,
            slow_down_empty_carts: false,
            default_speed_limit: 0.4,
            void_depth: -64.0,
        }
    }
}

impl TrainCartsConfig {
    pub fn from_ron_str(data: &str) -> Result<TrainCartsConfig> {
        let config: TrainCartsConfig =
            ron::from_str(data).context("Failed to parse rail physics settings")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(data_dir: &Path) -> Result<TrainCartsConfig> {
        let config_file = data_dir.join(FILENAME);
        log::info!("Loading settings from {}", config_file.display());
        if !config_file.exists() {
            log::info!("No settings found; using defaults");
            return Ok(Default::default());
        }
        let data = std::fs::read_to_string(&config_file)
            .with_context(|| format!("Reading {}", config_file.display()))?;
        let config = Self::from_ron_str(&data)
            .with_context(|| format!("Loading {}", config_file.display()))?;
        log::info!("Loaded settings from {}", config_file.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("cart_distance", self.cart_distance),
            ("cart_distance_forcer", self.cart_distance_forcer),
            (
                "cart_distance_forcer_constant",
                self.cart_distance_forcer_constant,
            ),
            ("max_cart_distance", self.max_cart_distance),
            ("slow_down_multiplier_normal", self.slow_down_multiplier_normal),
            ("slow_down_multiplier_slow", self.slow_down_multiplier_slow),
            ("push_away_force", self.push_away_force),
            ("default_speed_limit", self.default_speed_limit),
            ("void_depth", self.void_depth),
        ];
        for (name, value) in finite {
            ensure!(value.is_finite(), "{} must be finite, got {}", name, value);
        }
        ensure!(
            self.cart_distance > 0.0,
            "cart_distance must be positive, got {}",
            self.cart_distance
        );
        ensure!(
            self.max_cart_distance > 0.0,
            "max_cart_distance must be positive, got {}",
            self.max_cart_distance
        );
        ensure!(
            self.default_speed_limit > 0.0,
            "default_speed_limit must be positive, got {}",
            self.default_speed_limit
        );
        for (name, value) in [
            ("slow_down_multiplier_normal", self.slow_down_multiplier_normal),
            ("slow_down_multiplier_slow", self.slow_down_multiplier_slow),
        ] {
            ensure!(
                (0.0..=1.0).contains(&value),
                "{} must be within [0, 1], got {}",
                name,
                value
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            TrainCartsConfig::from_ron_str("(cart_distance: 1.0, legacy_speed_limiting: true)")
                .unwrap();
        assert_eq!(config.cart_distance, 1.0);
        assert!(config.legacy_speed_limiting);
        assert_eq!(config.max_cart_distance, 4.0);
        assert_eq!(config.collision_re_enter_delay, 100);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(TrainCartsConfig::from_ron_str("(cart_distance: -1.0)").is_err());
        assert!(TrainCartsConfig::from_ron_str("(slow_down_multiplier_slow: 1.5)").is_err());
        assert!(TrainCartsConfig::from_ron_str("(cart_distance: ").is_err());
        assert!(TrainCartsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("traincarts_settings_missing");
        let config = TrainCartsConfig::load(&dir).unwrap();
        assert_eq!(config, TrainCartsConfig::default());
    }
}
