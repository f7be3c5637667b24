use cgmath::{vec3, InnerSpace, Vector3};
use traincarts_core::{BlockCoordinate, BlockFace};

use super::*;
use crate::cart::{Cart, CartId};
use crate::settings::TrainCartsConfig;
use crate::train::{SlowdownMode, TrainProperties};

const ALL_SLOPE_KINDS: [VerticalSlopeKind; 4] = [
    VerticalSlopeKind::NormalA,
    VerticalSlopeKind::NormalB,
    VerticalSlopeKind::UpsideDownA,
    VerticalSlopeKind::UpsideDownB,
];

fn cart_on(logic: &'static RailLogic, rail: BlockCoordinate, position: Vector3<f64>) -> Cart {
    let mut cart = Cart::new(CartId(1), position);
    cart.rail_tracker.force(rail, logic);
    cart
}

#[test]
fn test_vertical_slope_boundary_is_continuous() {
    for kind in ALL_SLOPE_KINDS {
        for direction in BlockFace::CARDINALS {
            let logic = RailLogic::vertical_slope(kind, direction);
            let rail = BlockCoordinate::new(3, 10, -4);
            let boundary = vertical_slope::boundary(kind, rail);
            // Approach the point where the slope meets the wall
            let x = rail.mid_x() - 1e-7;
            let z = rail.mid_z() - 1e-7;
            let below = logic.fixed_position(vec3(x, boundary - 2e-4, z), rail);
            let above = logic.fixed_position(vec3(x, boundary + 2e-4, z), rail);
            assert!(
                (below.x - above.x).abs() < 1e-6 && (below.z - above.z).abs() < 1e-6,
                "{:?} {:?}: {:?} vs {:?}",
                kind,
                direction,
                below,
                above
            );
            // Both halves meet at the boundary height
            assert!((below.y - boundary).abs() < 1e-6, "{:?} {:?}", kind, direction);
        }
    }
}

#[test]
fn test_vertical_slope_snap_off_centre() {
    for kind in ALL_SLOPE_KINDS {
        for direction in BlockFace::CARDINALS {
            let logic = RailLogic::vertical_slope(kind, direction);
            let rail = BlockCoordinate::new(-2, 7, 5);
            let boundary = vertical_slope::boundary(kind, rail);
            let uphill = direction.vector();
            for stage in [0.05, 0.3] {
                let off_centre = |y: f64| {
                    vec3(
                        rail.mid_x() + stage * uphill.x,
                        y,
                        rail.mid_z() + stage * uphill.z,
                    )
                };
                // Uphill of the middle the slope result is already on the wall
                let below = logic.fixed_position(off_centre(boundary - 2e-4), rail);
                let above = logic.fixed_position(off_centre(boundary + 2e-4), rail);
                for p in [below, above] {
                    assert_eq!(
                        (p.x, p.z),
                        (rail.mid_x(), rail.mid_z()),
                        "{:?} {:?}",
                        kind,
                        direction
                    );
                }
                assert!((below.y - (boundary + stage)).abs() < 1e-9);
            }
            for stage in [-0.3, 0.3] {
                let start = vec3(
                    rail.mid_x() + stage * uphill.x,
                    boundary - 2e-4,
                    rail.mid_z() + stage * uphill.z,
                );
                let once = logic.fixed_position(start, rail);
                let twice = logic.fixed_position(once, rail);
                assert!(
                    (once - twice).magnitude() < 1e-12,
                    "{:?} {:?}: {:?} then {:?}",
                    kind,
                    direction,
                    once,
                    twice
                );
            }
        }
    }
}

#[test]
fn test_forward_velocity_round_trip() {
    let rail = BlockCoordinate::new(0, 0, 0);
    let on_rail = vec3(0.5, 0.0625, 0.5);
    let vs_kind = VerticalSlopeKind::NormalA;
    let boundary = vertical_slope::boundary(vs_kind, rail);
    let cases: Vec<(&'static RailLogic, BlockFace, Vector3<f64>)> = vec![
        (RailLogic::horizontal(BlockFace::EAST, false), BlockFace::WEST, on_rail),
        (RailLogic::horizontal(BlockFace::NORTH, true), BlockFace::NORTH, on_rail),
        (
            RailLogic::horizontal(BlockFace::NORTH_EAST, false),
            BlockFace::SOUTH_EAST,
            on_rail,
        ),
        (RailLogic::sloped(BlockFace::EAST, false), BlockFace::EAST, on_rail),
        (RailLogic::vertical(BlockFace::SOUTH), BlockFace::UP, on_rail),
        (RailLogic::vertical(BlockFace::SOUTH), BlockFace::DOWN, on_rail),
        (
            RailLogic::vertical_slope(vs_kind, BlockFace::EAST),
            BlockFace::UP,
            vec3(0.5, boundary + 0.3, 0.5),
        ),
        (
            RailLogic::vertical_slope(vs_kind, BlockFace::EAST),
            BlockFace::WEST,
            vec3(0.3, boundary - 0.3, 0.5),
        ),
        (RailLogic::air(), BlockFace::NORTH_WEST, vec3(0.5, 5.0, 0.5)),
        (RailLogic::ground(), BlockFace::SOUTH, vec3(0.5, 1.0, 0.5)),
    ];
    for (logic, direction, position) in cases {
        for force in [-0.3, 0.0, 0.25] {
            let mut cart = cart_on(logic, rail, position);
            cart.set_direction(direction);
            logic.set_forward_velocity(&mut cart, force);
            let actual = logic.forward_velocity(&cart);
            assert!(
                (actual - force).abs() < 1e-9,
                "{:?} heading {:?}: set {} got {}",
                logic.kind(),
                direction,
                force,
                actual
            );
        }
    }
}

#[test]
fn test_gravity_multipliers() {
    let mut config = TrainCartsConfig::default();
    let mut properties = TrainProperties::from_config(&config);
    let sloped = RailLogic::sloped(BlockFace::NORTH, false);
    let vertical = RailLogic::vertical(BlockFace::NORTH);
    let horizontal = RailLogic::horizontal(BlockFace::NORTH, false);

    assert_eq!(sloped.gravity_multiplier(&properties, &config), SLOPE_VELOCITY_MULTIPLIER);
    assert_eq!(vertical.gravity_multiplier(&properties, &config), SLOPE_VELOCITY_MULTIPLIER);
    assert_eq!(horizontal.gravity_multiplier(&properties, &config), 0.0);
    assert_eq!(RailLogic::air().gravity_multiplier(&properties, &config), GRAVITY_MULTIPLIER);
    assert_eq!(RailLogic::ground().gravity_multiplier(&properties, &config), 0.0);

    config.legacy_vertical_gravity = true;
    assert_eq!(vertical.gravity_multiplier(&properties, &config), VERTRAIL_MULTIPLIER_LEGACY);
    assert_eq!(sloped.gravity_multiplier(&properties, &config), SLOPE_VELOCITY_MULTIPLIER);

    properties.set_slowing_down(SlowdownMode::Gravity, false);
    assert_eq!(vertical.gravity_multiplier(&properties, &config), 0.0);
    assert_eq!(sloped.gravity_multiplier(&properties, &config), 0.0);
    // Free fall is not a slowdown
    assert_eq!(RailLogic::air().gravity_multiplier(&properties, &config), GRAVITY_MULTIPLIER);
}

#[test]
fn test_spacing_update() {
    let logic = RailLogic::horizontal(BlockFace::EAST, false);
    let factor = vec3(0.4, 0.0, 0.0);

    let mut velocity = vec3(0.2, 0.0, 0.0);
    logic.on_spacing_update(&mut velocity, factor, &TrainCartsConfig::default());
    assert_eq!(velocity, vec3(0.2, 0.0, 0.0));

    let config = TrainCartsConfig {
        cart_distance_forcer: 0.5,
        cart_distance_forcer_constant: 0.1,
        ..Default::default()
    };
    let mut velocity = vec3(0.2, 0.0, 0.0);
    logic.on_spacing_update(&mut velocity, factor, &config);
    assert!((velocity.x - (0.2 * 1.04 + 0.04)).abs() < 1e-12);

    // The multiplicative part saturates at doubling the velocity
    let config = TrainCartsConfig {
        cart_distance_forcer: 100.0,
        ..config
    };
    let mut velocity = vec3(0.2, 0.0, 0.0);
    logic.on_spacing_update(&mut velocity, factor, &config);
    assert!((velocity.x - 0.44).abs() < 1e-12);
}

#[test]
fn test_tables_are_shared() {
    assert!(std::ptr::eq(
        RailLogic::horizontal(BlockFace::SOUTH_WEST, true),
        RailLogic::horizontal(BlockFace::SOUTH_WEST, true)
    ));
    let curve = RailLogic::horizontal(BlockFace::SOUTH_WEST, false);
    assert_eq!(curve.direction(), BlockFace::SOUTH_WEST);
    assert_eq!(curve.cart_direction(), BlockFace::NORTH_WEST);
    assert!(!curve.is_upside_down());
    assert_eq!(
        RailLogic::vertical_slope(VerticalSlopeKind::UpsideDownB, BlockFace::WEST).kind(),
        RailLogicKind::VerticalSlope(VerticalSlopeKind::UpsideDownB)
    );
}

#[test]
fn test_sloped_position() {
    let logic = RailLogic::sloped(BlockFace::EAST, false);
    let rail = BlockCoordinate::new(2, 4, 0);
    // Low end, middle and high end of the slope
    for (x, y) in [(2.0, 4.0625), (2.5, 4.5625), (3.0, 5.0625)] {
        let p = logic.fixed_position(vec3(x, 0.0, 7.0), rail);
        assert!((p.y - y).abs() < 1e-12, "{} -> {:?}", x, p);
        assert_eq!(p.z, 0.5);
    }
    let ud = RailLogic::sloped(BlockFace::EAST, true);
    let p = ud.fixed_position(vec3(2.5, 0.0, 0.5), rail);
    assert!((p.y - (4.5 + Y_POS_OFFSET_UPSIDEDOWN)).abs() < 1e-12);
}

#[test]
fn test_invalid_direction_is_ground() {
    let kind = VerticalSlopeKind::NormalA;
    for direction in [BlockFace::UP, BlockFace::SELF] {
        assert_eq!(RailLogic::horizontal(direction, false).kind(), RailLogicKind::Ground);
        assert_eq!(RailLogic::vertical(direction).kind(), RailLogicKind::Ground);
        assert_eq!(RailLogic::vertical_slope(kind, direction).kind(), RailLogicKind::Ground);
    }
    // Curves only exist flat
    assert_eq!(RailLogic::sloped(BlockFace::NORTH_EAST, true).kind(), RailLogicKind::Ground);
    assert_eq!(RailLogic::horizontal(BlockFace::NORTH, false).kind(), RailLogicKind::Horizontal);
}
