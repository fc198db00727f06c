//! Per-cell flow rule.
//!
//! Computes one cell's next density from the committed snapshot and its six
//! face neighbours. Each enabled direction drains the cell towards the
//! neighbour at `direction.offset()` and fills it from the opposite
//! neighbour. Contributions of all enabled directions are summed from the
//! same snapshot, then clamped to `[0, max_density]`.
//!
//! The rule never writes anything but its return value, so a sweep can
//! evaluate every cell concurrently.

use crate::schema::{Density, Direction, DirectionConfig, TransferScheme};

use super::GridDims;

/// Whether density may move from a cell holding `src` into its neighbour
/// holding `dst` along `direction`.
///
/// Gravity only needs something to give and room to receive. Lateral
/// directions additionally require the receiver to be strictly lower.
#[inline]
pub fn can_flow(direction: Direction, src: Density, dst: Density, max_density: Density) -> bool {
    if !direction.transfers() || src <= 0 || dst >= max_density {
        return false;
    }
    direction.is_gravity() || dst < src
}

/// Compute the next density of the cell at `index`.
#[inline]
pub fn next_density(
    index: usize,
    current: &[Density],
    dims: &GridDims,
    rules: &DirectionConfig,
) -> Density {
    match rules.scheme() {
        TransferScheme::Independent => independent_density(index, current, dims, rules),
        TransferScheme::Paired => paired_density(index, current, dims, rules),
    }
}

/// Each cell decides from its own view of the snapshot: lose `flow_rate`
/// per direction it can drain into, gain `flow_rate` per direction it can
/// fill from. Neighbours never coordinate, so the two sides of a pair may
/// disagree once the clamp kicks in.
fn independent_density(
    index: usize,
    current: &[Density],
    dims: &GridDims,
    rules: &DirectionConfig,
) -> Density {
    let coord = dims.to_coord(index);
    let density = current[index];
    let max = rules.max_density();
    let rate = i64::from(rules.flow_rate());
    let mut output = i64::from(density);

    for direction in rules.directions().iter().filter(|d| d.transfers()) {
        if let Some(target) = dims.neighbor(coord, direction) {
            if can_flow(direction, density, current[target], max) {
                output -= rate;
            }
        }
        if let Some(source) = dims.neighbor(coord, direction.opposite()) {
            if can_flow(direction, current[source], density, max) {
                output += rate;
            }
        }
    }

    clamp_density(output, max)
}

/// One flux per directed edge, evaluated identically by both endpoints.
///
/// With `k` transferring directions a cell is the source of at most `k`
/// edges and the sink of at most `k`, so limiting each flux to `src / k` and
/// `(max - dst) / k` keeps the output in bounds without clamping and the
/// grid total unchanged. Lateral fluxes stop at the pair's midpoint.
fn paired_density(
    index: usize,
    current: &[Density],
    dims: &GridDims,
    rules: &DirectionConfig,
) -> Density {
    let density = current[index];
    let edges = rules.directions().transfer_count() as Density;
    if edges == 0 {
        return density;
    }

    let coord = dims.to_coord(index);
    let max = rules.max_density();
    let rate = rules.flow_rate();
    let flux = |direction: Direction, src: Density, dst: Density| -> i64 {
        if !can_flow(direction, src, dst, max) {
            return 0;
        }
        let mut amount = rate.min(src / edges).min((max - dst) / edges);
        if !direction.is_gravity() {
            amount = amount.min((src - dst) / 2);
        }
        i64::from(amount)
    };

    let mut output = i64::from(density);
    for direction in rules.directions().iter().filter(|d| d.transfers()) {
        if let Some(target) = dims.neighbor(coord, direction) {
            output -= flux(direction, density, current[target]);
        }
        if let Some(source) = dims.neighbor(coord, direction.opposite()) {
            output += flux(direction, current[source], density);
        }
    }

    clamp_density(output, max)
}

#[inline]
fn clamp_density(value: i64, max_density: Density) -> Density {
    // Bounded by [0, max_density], so the narrowing cast is lossless.
    value.clamp(0, i64::from(max_density)) as Density
}
