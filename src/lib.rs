/// Golf Brawl simulation core.
///
/// `domain` holds the rules that act on a single actor (tiles, collision,
/// integration, combat, behaviours, player control). `sim` owns a running
/// level and advances it one fixed step at a time.

pub mod config;
pub mod domain;
pub mod sim;
