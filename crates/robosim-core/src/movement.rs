//! Movement legality shared by both agent variants.
//!
//! A candidate position is legal when it lies inside the arena bounds, its
//! hull stays clear of every obstacle footprint, and its body stays clear of
//! every other agent's body. The moving agent is excluded from the agent
//! checks by identity, never by position, so an agent never blocks itself
//! and two distinct agents that share coordinates still block each other.

use robosim_geom::{Circle, Position, Rect};

use crate::agent::Agent;
use crate::arena::Arena;
use crate::entity::EntityId;

/// Returns true if the agent `mover` may occupy `candidate`.
///
/// # Example
///
/// ```
/// use robosim_core::arena::Arena;
/// use robosim_core::entity::EntityId;
/// use robosim_core::movement::can_move;
/// use robosim_geom::Position;
///
/// let mut arena = Arena::new();
/// arena.add_obstacle(Position::new(60.0, 0.0)).unwrap();
///
/// let mover = EntityId::new(99);
/// assert!(can_move(&arena, mover, Position::new(10.0, 0.0)));
/// assert!(!can_move(&arena, mover, Position::new(30.0, 0.0)));
/// assert!(!can_move(&arena, mover, Position::new(-1.0, 0.0)));
/// ```
#[must_use]
pub fn can_move(arena: &Arena, mover: EntityId, candidate: Position) -> bool {
    if !arena.bounds().contains(candidate) {
        return false;
    }

    let body = Circle::body(candidate);
    let hits_agent = |other: &dyn Agent| {
        other.id() != mover && body.overlaps_circle(&Circle::body(other.position()))
    };

    if arena.autonomous().iter().any(|a| hits_agent(a)) {
        return false;
    }

    let hull = Circle::hull(candidate);
    if arena
        .obstacles()
        .iter()
        .any(|o| hull.overlaps_rect(&Rect::obstacle(o.position())))
    {
        return false;
    }

    !arena.controlled().iter().any(|c| hits_agent(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AutonomousAgent, ControlledAgent};

    #[test]
    fn out_of_bounds_is_illegal() {
        let arena = Arena::new();
        let mover = EntityId::new(0);
        assert!(!can_move(&arena, mover, Position::new(1110.0, 0.0)));
        assert!(!can_move(&arena, mover, Position::new(0.0, 630.0)));
        assert!(can_move(&arena, mover, Position::new(1109.0, 629.0)));
    }

    #[test]
    fn mover_never_blocks_itself() {
        let mut arena = Arena::new();
        let id = arena
            .add_autonomous(AutonomousAgent::new(Position::new(300.0, 300.0)))
            .unwrap();
        assert!(can_move(&arena, id, Position::new(301.0, 300.0)));
    }

    #[test]
    fn other_agent_blocks() {
        let mut arena = Arena::new();
        let a = arena
            .add_autonomous(AutonomousAgent::new(Position::new(300.0, 300.0)))
            .unwrap();
        let b = arena
            .add_autonomous(AutonomousAgent::new(Position::new(328.0, 300.0)))
            .unwrap();
        // bodies 27 apart after the step, radii sum 28
        assert!(!can_move(&arena, a, Position::new(301.0, 300.0)));
        assert!(!can_move(&arena, b, Position::new(327.0, 300.0)));
    }

    #[test]
    fn controlled_agent_blocks_autonomous_and_vice_versa() {
        let mut arena = Arena::new();
        let auto = arena
            .add_autonomous(AutonomousAgent::new(Position::new(300.0, 300.0)))
            .unwrap();
        let ctrl = arena
            .add_controlled(ControlledAgent::new(Position::new(328.0, 300.0)))
            .unwrap();
        assert!(!can_move(&arena, auto, Position::new(301.0, 300.0)));
        assert!(!can_move(&arena, ctrl, Position::new(327.0, 300.0)));
        // moving apart is fine
        assert!(can_move(&arena, ctrl, Position::new(329.0, 300.0)));
    }

    #[test]
    fn obstacle_edge_blocks() {
        let mut arena = Arena::new();
        arena.add_obstacle(Position::new(30.0, 0.0)).unwrap();
        let mover = EntityId::new(42);
        assert!(!can_move(&arena, mover, Position::new(1.0, 0.0)));
        // obstacle spans 30..59, so hull center must be more than 15 past 59
        assert!(!can_move(&arena, mover, Position::new(59.0, 0.0)));
        assert!(can_move(&arena, mover, Position::new(60.0, 0.0)));
    }
}
