//! Agents and their per-tick movement rules.
//!
//! Two agent variants share the [`Agent`] contract:
//!
//! - [`AutonomousAgent`] wanders on its own. Its rendered heading lags the
//!   target heading by one degree per tick, and it picks a fresh random
//!   target whenever its path is blocked.
//! - [`ControlledAgent`] follows control intents. Turning is immediate
//!   (one degree per tick while held) and a blocked move simply does nothing.
//!
//! Stepping is split in two phases. [`Agent::plan`] reads a frozen view of
//! the arena and returns a [`StepOutcome`]; [`Agent::apply`] commits it. The
//! arena drives both phases (see [`Arena::step_autonomous`]) so agents never
//! hold a reference back into the arena that owns them.
//!
//! [`Arena::step_autonomous`]: crate::arena::Arena::step_autonomous

mod angle;

pub use angle::Angle;

use rand::{Rng, RngCore};
use robosim_geom::Position;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::{EntityId, EntityKind};
use crate::movement::can_move;

/// Inputs available to an agent while it plans one tick.
pub struct StepContext<'a> {
    /// Source of randomness for re-targeting.
    pub rng: &'a mut dyn RngCore,
    /// Whether the move intent is held this tick.
    pub move_intent: bool,
}

/// What an agent decided to do during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Nothing to do this tick.
    Idle,
    /// The rendered heading advanced one degree toward the target.
    Turned(Angle),
    /// The agent advanced to a new position.
    Moved(Position),
    /// The candidate position was illegal.
    Blocked {
        /// New target heading, for variants that re-turn when blocked.
        retarget: Option<Angle>,
    },
}

impl StepOutcome {
    /// Returns true if this outcome changes the agent's position.
    #[must_use]
    pub fn is_move(&self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

/// Shared contract for both agent variants.
pub trait Agent {
    /// Arena-assigned identity.
    fn id(&self) -> EntityId;

    /// Variant tag.
    fn kind(&self) -> EntityKind;

    /// Current position.
    fn position(&self) -> Position;

    /// Heading used for motion and drawing.
    fn angle(&self) -> Angle;

    /// Decides this tick's action against a read-only arena.
    fn plan(&self, arena: &Arena, ctx: &mut StepContext<'_>) -> StepOutcome;

    /// Commits a previously planned outcome.
    fn apply(&mut self, outcome: StepOutcome);

    /// Snapshot for drawing.
    fn view(&self) -> AgentView {
        AgentView {
            id: self.id(),
            kind: self.kind(),
            position: self.position(),
            angle: self.angle(),
        }
    }
}

/// Read-only agent state handed to drawing code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    /// Agent identity.
    pub id: EntityId,
    /// Variant tag.
    pub kind: EntityKind,
    /// Current position.
    pub position: Position,
    /// Rendered heading.
    pub angle: Angle,
}

// =============================================================================
// Autonomous
// =============================================================================

/// An agent that moves on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct AutonomousAgent {
    id: EntityId,
    position: Position,
    target_angle: Angle,
    render_angle: Angle,
}

impl AutonomousAgent {
    /// Creates an agent at `position` facing 0 degrees.
    ///
    /// The id is assigned when the agent is inserted into an arena.
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self::with_heading(position, Angle::ZERO)
    }

    /// Creates an agent whose target and rendered headings are `heading`.
    #[must_use]
    pub fn with_heading(position: Position, heading: Angle) -> Self {
        Self {
            id: EntityId::new(0),
            position,
            target_angle: heading,
            render_angle: heading,
        }
    }

    /// Heading the agent is turning toward.
    #[must_use]
    pub fn target_angle(&self) -> Angle {
        self.target_angle
    }

    /// Heading the agent currently faces.
    #[must_use]
    pub fn render_angle(&self) -> Angle {
        self.render_angle
    }

    /// Sets a new target heading; the rendered heading catches up over the
    /// following ticks.
    pub fn set_target_angle(&mut self, angle: Angle) {
        self.target_angle = angle;
    }

    /// Returns true while the rendered heading still lags the target.
    #[must_use]
    pub fn is_turning(&self) -> bool {
        self.render_angle != self.target_angle
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Agent for AutonomousAgent {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Autonomous
    }

    fn position(&self) -> Position {
        self.position
    }

    fn angle(&self) -> Angle {
        self.render_angle
    }

    fn plan(&self, arena: &Arena, ctx: &mut StepContext<'_>) -> StepOutcome {
        if self.is_turning() {
            return StepOutcome::Turned(self.render_angle.step_toward(self.target_angle));
        }

        let candidate = self.position.advanced(self.render_angle.as_f64());
        if can_move(arena, self.id, candidate) {
            StepOutcome::Moved(candidate)
        } else {
            let degrees: i64 = ctx.rng.gen_range(0..360);
            StepOutcome::Blocked {
                retarget: Some(Angle::new(degrees)),
            }
        }
    }

    fn apply(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Turned(angle) => self.render_angle = angle,
            StepOutcome::Moved(position) => self.position = position,
            StepOutcome::Blocked {
                retarget: Some(angle),
            } => self.target_angle = angle,
            StepOutcome::Idle | StepOutcome::Blocked { retarget: None } => {}
        }
    }
}

// =============================================================================
// Controlled
// =============================================================================

/// Turn input held during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TurnIntent {
    /// Counter-clockwise, -1 degree per tick.
    Left,
    /// No turn.
    #[default]
    None,
    /// Clockwise, +1 degree per tick.
    Right,
}

impl TurnIntent {
    /// Degrees applied per tick.
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::None => 0,
            Self::Right => 1,
        }
    }
}

/// An agent driven by control intents.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlledAgent {
    id: EntityId,
    position: Position,
    angle: Angle,
}

impl ControlledAgent {
    /// Creates an agent at `position` facing 0 degrees.
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self::with_heading(position, Angle::ZERO)
    }

    /// Creates an agent facing `heading`.
    #[must_use]
    pub fn with_heading(position: Position, heading: Angle) -> Self {
        Self {
            id: EntityId::new(0),
            position,
            angle: heading,
        }
    }

    /// Applies one tick of turn input.
    pub fn turn(&mut self, intent: TurnIntent) {
        self.angle = self.angle.rotated(intent.delta());
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Agent for ControlledAgent {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Controlled
    }

    fn position(&self) -> Position {
        self.position
    }

    fn angle(&self) -> Angle {
        self.angle
    }

    fn plan(&self, arena: &Arena, ctx: &mut StepContext<'_>) -> StepOutcome {
        if !ctx.move_intent {
            return StepOutcome::Idle;
        }

        let candidate = self.position.advanced(self.angle.as_f64());
        if can_move(arena, self.id, candidate) {
            StepOutcome::Moved(candidate)
        } else {
            StepOutcome::Blocked { retarget: None }
        }
    }

    fn apply(&mut self, outcome: StepOutcome) {
        if let StepOutcome::Moved(position) = outcome {
            self.position = position;
        }
    }
}
