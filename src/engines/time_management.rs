//! Search budgets and the cancellation predicate.
//!
//! The protocol layer passes raw limits (`depth`, `nodes`, `movetime`,
//! clock data); this module turns them into a `TimeBudget` and answers the
//! search's "keep going?" questions while a run is in progress.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::game_state::chess_types::{Color, Move};
use crate::search::threading::SearchSignals;

/// Moves assumed left in the game when the clock does not say.
pub const DEFAULT_MOVES_TO_GO: u32 = 40;

const SAFETY_RESERVE_CAP: Duration = Duration::from_secs(1);
const MIN_SOFT_BUDGET: Duration = Duration::from_millis(10);
const MIN_CEILING: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockControl {
    pub white_time: Duration,
    pub black_time: Duration,
    pub white_increment: Duration,
    pub black_increment: Duration,
    pub moves_to_go: Option<u32>,
}

impl ClockControl {
    #[inline]
    fn for_side(&self, side: Color) -> (Duration, Duration) {
        match side {
            Color::White => (self.white_time, self.white_increment),
            Color::Black => (self.black_time, self.black_increment),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Depth(u32),
    Nodes(u64),
    MoveTime(Duration),
    Clock(ClockControl),
    Infinite,
}

/// Everything a search run is told about when to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConstraints {
    pub limit: SearchLimit,
    /// Run without limits until a ponder hit, then budget `limit` from the
    /// instant of the hit.
    pub ponder: bool,
    /// Restricts the root to these moves when non-empty.
    pub search_moves: Vec<Move>,
}

impl SearchConstraints {
    pub fn new(limit: SearchLimit) -> Self {
        Self {
            limit,
            ponder: false,
            search_moves: Vec::new(),
        }
    }

    pub fn pondering(mut self) -> Self {
        self.ponder = true;
        self
    }

    pub fn restricted_to(mut self, moves: Vec<Move>) -> Self {
        self.search_moves = moves;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBudget {
    /// Past this, no new depth is started.
    pub soft: Option<Duration>,
    /// Past this, the run is cancelled mid-depth.
    pub hard: Option<Duration>,
    pub nodes: Option<u64>,
    pub depth: Option<u32>,
}

impl TimeBudget {
    pub const UNLIMITED: TimeBudget = TimeBudget {
        soft: None,
        hard: None,
        nodes: None,
        depth: None,
    };
}

pub fn budget(limit: &SearchLimit, side_to_move: Color, move_overhead: Duration) -> TimeBudget {
    match *limit {
        SearchLimit::Depth(depth) => TimeBudget {
            depth: Some(depth.max(1)),
            ..TimeBudget::UNLIMITED
        },
        SearchLimit::Nodes(nodes) => TimeBudget {
            nodes: Some(nodes.max(1)),
            ..TimeBudget::UNLIMITED
        },
        SearchLimit::MoveTime(move_time) => TimeBudget {
            soft: Some(move_time),
            hard: Some(move_time),
            ..TimeBudget::UNLIMITED
        },
        SearchLimit::Clock(clock) => clock_budget(&clock, side_to_move, move_overhead),
        SearchLimit::Infinite => TimeBudget::UNLIMITED,
    }
}

fn clock_budget(clock: &ClockControl, side: Color, move_overhead: Duration) -> TimeBudget {
    let (remaining, increment) = clock.for_side(side);
    let remaining = remaining.saturating_sub(move_overhead);

    let reserve = SAFETY_RESERVE_CAP.min(remaining / 10);
    let ceiling = (remaining * 95 / 100)
        .saturating_sub(reserve)
        .max(MIN_CEILING);

    let moves_to_go = clock.moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
    let target = (ceiling + increment * (moves_to_go - 1)) / moves_to_go;

    let soft = target.clamp(MIN_SOFT_BUDGET.min(ceiling), ceiling);
    let hard = (soft * 3).min(ceiling);

    TimeBudget {
        soft: Some(soft),
        hard: Some(hard),
        ..TimeBudget::UNLIMITED
    }
}

/// Per-run view of the budget, polled by the search.
#[derive(Debug)]
pub struct TimeManager {
    limit: SearchLimit,
    side_to_move: Color,
    move_overhead: Duration,
    signals: Arc<SearchSignals>,

    budget: TimeBudget,
    clock_start: Instant,
    pondering: bool,
}

impl TimeManager {
    pub fn new(
        constraints: &SearchConstraints,
        side_to_move: Color,
        move_overhead: Duration,
        signals: Arc<SearchSignals>,
    ) -> Self {
        let pondering = constraints.ponder;
        let budget = if pondering {
            TimeBudget::UNLIMITED
        } else {
            budget(&constraints.limit, side_to_move, move_overhead)
        };

        Self {
            limit: constraints.limit,
            side_to_move,
            move_overhead,
            signals,
            budget,
            clock_start: Instant::now(),
            pondering,
        }
    }

    #[inline]
    pub fn budget(&self) -> TimeBudget {
        self.budget
    }

    #[inline]
    pub fn limit(&self) -> SearchLimit {
        self.limit
    }

    #[inline]
    pub fn is_pondering(&self) -> bool {
        self.pondering
    }

    /// Applies a pending ponder hit: the wrapped limit is budgeted from the
    /// instant the hit arrived.
    pub fn refresh_ponder(&mut self) {
        if self.pondering && self.signals.ponder_hit_received() {
            self.pondering = false;
            self.budget = budget(&self.limit, self.side_to_move, self.move_overhead);
            self.clock_start = self.signals.ponder_hit_at().unwrap_or_else(Instant::now);
            log::debug!("ponder hit, budget now {:?}", self.budget);
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.clock_start.elapsed()
    }

    #[inline]
    pub fn stop_requested(&self) -> bool {
        self.signals.stop_requested()
    }

    #[inline]
    pub fn node_limit_reached(&self, nodes: u64) -> bool {
        self.budget.nodes.is_some_and(|limit| nodes >= limit)
    }

    /// The cancellation predicate: external stop, hard deadline or node
    /// limit.
    pub fn should_stop(&mut self, nodes: u64) -> bool {
        self.refresh_ponder();
        self.stop_requested()
            || self.node_limit_reached(nodes)
            || self.budget.hard.is_some_and(|hard| self.elapsed() >= hard)
    }

    /// Whether iteration `depth` may begin. Only the soft deadline and the
    /// depth limit are consulted here.
    pub fn may_start_depth(&mut self, depth: u32) -> bool {
        self.refresh_ponder();
        if self.budget.depth.is_some_and(|limit| depth > limit) {
            return false;
        }
        !self.budget.soft.is_some_and(|soft| self.elapsed() >= soft)
    }

    /// Runs that must not report a result before being told to: infinite
    /// analysis and ponder runs that have not been hit yet.
    #[inline]
    pub fn is_open_ended(&self) -> bool {
        self.pondering || self.limit == SearchLimit::Infinite
    }

    #[inline]
    pub fn uses_clock(&self) -> bool {
        !self.pondering && matches!(self.limit, SearchLimit::Clock(_))
    }
}
