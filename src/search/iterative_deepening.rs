//! Iterative deepening search with negamax alpha-beta pruning.
//!
//! Each iteration runs a full-window fail-soft negamax from the root, ending
//! in a quiescence search that resolves captures (or every evasion when in
//! check). The line from the last completed iteration seeds move ordering
//! for the next one through `prev_pv`.
//!
//! All moves are applied through `Position::play`, so unwinding on
//! cancellation or error leaves the caller's position exactly as it was.
//!
//! A transposition table would be probed on node entry in `negamax` and
//! consulted for the first move in `order_moves`; there is none yet.

use std::thread;
use std::time::{Duration, Instant};

use crate::engines::time_management::{SearchLimit, TimeManager};
use crate::errors::EngineError;
use crate::game_state::chess_types::*;
use crate::move_generation::move_generator::{legal_captures, legal_moves};
use crate::search::board_scoring::{
    is_mate_score, BoardScorer, DRAW_SCORE, INFINITE_SCORE, MATE_SCORE,
};
use crate::search::move_ordering::order_moves;

pub const MAX_DEPTH: u32 = 64;
pub const MAX_PLY: usize = 128;
/// Nodes between polls of the stop flag, the deadline and ponder hits.
pub const POLL_INTERVAL: u64 = 1024;
pub const DEFAULT_QUIESCENCE_DEPTH: u32 = 8;

/// Root moves are reported individually once an iteration runs this long.
const CURRENT_MOVE_REPORT_DELAY: Duration = Duration::from_secs(1);
/// Sleep between polls while holding a finished result.
const RELEASE_POLL: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Running,
    /// A budget ran out, or every iteration finished.
    Completed,
    /// An external stop was observed.
    Stopped,
    /// An internal error ended the run; the result carries no move.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationReport {
    pub depth: u32,
    pub sel_depth: u32,
    pub nodes: u64,
    pub score: i32,
    pub pv: Vec<Move>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchReport {
    Iteration(IterationReport),
    CurrentMove {
        depth: u32,
        mv: Move,
        number: usize,
        nodes: u64,
        elapsed: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub ponder_move: Option<Move>,
    pub depth: u32,
    pub sel_depth: u32,
    pub nodes: u64,
    pub score: Option<i32>,
    pub elapsed: Duration,
    pub state: SearchState,
}

/// Why the recursion unwound early.
#[derive(Debug)]
enum Halt {
    Cancelled,
    Failed(EngineError),
}

impl From<EngineError> for Halt {
    fn from(err: EngineError) -> Self {
        Halt::Failed(err)
    }
}

type NodeResult = Result<i32, Halt>;

pub struct Searcher<'a> {
    scorer: &'a dyn BoardScorer,
    time: TimeManager,
    quiescence_depth: u32,
    started: Instant,
    state: SearchState,

    nodes: u64,
    next_poll: u64,
    sel_depth: u32,

    // pv[ply] is the best line found below `ply` in the current iteration.
    pv: Vec<Vec<Move>>,
    prev_pv: [Option<Move>; MAX_PLY],
}

impl<'a> Searcher<'a> {
    pub fn new(scorer: &'a dyn BoardScorer, time: TimeManager, quiescence_depth: u32) -> Self {
        Self {
            scorer,
            time,
            quiescence_depth,
            started: Instant::now(),
            state: SearchState::Idle,
            nodes: 0,
            next_poll: POLL_INTERVAL,
            sel_depth: 0,
            pv: (0..=MAX_PLY).map(|_| Vec::with_capacity(MAX_PLY)).collect(),
            prev_pv: [None; MAX_PLY],
        }
    }

    #[inline]
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Runs iterative deepening on `position` and returns the best line.
    ///
    /// `search_moves`, when non-empty, restricts the root. `report` receives
    /// one `Iteration` per completed depth, in increasing depth order.
    pub fn run<R>(&mut self, position: &mut Position, search_moves: &[Move], report: &mut R) -> SearchResult
    where
        R: FnMut(SearchReport),
    {
        self.started = Instant::now();
        self.state = SearchState::Running;

        let mut root_moves = match self.root_moves(position, search_moves) {
            Ok(moves) => moves,
            Err(err) => return self.abort(err),
        };

        let mut completed: Option<IterationReport> = None;
        let mut cancelled = false;

        if root_moves.is_empty() {
            log::debug!("no legal moves at the root");
        } else {
            for depth in 1..=MAX_DEPTH {
                if self.time.should_stop(self.nodes) {
                    cancelled = true;
                    break;
                }
                if !self.time.may_start_depth(depth) {
                    break;
                }

                match self.search_root(position, &mut root_moves, depth, report) {
                    Ok(score) => {
                        let iteration = IterationReport {
                            depth,
                            sel_depth: self.sel_depth,
                            nodes: self.nodes,
                            score,
                            pv: self.pv[0].clone(),
                            elapsed: self.started.elapsed(),
                        };
                        log::debug!(
                            "depth {} score {} nodes {} pv {}",
                            depth,
                            score,
                            self.nodes,
                            format_line(&iteration.pv)
                        );

                        self.prev_pv = [None; MAX_PLY];
                        for (slot, mv) in self.prev_pv.iter_mut().zip(&iteration.pv) {
                            *slot = Some(*mv);
                        }
                        report(SearchReport::Iteration(iteration.clone()));
                        completed = Some(iteration);

                        if self.time.uses_clock() && Self::clock_can_stop_early(&root_moves, score, depth) {
                            break;
                        }
                    }
                    Err(Halt::Cancelled) => {
                        cancelled = true;
                        break;
                    }
                    Err(Halt::Failed(err)) => return self.abort(err),
                }
            }
        }

        if !cancelled {
            self.hold_result();
        }

        self.state = if self.time.stop_requested() {
            SearchState::Stopped
        } else {
            SearchState::Completed
        };

        let (line, score, depth) = match &completed {
            Some(iteration) => (iteration.pv.as_slice(), Some(iteration.score), iteration.depth),
            None => (self.pv[0].as_slice(), None, 0),
        };
        let best_move = line.first().copied().or_else(|| root_moves.first().copied());
        let ponder_move = if line.len() >= 2 && line.first().copied() == best_move {
            line.get(1).copied()
        } else {
            None
        };

        SearchResult {
            best_move,
            ponder_move,
            depth,
            sel_depth: self.sel_depth,
            nodes: self.nodes,
            score,
            elapsed: self.started.elapsed(),
            state: self.state,
        }
    }

    fn root_moves(&mut self, position: &mut Position, search_moves: &[Move]) -> Result<Vec<Move>, EngineError> {
        let mut moves = legal_moves(position)?;
        if !search_moves.is_empty() {
            let restricted: Vec<Move> = moves
                .iter()
                .copied()
                .filter(|mv| search_moves.iter().any(|wanted| wanted.same_coordinates(mv)))
                .collect();
            if restricted.is_empty() {
                log::warn!("none of the restricted root moves are legal; searching all moves");
            } else {
                moves = restricted;
            }
        }
        Ok(moves)
    }

    /// In clock mode, a forced move or a mate inside the searched horizon
    /// will not change with more depth.
    fn clock_can_stop_early(root_moves: &[Move], score: i32, depth: u32) -> bool {
        if root_moves.len() == 1 {
            return true;
        }
        is_mate_score(score) && (MATE_SCORE - score.abs()) as u32 <= depth
    }

    /// Keeps a finished result back while the run may not report yet:
    /// infinite and unhit ponder runs wait for stop or ponder hit, fixed
    /// move-time runs wait out their time.
    fn hold_result(&mut self) {
        loop {
            self.time.refresh_ponder();
            if self.time.stop_requested() {
                return;
            }
            let waiting = self.time.is_open_ended() || self.move_time_remaining();
            if !waiting {
                return;
            }
            thread::sleep(RELEASE_POLL);
        }
    }

    fn move_time_remaining(&self) -> bool {
        match self.time.limit() {
            SearchLimit::MoveTime(_) => self
                .time
                .budget()
                .hard
                .is_some_and(|hard| self.time.elapsed() < hard),
            _ => false,
        }
    }

    fn abort(&mut self, err: EngineError) -> SearchResult {
        log::error!("search aborted: {err}");
        self.state = SearchState::Aborted;
        SearchResult {
            best_move: None,
            ponder_move: None,
            depth: 0,
            sel_depth: self.sel_depth,
            nodes: self.nodes,
            score: None,
            elapsed: self.started.elapsed(),
            state: self.state,
        }
    }

    fn search_root<R>(
        &mut self,
        position: &mut Position,
        root_moves: &mut [Move],
        depth: u32,
        report: &mut R,
    ) -> NodeResult
    where
        R: FnMut(SearchReport),
    {
        self.pv[0].clear();
        order_moves(root_moves, self.prev_pv[0]);

        let mut alpha = -INFINITE_SCORE;
        let beta = INFINITE_SCORE;
        let mut best = -INFINITE_SCORE;

        for (index, &mv) in root_moves.iter().enumerate() {
            if self.time.should_stop(self.nodes) {
                return Err(Halt::Cancelled);
            }

            let elapsed = self.started.elapsed();
            if elapsed >= CURRENT_MOVE_REPORT_DELAY {
                report(SearchReport::CurrentMove {
                    depth,
                    mv,
                    number: index + 1,
                    nodes: self.nodes,
                    elapsed,
                });
            }

            let score = {
                let mut child = position.play(mv)?;
                -self.negamax(&mut child, depth - 1, -beta, -alpha, 1)?
            };

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
                self.update_pv(0, mv);
            }
        }

        Ok(best)
    }

    fn negamax(&mut self, position: &mut Position, depth: u32, mut alpha: i32, beta: i32, ply: usize) -> NodeResult {
        if depth == 0 {
            return self.quiescence(position, alpha, beta, ply, 0);
        }

        self.enter_node(ply)?;
        if Self::is_rule_draw(position) {
            return Ok(DRAW_SCORE);
        }
        if ply >= MAX_PLY - 1 {
            return Ok(self.scorer.score(position));
        }

        let in_check = position.is_in_check(position.side_to_move);
        let mut moves = legal_moves(position)?;
        if moves.is_empty() {
            return Ok(Self::terminal_score(in_check, ply));
        }
        order_moves(&mut moves, self.prev_pv[ply]);

        let mut best = -INFINITE_SCORE;
        for mv in moves {
            let score = {
                let mut child = position.play(mv)?;
                -self.negamax(&mut child, depth - 1, -beta, -alpha, ply + 1)?
            };

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
                self.update_pv(ply, mv);
                if alpha >= beta {
                    break;
                }
            }
        }

        Ok(best)
    }

    fn quiescence(&mut self, position: &mut Position, mut alpha: i32, beta: i32, ply: usize, qdepth: u32) -> NodeResult {
        self.enter_node(ply)?;
        if Self::is_rule_draw(position) {
            return Ok(DRAW_SCORE);
        }

        let in_check = position.is_in_check(position.side_to_move);
        let mut best = -INFINITE_SCORE;

        if !in_check {
            let stand_pat = self.scorer.score(position);
            if stand_pat >= beta {
                return Ok(stand_pat);
            }
            best = stand_pat;
            alpha = alpha.max(stand_pat);
        }

        if qdepth >= self.quiescence_depth || ply >= MAX_PLY - 1 {
            return Ok(if in_check { self.scorer.score(position) } else { best });
        }

        let mut moves = if in_check {
            legal_moves(position)?
        } else {
            legal_captures(position)?
        };
        if in_check && moves.is_empty() {
            return Ok(Self::terminal_score(true, ply));
        }
        order_moves(&mut moves, None);

        for mv in moves {
            let score = {
                let mut child = position.play(mv)?;
                -self.quiescence(&mut child, -beta, -alpha, ply + 1, qdepth + 1)?
            };

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
                self.update_pv(ply, mv);
                if alpha >= beta {
                    break;
                }
            }
        }

        Ok(best)
    }

    /// Counts the node and runs the cancellation checks. The node limit is
    /// exact; everything else is polled every `POLL_INTERVAL` nodes.
    fn enter_node(&mut self, ply: usize) -> Result<(), Halt> {
        self.nodes += 1;
        self.pv[ply].clear();
        self.sel_depth = self.sel_depth.max(ply as u32);

        if self.time.node_limit_reached(self.nodes) {
            return Err(Halt::Cancelled);
        }
        if self.nodes >= self.next_poll {
            self.next_poll = self.nodes + POLL_INTERVAL;
            if self.time.should_stop(self.nodes) {
                return Err(Halt::Cancelled);
            }
        }
        Ok(())
    }

    fn update_pv(&mut self, ply: usize, mv: Move) {
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(mv);
        line.extend_from_slice(&tail[0]);
    }

    #[inline]
    fn is_rule_draw(position: &Position) -> bool {
        position.is_fifty_move_draw() || position.is_repetition() || position.has_insufficient_material()
    }

    #[inline]
    fn terminal_score(in_check: bool, ply: usize) -> i32 {
        if in_check {
            -MATE_SCORE + ply as i32
        } else {
            DRAW_SCORE
        }
    }
}

pub fn format_line(line: &[Move]) -> String {
    line.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}
