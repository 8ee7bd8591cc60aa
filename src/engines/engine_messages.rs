//! Commands into the engine and events out of it.
//!
//! Both are closed enums: the protocol layer translates text to
//! `EngineCommand` and `EngineEvent` back to text, and nothing in between
//! depends on the wire format.

use std::time::Duration;

use crate::engines::time_management::{ClockControl, SearchLimit};
use crate::errors::NotationError;
use crate::game_state::chess_types::Move;
use crate::search::board_scoring::{mate_in_moves, MATE_SCORE};
use crate::search::iterative_deepening::{IterationReport, SearchReport};

/// Raw `go` parameters as received. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoRequest {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub movestogo: Option<u32>,
    pub ponder: bool,
    pub infinite: bool,
    pub searchmoves: Vec<String>,
}

impl GoRequest {
    /// The limit this request asks for. When several are given, the first of
    /// infinite, depth, nodes, movetime and clock wins; a bare `go` runs
    /// until stopped.
    pub fn limit(&self) -> SearchLimit {
        if self.infinite {
            return SearchLimit::Infinite;
        }
        if let Some(depth) = self.depth {
            return SearchLimit::Depth(depth.max(1));
        }
        if let Some(nodes) = self.nodes {
            return SearchLimit::Nodes(nodes.max(1));
        }
        if let Some(ms) = self.movetime_ms {
            return SearchLimit::MoveTime(Duration::from_millis(ms));
        }
        if self.wtime_ms.is_some() || self.btime_ms.is_some() {
            let ms = |v: Option<u64>| Duration::from_millis(v.unwrap_or(0));
            return SearchLimit::Clock(ClockControl {
                white_time: ms(self.wtime_ms),
                black_time: ms(self.btime_ms),
                white_increment: ms(self.winc_ms),
                black_increment: ms(self.binc_ms),
                moves_to_go: self.movestogo,
            });
        }
        SearchLimit::Infinite
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Initialize,
    NewGame,
    ReadyRequest(String),
    SetOption { name: String, value: String },
    Debug(bool),
    /// `fen: None` means the standard starting position.
    AnalyzePosition { fen: Option<String>, moves: Vec<String> },
    StartCalculating(GoRequest),
    StopCalculating,
    PonderHit,
    Quit,
    /// An input line for `command` that could not be parsed.
    Malformed {
        command: String,
        error: NotationError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Full moves to mate; negative when the side to move is getting mated.
    Mate(i32),
}

impl Score {
    pub fn from_search(score: i32) -> Self {
        match mate_in_moves(score) {
            Some(moves) => Score::Mate(moves),
            None => Score::Centipawns(score.clamp(-MATE_SCORE, MATE_SCORE)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub max_depth: Option<u32>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Option<Vec<Move>>,
    pub elapsed: Option<Duration>,
    pub nps: Option<u64>,
    pub current_move: Option<Move>,
    pub current_move_number: Option<usize>,
    pub message: Option<String>,
}

impl SearchInfo {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::default()
        }
    }

    /// Summary sent once a run ends: completed depth, nodes and time.
    pub fn summary(depth: u32, nodes: u64, elapsed: Duration) -> Self {
        Self {
            depth: Some(depth),
            nodes: Some(nodes),
            elapsed: Some(elapsed),
            nps: nodes_per_second(nodes, elapsed),
            ..Self::default()
        }
    }
}

fn nodes_per_second(nodes: u64, elapsed: Duration) -> Option<u64> {
    let micros = elapsed.as_micros();
    (micros > 0).then(|| (u128::from(nodes) * 1_000_000 / micros) as u64)
}

impl From<SearchReport> for SearchInfo {
    fn from(report: SearchReport) -> Self {
        match report {
            SearchReport::Iteration(IterationReport {
                depth,
                sel_depth,
                nodes,
                score,
                pv,
                elapsed,
            }) => Self {
                depth: Some(depth),
                max_depth: Some(sel_depth.max(depth)),
                nodes: Some(nodes),
                score: Some(Score::from_search(score)),
                pv: Some(pv),
                elapsed: Some(elapsed),
                nps: nodes_per_second(nodes, elapsed),
                ..Self::default()
            },
            SearchReport::CurrentMove {
                depth,
                mv,
                number,
                nodes,
                elapsed,
            } => Self {
                depth: Some(depth),
                nodes: Some(nodes),
                elapsed: Some(elapsed),
                current_move: Some(mv),
                current_move_number: Some(number),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Check { default: bool },
    Spin { default: i64, min: i64, max: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub kind: OptionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    InitializeAnswer {
        name: String,
        author: String,
        options: Vec<OptionDescriptor>,
    },
    ReadyAnswer(String),
    Information(SearchInfo),
    /// Sent exactly once per search run, always last.
    BestMove {
        best_move: Option<Move>,
        ponder_move: Option<Move>,
    },
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn go_limit_priority() {
        let all = GoRequest {
            depth: Some(4),
            nodes: Some(100),
            movetime_ms: Some(50),
            wtime_ms: Some(1000),
            ..GoRequest::default()
        };
        assert_eq!(all.limit(), SearchLimit::Depth(4));
        assert_eq!(
            GoRequest {
                infinite: true,
                ..all.clone()
            }
            .limit(),
            SearchLimit::Infinite
        );
        assert_eq!(
            GoRequest {
                depth: None,
                nodes: None,
                ..all
            }
            .limit(),
            SearchLimit::MoveTime(Duration::from_millis(50))
        );
        assert_eq!(GoRequest::default().limit(), SearchLimit::Infinite);
    }

    #[test]
    fn clock_request_fills_missing_fields_with_zero() {
        let request = GoRequest {
            btime_ms: Some(2000),
            binc_ms: Some(100),
            movestogo: Some(20),
            ..GoRequest::default()
        };
        let SearchLimit::Clock(clock) = request.limit() else {
            panic!("expected a clock limit");
        };
        assert_eq!(clock.white_time, Duration::ZERO);
        assert_eq!(clock.black_time, Duration::from_millis(2000));
        assert_eq!(clock.black_increment, Duration::from_millis(100));
        assert_eq!(clock.moves_to_go, Some(20));
    }

    #[test]
    fn mate_scores_convert_to_moves() {
        assert_eq!(Score::from_search(MATE_SCORE - 1), Score::Mate(1));
        assert_eq!(Score::from_search(-(MATE_SCORE - 4)), Score::Mate(-2));
        assert_eq!(Score::from_search(37), Score::Centipawns(37));
    }

    #[test]
    fn summary_computes_nodes_per_second() {
        let info = SearchInfo::summary(3, 5000, Duration::from_millis(500));
        assert_eq!(info.nps, Some(10_000));
        assert_eq!(SearchInfo::summary(0, 1, Duration::ZERO).nps, None);
    }
}
