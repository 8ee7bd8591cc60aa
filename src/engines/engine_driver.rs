//! Applies engine commands to the engine state.
//!
//! The driver owns the current position and options and forwards search
//! work to the `SearchController`. Commands are handled strictly in
//! arrival order; a failing command is reported and never ends the loop.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use log::LevelFilter;

use crate::engines::engine_messages::{EngineCommand, EngineEvent, GoRequest, SearchInfo};
use crate::engines::engine_options::EngineOptions;
use crate::engines::search_controller::{SearchController, SearchSettings};
use crate::engines::time_management::SearchConstraints;
use crate::errors::{EngineError, EngineResult};
use crate::game_state::chess_types::Position;
use crate::search::board_scoring::{BoardScorer, StandardScorer};
use crate::utils::long_algebraic::parse_move;

pub const ENGINE_NAME: &str = concat!("Plum Search ", env!("CARGO_PKG_VERSION"));
pub const ENGINE_AUTHOR: &str = "Plum Search developers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct EngineDriver {
    position: Position,
    options: EngineOptions,
    controller: SearchController,
    events: Sender<EngineEvent>,
    base_log_level: LevelFilter,
}

impl EngineDriver {
    pub fn new(events: Sender<EngineEvent>, options: EngineOptions) -> Self {
        Self::with_scorer(events, options, Arc::new(StandardScorer))
    }

    pub fn with_scorer(
        events: Sender<EngineEvent>,
        options: EngineOptions,
        scorer: Arc<dyn BoardScorer>,
    ) -> Self {
        Self {
            position: Position::new_game(),
            options,
            controller: SearchController::new(events.clone(), scorer),
            events,
            base_log_level: log::max_level(),
        }
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_searching(&self) -> bool {
        self.controller.is_running()
    }

    /// Consumes commands until `Quit` arrives or every sender is gone.
    pub fn run(mut self, commands: Receiver<EngineCommand>) {
        for command in commands.iter() {
            log::trace!("command: {:?}", command);
            let is_go = match &command {
                EngineCommand::StartCalculating(_) => true,
                EngineCommand::Malformed { command, .. } => command == "go",
                _ => false,
            };
            match self.handle(command) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return,
                Err(err) => {
                    log::warn!("{err}");
                    self.send(EngineEvent::Information(SearchInfo::message(err.to_string())));
                    // A rejected `go` still owes the client an answer, but
                    // only when no run is live to give one.
                    if is_go
                        && !matches!(err, EngineError::AlreadyRunning)
                        && !self.controller.is_running()
                    {
                        self.send(EngineEvent::BestMove {
                            best_move: None,
                            ponder_move: None,
                        });
                    }
                }
            }
        }
        self.controller.quit();
    }

    pub fn handle(&mut self, command: EngineCommand) -> EngineResult<Flow> {
        match command {
            EngineCommand::Initialize => {
                self.send(EngineEvent::InitializeAnswer {
                    name: ENGINE_NAME.to_string(),
                    author: ENGINE_AUTHOR.to_string(),
                    options: self.options.descriptors(),
                });
            }
            EngineCommand::NewGame => {
                self.controller.quit();
                self.position = Position::new_game();
            }
            EngineCommand::ReadyRequest(token) => self.send(EngineEvent::ReadyAnswer(token)),
            EngineCommand::SetOption { name, value } => {
                self.options.set(&name, &value)?;
                self.apply_log_level();
                log::debug!("option {name} = {value}");
            }
            EngineCommand::Debug(enabled) => {
                self.options.debug_log = enabled;
                self.apply_log_level();
            }
            EngineCommand::AnalyzePosition { fen, moves } => {
                self.position = build_position(fen.as_deref(), &moves)?;
                log::debug!("position set: {}", self.position.to_fen());
            }
            EngineCommand::StartCalculating(request) => self.start_search(&request)?,
            EngineCommand::StopCalculating => self.controller.stop(),
            EngineCommand::PonderHit => self.controller.ponder_hit()?,
            EngineCommand::Quit => {
                self.controller.quit();
                return Ok(Flow::Quit);
            }
            EngineCommand::Malformed { error, .. } => return Err(error.into()),
        }
        Ok(Flow::Continue)
    }

    fn start_search(&mut self, request: &GoRequest) -> EngineResult<()> {
        let mut scratch = self.position.clone();
        let search_moves = request
            .searchmoves
            .iter()
            .map(|text| parse_move(text, &mut scratch))
            .collect::<EngineResult<Vec<_>>>()?;

        let mut constraints = SearchConstraints::new(request.limit()).restricted_to(search_moves);
        if request.ponder {
            constraints = constraints.pondering();
        }

        self.controller.start(
            self.position.clone(),
            constraints,
            SearchSettings {
                quiescence_depth: self.options.quiescence_depth,
                move_overhead: self.options.move_overhead,
            },
        )
    }

    fn apply_log_level(&self) {
        let level = if self.options.debug_log {
            self.base_log_level.max(LevelFilter::Debug)
        } else {
            self.base_log_level
        };
        log::set_max_level(level);
    }

    fn send(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            log::debug!("event receiver dropped");
        }
    }
}

/// Builds a position from an optional FEN and a list of moves in long
/// algebraic notation. Nothing is kept if any part fails.
pub fn build_position(fen: Option<&str>, moves: &[String]) -> EngineResult<Position> {
    let mut position = match fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::new_game(),
    };
    for text in moves {
        let mv = parse_move(text, &mut position)?;
        position.apply(mv)?;
    }
    Ok(position)
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;

    use super::*;
    use crate::errors::NotationError;

    fn driver() -> (EngineDriver, Receiver<EngineEvent>) {
        let (tx, rx) = unbounded();
        (EngineDriver::new(tx, EngineOptions::default()), rx)
    }

    #[test]
    fn ready_request_echoes_the_token() {
        let (mut driver, rx) = driver();
        driver
            .handle(EngineCommand::ReadyRequest("test".to_string()))
            .expect("ready request should succeed");
        assert_eq!(
            rx.try_recv().expect("ready answer should be sent"),
            EngineEvent::ReadyAnswer("test".to_string())
        );
    }

    #[test]
    fn analyze_position_applies_moves() {
        let (mut driver, _rx) = driver();
        driver
            .handle(EngineCommand::AnalyzePosition {
                fen: None,
                moves: vec!["c2c4".to_string(), "e7e5".to_string()],
            })
            .expect("moves should apply");
        assert_eq!(
            driver.position().to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/2P5/8/PP1PPPPP/RNBQKBNR w KQkq e6 0 2"
        );
    }

    #[test]
    fn bad_position_keeps_the_previous_one() {
        let (mut driver, _rx) = driver();
        let before = driver.position().clone();

        let err = driver
            .handle(EngineCommand::AnalyzePosition {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e6".to_string(), "e4e6".to_string()],
            })
            .expect_err("illegal move should be rejected");
        assert!(matches!(
            err,
            EngineError::Notation(NotationError::IllegalMove { .. })
        ));
        assert_eq!(driver.position(), &before);
    }

    #[test]
    fn unknown_option_is_reported_and_loop_continues() {
        let (tx, rx) = unbounded();
        let (cmd_tx, cmd_rx) = unbounded();
        let driver = EngineDriver::new(tx, EngineOptions::default());

        cmd_tx
            .send(EngineCommand::SetOption {
                name: "Hash".to_string(),
                value: "16".to_string(),
            })
            .expect("command channel open");
        cmd_tx
            .send(EngineCommand::ReadyRequest(String::new()))
            .expect("command channel open");
        cmd_tx.send(EngineCommand::Quit).expect("command channel open");
        driver.run(cmd_rx);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(
            &events[0],
            EngineEvent::Information(SearchInfo { message: Some(text), .. }) if text.contains("Hash")
        ));
        assert_eq!(events[1], EngineEvent::ReadyAnswer(String::new()));
    }

    #[test]
    fn go_with_illegal_searchmove_does_not_start() {
        let (mut driver, _rx) = driver();
        let request = GoRequest {
            depth: Some(1),
            searchmoves: vec!["e2e5".to_string()],
            ..GoRequest::default()
        };
        assert!(driver.handle(EngineCommand::StartCalculating(request)).is_err());
        assert!(!driver.is_searching());
    }

    #[test]
    fn rejected_go_during_a_live_run_adds_no_best_move() {
        let (tx, rx) = unbounded();
        let (cmd_tx, cmd_rx) = unbounded();
        let driver = EngineDriver::new(tx, EngineOptions::default());

        let commands = [
            EngineCommand::StartCalculating(GoRequest {
                infinite: true,
                ..GoRequest::default()
            }),
            EngineCommand::StartCalculating(GoRequest {
                depth: Some(1),
                searchmoves: vec!["e2e5".to_string()],
                ..GoRequest::default()
            }),
            EngineCommand::Malformed {
                command: "go".to_string(),
                error: NotationError::InvalidCommand("go depth".to_string()),
            },
            EngineCommand::StopCalculating,
            EngineCommand::Quit,
        ];
        for command in commands {
            cmd_tx.send(command).expect("command channel open");
        }
        driver.run(cmd_rx);

        let events: Vec<_> = rx.try_iter().collect();
        let best_moves: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                EngineEvent::BestMove { best_move, .. } => Some(*best_move),
                _ => None,
            })
            .collect();
        assert_eq!(best_moves.len(), 1);
        assert!(best_moves[0].is_some());
        assert!(matches!(
            events.last(),
            Some(EngineEvent::BestMove { .. })
        ));
    }

    #[test]
    fn malformed_go_while_idle_is_answered() {
        let (tx, rx) = unbounded();
        let (cmd_tx, cmd_rx) = unbounded();
        let driver = EngineDriver::new(tx, EngineOptions::default());

        cmd_tx
            .send(EngineCommand::Malformed {
                command: "go".to_string(),
                error: NotationError::InvalidCommand("go depth".to_string()),
            })
            .expect("command channel open");
        cmd_tx.send(EngineCommand::Quit).expect("command channel open");
        driver.run(cmd_rx);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(
            &events[0],
            EngineEvent::Information(SearchInfo { message: Some(_), .. })
        ));
        assert_eq!(
            events[1],
            EngineEvent::BestMove {
                best_move: None,
                ponder_move: None,
            }
        );
    }

    #[test]
    fn quit_stops_an_infinite_search() {
        let (mut driver, rx) = driver();
        driver
            .handle(EngineCommand::StartCalculating(GoRequest {
                infinite: true,
                ..GoRequest::default()
            }))
            .expect("search should start");
        assert_eq!(
            driver.handle(EngineCommand::Quit).expect("quit should succeed"),
            Flow::Quit
        );

        let best = rx
            .try_iter()
            .find_map(|event| match event {
                EngineEvent::BestMove { best_move, .. } => Some(best_move),
                _ => None,
            })
            .expect("quit waits for the best move");
        assert!(best.is_some());
    }
}
