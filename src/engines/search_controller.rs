//! Owns the search thread and the signals that steer it.
//!
//! At most one run exists at a time. Each run gets a fresh `SearchSignals`
//! and a snapshot of the position, reports `Information` events while it
//! works and ends with exactly one `BestMove`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::engines::engine_messages::{EngineEvent, SearchInfo};
use crate::engines::time_management::{SearchConstraints, TimeManager};
use crate::errors::{EngineError, EngineResult};
use crate::game_state::chess_types::Position;
use crate::search::board_scoring::BoardScorer;
use crate::search::iterative_deepening::{SearchResult, SearchState, Searcher};
use crate::search::threading::SearchSignals;

const SEARCH_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Per-run settings taken from the engine options at `go` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub quiescence_depth: u32,
    pub move_overhead: Duration,
}

struct ActiveSearch {
    signals: Arc<SearchSignals>,
    handle: JoinHandle<()>,
}

pub struct SearchController {
    events: Sender<EngineEvent>,
    scorer: Arc<dyn BoardScorer>,
    active: Option<ActiveSearch>,
}

impl SearchController {
    pub fn new(events: Sender<EngineEvent>, scorer: Arc<dyn BoardScorer>) -> Self {
        Self {
            events,
            scorer,
            active: None,
        }
    }

    /// True while a run has not yet reported its best move.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.signals.is_finished())
    }

    pub fn start(
        &mut self,
        position: Position,
        constraints: SearchConstraints,
        settings: SearchSettings,
    ) -> EngineResult<()> {
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }
        self.join_active();

        let signals = SearchSignals::new(constraints.ponder);
        let events = self.events.clone();
        let scorer = Arc::clone(&self.scorer);
        let run_signals = Arc::clone(&signals);

        log::debug!(
            "starting search: {:?} ponder={} searchmoves={}",
            constraints.limit,
            constraints.ponder,
            constraints.search_moves.len()
        );

        let handle = thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || run_search(position, constraints, settings, scorer, run_signals, events))
            .map_err(|err| EngineError::Internal(format!("failed to spawn search thread: {err}")))?;

        self.active = Some(ActiveSearch { signals, handle });
        Ok(())
    }

    /// Asks the current run to finish. A no-op when nothing is running.
    pub fn stop(&self) {
        if let Some(active) = &self.active {
            active.signals.request_stop();
        }
    }

    pub fn ponder_hit(&self) -> EngineResult<()> {
        match &self.active {
            Some(active) if !active.signals.is_finished() && active.signals.signal_ponder_hit() => Ok(()),
            _ => Err(EngineError::NotPondering),
        }
    }

    /// Blocks until the current run (if any) has reported its best move.
    pub fn wait(&mut self) {
        self.join_active();
    }

    /// Stops the current run and waits for it.
    pub fn quit(&mut self) {
        self.stop();
        self.join_active();
    }

    fn join_active(&mut self) {
        if let Some(active) = self.active.take() {
            if active.handle.join().is_err() {
                log::error!("search thread panicked");
            }
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.quit();
    }
}

fn run_search(
    mut position: Position,
    constraints: SearchConstraints,
    settings: SearchSettings,
    scorer: Arc<dyn BoardScorer>,
    signals: Arc<SearchSignals>,
    events: Sender<EngineEvent>,
) {
    let time = TimeManager::new(
        &constraints,
        position.side_to_move,
        settings.move_overhead,
        Arc::clone(&signals),
    );
    let mut searcher = Searcher::new(scorer.as_ref(), time, settings.quiescence_depth);

    let result = searcher.run(&mut position, &constraints.search_moves, &mut |report| {
        send_event(&events, EngineEvent::Information(SearchInfo::from(report)));
    });
    log_result(&result);

    send_event(
        &events,
        EngineEvent::Information(SearchInfo::summary(result.depth, result.nodes, result.elapsed)),
    );

    signals.mark_finished();
    send_event(
        &events,
        EngineEvent::BestMove {
            best_move: result.best_move,
            ponder_move: result.ponder_move,
        },
    );
}

fn send_event(events: &Sender<EngineEvent>, event: EngineEvent) {
    if events.send(event).is_err() {
        log::debug!("event receiver dropped");
    }
}

fn log_result(result: &SearchResult) {
    match result.state {
        SearchState::Aborted => log::error!("search aborted after {} nodes", result.nodes),
        state => log::info!(
            "search {:?}: depth {} nodes {} in {:?}, best {}",
            state,
            result.depth,
            result.nodes,
            result.elapsed,
            result
                .best_move
                .map_or_else(|| "(none)".to_string(), |mv| mv.to_string())
        ),
    }
}
