//! UCI protocol front-end and command loop.
//!
//! Input lines are parsed into `EngineCommand`s on a reader thread, handled
//! by the `EngineDriver` on the calling thread, and the resulting
//! `EngineEvent`s are written out by a writer thread. A search therefore
//! never blocks `stop`, `ponderhit` or `isready`.

use std::fmt::Write as _;
use std::io::{self, BufRead, BufReader, Write};
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::engines::engine_driver::EngineDriver;
use crate::engines::engine_messages::{
    EngineCommand, EngineEvent, GoRequest, OptionDescriptor, OptionKind, Score, SearchInfo,
};
use crate::engines::engine_options::EngineOptions;
use crate::errors::NotationError;
use crate::search::iterative_deepening::format_line;

pub fn run_stdio_loop(options: EngineOptions) -> io::Result<()> {
    run_loop(BufReader::new(io::stdin()), io::stdout(), options).map(|_| ())
}

/// Runs the engine over arbitrary line input and output until `quit` or
/// end of input, returning the output once every event has been written.
pub fn run_loop<R, W>(input: R, output: W, options: EngineOptions) -> io::Result<W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();

    thread::Builder::new()
        .name("uci-input".to_string())
        .spawn(move || read_commands(input, command_tx))?;
    let writer = thread::Builder::new()
        .name("uci-output".to_string())
        .spawn(move || write_events(output, event_rx))?;

    EngineDriver::new(event_tx, options).run(command_rx);

    writer
        .join()
        .map_err(|_| io::Error::other("output thread panicked"))?
}

fn read_commands<R: BufRead>(input: R, commands: Sender<EngineCommand>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::error!("failed to read input: {err}");
                break;
            }
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                log::debug!("ignoring '{}'", line.trim());
                continue;
            }
            // Goes through the driver so it is answered in order.
            Err(error) => EngineCommand::Malformed {
                command: line.split_whitespace().next().unwrap_or_default().to_owned(),
                error,
            },
        };

        let quit = command == EngineCommand::Quit;
        if commands.send(command).is_err() || quit {
            return;
        }
    }

    if commands.send(EngineCommand::Quit).is_err() {
        log::debug!("command receiver dropped");
    }
}

fn write_events<W: Write>(mut output: W, events: Receiver<EngineEvent>) -> io::Result<W> {
    for event in events.iter() {
        for line in format_event(&event) {
            writeln!(output, "{line}")?;
        }
        output.flush()?;
    }
    Ok(output)
}

/// Parses one input line. Unknown commands and blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<EngineCommand>, NotationError> {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(None);
    };

    let command = match cmd {
        "uci" => EngineCommand::Initialize,
        "isready" => EngineCommand::ReadyRequest(parts.collect::<Vec<_>>().join(" ")),
        "setoption" => parse_setoption(trimmed)?,
        "ucinewgame" => EngineCommand::NewGame,
        "position" => parse_position(trimmed)?,
        "go" => EngineCommand::StartCalculating(parse_go_params(trimmed)?),
        "stop" => EngineCommand::StopCalculating,
        "ponderhit" => EngineCommand::PonderHit,
        "debug" => match parts.next() {
            Some(mode) if mode.eq_ignore_ascii_case("on") => EngineCommand::Debug(true),
            Some(mode) if mode.eq_ignore_ascii_case("off") => EngineCommand::Debug(false),
            _ => return Err(invalid(trimmed)),
        },
        "quit" => EngineCommand::Quit,
        _ => return Ok(None),
    };

    Ok(Some(command))
}

fn invalid(line: &str) -> NotationError {
    NotationError::InvalidCommand(line.to_owned())
}

fn parse_setoption(line: &str) -> Result<EngineCommand, NotationError> {
    let mut name_tokens = Vec::<&str>::new();
    let mut value_tokens = Vec::<&str>::new();
    let mut mode = "";

    for tok in line.split_whitespace().skip(1) {
        match tok {
            "name" if mode.is_empty() => mode = "name",
            "value" if mode == "name" => mode = "value",
            _ if mode == "name" => name_tokens.push(tok),
            _ if mode == "value" => value_tokens.push(tok),
            _ => return Err(invalid(line)),
        }
    }

    if name_tokens.is_empty() {
        return Err(invalid(line));
    }

    Ok(EngineCommand::SetOption {
        name: name_tokens.join(" "),
        value: value_tokens.join(" "),
    })
}

fn parse_position(line: &str) -> Result<EngineCommand, NotationError> {
    let mut tokens = line.split_whitespace().skip(1).peekable();

    let fen = match tokens.next() {
        Some("startpos") => None,
        Some("fen") => {
            let mut fen_parts = Vec::<&str>::new();
            while let Some(next) = tokens.next_if(|tok| *tok != "moves") {
                fen_parts.push(next);
            }
            if fen_parts.is_empty() {
                return Err(invalid(line));
            }
            Some(fen_parts.join(" "))
        }
        _ => return Err(invalid(line)),
    };

    let moves = match tokens.next() {
        None => Vec::new(),
        Some("moves") => tokens.map(str::to_owned).collect(),
        Some(_) => return Err(invalid(line)),
    };

    Ok(EngineCommand::AnalyzePosition { fen, moves })
}

fn parse_go_params(line: &str) -> Result<GoRequest, NotationError> {
    let mut params = GoRequest::default();
    let tokens = line.split_whitespace().collect::<Vec<_>>();

    let number = |i: usize| -> Result<u64, NotationError> {
        tokens
            .get(i)
            .and_then(|tok| tok.parse::<u64>().ok())
            .ok_or_else(|| invalid(line))
    };

    let mut i = 1usize;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                params.depth = Some(u32::try_from(number(i)?).map_err(|_| invalid(line))?);
            }
            "nodes" => {
                i += 1;
                params.nodes = Some(number(i)?);
            }
            "movetime" => {
                i += 1;
                params.movetime_ms = Some(number(i)?);
            }
            "wtime" => {
                i += 1;
                params.wtime_ms = Some(number(i)?);
            }
            "btime" => {
                i += 1;
                params.btime_ms = Some(number(i)?);
            }
            "winc" => {
                i += 1;
                params.winc_ms = Some(number(i)?);
            }
            "binc" => {
                i += 1;
                params.binc_ms = Some(number(i)?);
            }
            "movestogo" => {
                i += 1;
                params.movestogo = Some(u32::try_from(number(i)?).map_err(|_| invalid(line))?);
            }
            "ponder" => params.ponder = true,
            "infinite" => params.infinite = true,
            "searchmoves" => {
                while i + 1 < tokens.len() && !is_go_keyword(tokens[i + 1]) {
                    i += 1;
                    params.searchmoves.push(tokens[i].to_owned());
                }
            }
            // `mate` is accepted but searched as an infinite run.
            "mate" => {
                i += 1;
                number(i)?;
                params.infinite = true;
            }
            _ => return Err(invalid(line)),
        }
        i += 1;
    }

    Ok(params)
}

fn is_go_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "movetime"
            | "wtime"
            | "btime"
            | "winc"
            | "binc"
            | "movestogo"
            | "searchmoves"
            | "nodes"
            | "mate"
            | "ponder"
            | "infinite"
    )
}

/// Renders one event as protocol lines.
pub fn format_event(event: &EngineEvent) -> Vec<String> {
    match event {
        EngineEvent::InitializeAnswer {
            name,
            author,
            options,
        } => {
            let mut lines = vec![format!("id name {name}"), format!("id author {author}")];
            lines.extend(options.iter().map(format_option));
            lines.push("uciok".to_string());
            lines
        }
        EngineEvent::ReadyAnswer(_) => vec!["readyok".to_string()],
        EngineEvent::Information(info) => format_info(info).into_iter().collect(),
        EngineEvent::BestMove {
            best_move,
            ponder_move,
        } => {
            let line = match (best_move, ponder_move) {
                (Some(best), Some(ponder)) => format!("bestmove {best} ponder {ponder}"),
                (Some(best), None) => format!("bestmove {best}"),
                (None, _) => "bestmove 0000".to_string(),
            };
            vec![line]
        }
    }
}

fn format_option(option: &OptionDescriptor) -> String {
    match option.kind {
        OptionKind::Check { default } => {
            format!("option name {} type check default {default}", option.name)
        }
        OptionKind::Spin { default, min, max } => format!(
            "option name {} type spin default {default} min {min} max {max}",
            option.name
        ),
    }
}

fn format_info(info: &SearchInfo) -> Option<String> {
    if let Some(message) = &info.message {
        return Some(format!("info string {message}"));
    }

    let mut line = String::from("info");
    if let Some(depth) = info.depth {
        let _ = write!(line, " depth {depth}");
    }
    if let Some(max_depth) = info.max_depth {
        let _ = write!(line, " seldepth {max_depth}");
    }
    match info.score {
        Some(Score::Centipawns(cp)) => {
            let _ = write!(line, " score cp {cp}");
        }
        Some(Score::Mate(moves)) => {
            let _ = write!(line, " score mate {moves}");
        }
        None => {}
    }
    if let Some(mv) = info.current_move {
        let _ = write!(line, " currmove {mv}");
    }
    if let Some(number) = info.current_move_number {
        let _ = write!(line, " currmovenumber {number}");
    }
    if let Some(nodes) = info.nodes {
        let _ = write!(line, " nodes {nodes}");
    }
    if let Some(nps) = info.nps {
        let _ = write!(line, " nps {nps}");
    }
    if let Some(elapsed) = info.elapsed {
        let _ = write!(line, " time {}", elapsed.as_millis());
    }
    if let Some(pv) = info.pv.as_deref().filter(|pv| !pv.is_empty()) {
        let _ = write!(line, " pv {}", format_line(pv));
    }

    (line.len() > "info".len()).then_some(line)
}
