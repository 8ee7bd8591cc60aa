use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use plum_search::game_state::chess_types::Position;
use plum_search::move_generation::perft::perft;

/// A FEN with its known node counts for depths 1, 2, ...
struct PerftCase(&'static str, &'static str, &'static [u64]);

const QUICK: &[PerftCase] = &[
    PerftCase(
        "startpos",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        &[20, 400, 8902],
    ),
    PerftCase(
        "kiwipete",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[48, 2039],
    ),
    PerftCase(
        "rook_endgame",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        &[14, 191, 2812],
    ),
];

const DEEP: &[PerftCase] = &[
    PerftCase(
        "startpos",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        &[20, 400, 8902, 197_281],
    ),
    PerftCase(
        "kiwipete",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[48, 2039, 97_862],
    ),
    PerftCase(
        "promotions",
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
        &[6, 264, 9467],
    ),
    PerftCase(
        "castling_checks",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        &[44, 1486, 62_379],
    ),
];

fn bench_perft(c: &mut Criterion) {
    let deep = std::env::var("PLUM_SEARCH_BENCH_SUITE")
        .is_ok_and(|value| value.eq_ignore_ascii_case("deep"));
    let cases = if deep { DEEP } else { QUICK };

    let mut group = c.benchmark_group(if deep { "perft_deep" } else { "perft_quick" });
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    for PerftCase(name, fen, expected) in cases {
        let mut position = Position::from_fen(fen).expect("benchmark FEN should parse");

        for (index, &nodes) in expected.iter().enumerate() {
            let depth = (index + 1) as u8;
            let counts = perft(&mut position, depth).expect("perft should run");
            assert_eq!(counts.nodes, nodes, "{name} depth {depth}");

            group.throughput(Throughput::Elements(nodes));
            group.bench_with_input(
                BenchmarkId::new(*name, depth),
                &depth,
                |b, &depth| {
                    b.iter(|| {
                        let counts = perft(black_box(&mut position), depth)
                            .expect("perft benchmark run should succeed");
                        black_box(counts.nodes)
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(perft_benches, bench_perft);
criterion_main!(perft_benches);
