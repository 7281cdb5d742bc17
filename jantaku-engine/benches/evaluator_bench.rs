use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jantaku_engine::parser::parse_tiles;
use jantaku_engine::pattern::GroupKind;
use jantaku_engine::shanten_table::GroupTable;
use jantaku_engine::types::HandVector;
use jantaku_engine::{HandEvaluator, ShantenTable, TileCatalog};

const HANDS: [&str; 4] = [
    "111222m333p45s11z",
    "128m555889p357s1z",
    "112288m3355p4s15z",
    "19m19p19s1234567z",
];

fn bench_shanten(c: &mut Criterion) {
    let evaluator = HandEvaluator::new(Arc::new(ShantenTable::generate()));
    let catalog = TileCatalog::default();
    let hands: Vec<HandVector> = HANDS
        .iter()
        .map(|h| HandVector::from_tiles(&parse_tiles(h, &catalog).unwrap()))
        .collect();
    let tiles: Vec<_> = HANDS.iter().map(|h| parse_tiles(h, &catalog).unwrap()).collect();

    c.bench_function("shanten_breakdown_4_hands", |b| {
        b.iter(|| {
            for hand in &hands {
                black_box(evaluator.shanten(black_box(hand)));
            }
        });
    });

    c.bench_function("outs_4_hands", |b| {
        b.iter(|| {
            for hand in &tiles {
                black_box(evaluator.outs(black_box(hand)));
            }
        });
    });

    c.bench_function("count_minimum_outs_4_hands", |b| {
        b.iter(|| {
            for hand in &tiles {
                black_box(evaluator.count_minimum_outs(black_box(hand)));
            }
        });
    });
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(10);
    group.bench_function("honor_group_table", |b| {
        b.iter(|| GroupTable::generate(GroupKind::Honor));
    });
    group.finish();
}

criterion_group!(benches, bench_shanten, bench_generation);
criterion_main!(benches);
