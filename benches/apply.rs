use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lobsim_rs::engine::{Order, OrderType, PriceLevelBook, Side};
use lobsim_rs::market::{OrderGenerator, RateConfig};
use rust_decimal_macros::dec;

fn book() -> PriceLevelBook {
    PriceLevelBook::initial(dec!(0.01), dec!(100.00), dec!(100.01), 10).unwrap()
}

fn bench_apply(c: &mut Criterion) {
    let start = book();
    let limit = Order { id: 1, timestamp: 1, order_type: OrderType::Limit, side: Side::Buy, level: 3, quantity: 10 };
    let sweep = Order { id: 2, timestamp: 2, order_type: OrderType::Market, side: Side::Sell, level: 4, quantity: 0 };

    c.bench_function("apply_limit", |b| b.iter(|| start.apply(black_box(&limit)).unwrap()));
    c.bench_function("apply_sweep", |b| b.iter(|| start.apply(black_box(&sweep)).unwrap()));
}

fn bench_generate_and_apply(c: &mut Criterion) {
    c.bench_function("generate_apply_step", |b| {
        let mut generator = OrderGenerator::new(RateConfig::default(), Some(7)).unwrap();
        let mut current = book();
        b.iter(|| {
            let order = generator.next(&current);
            current = current.apply(&order).unwrap();
        })
    });
}

criterion_group!(benches, bench_apply, bench_generate_and_apply);
criterion_main!(benches);
