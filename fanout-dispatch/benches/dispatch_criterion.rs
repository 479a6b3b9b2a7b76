use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fanout_dispatch::{Dispatcher, Mux};
use tokio::runtime::Builder;
use uuid::Uuid;

fn dispatch_criterion(c: &mut Criterion) {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("benchmark runtime should build");

    let dispatcher = Arc::new(Dispatcher::<&'static str>::new());
    runtime
        .block_on(dispatcher.start(0, 0))
        .expect("dispatcher should start");
    let mux = Mux::new(dispatcher.clone());
    let shared_id = runtime.block_on(mux.get_id()).expect("id should mint");

    let mut mux_group = c.benchmark_group("mux");
    mux_group.bench_function("subscribe_release", |b| {
        b.iter(|| {
            let pipe = runtime
                .block_on(mux.subscribe(shared_id))
                .expect("subscribe should succeed");
            runtime
                .block_on(pipe.release())
                .expect("release should succeed");
        });
    });
    mux_group.finish();

    let publish_id = runtime
        .block_on(dispatcher.get_new_id(|| Ok(Uuid::new_v4())))
        .expect("id should mint");

    let mut publish_group = c.benchmark_group("publish");
    publish_group.bench_function("enqueue_no_subscribers", |b| {
        b.iter(|| {
            // The queue may momentarily fill between worker wakeups; the
            // retryable limit error is part of the measured path.
            let outcome = dispatcher.publish(publish_id, "bench");
            black_box(outcome).ok();
        });
    });
    publish_group.finish();

    runtime
        .block_on(dispatcher.stop())
        .expect("dispatcher should stop");
}

criterion_group!(benches, dispatch_criterion);
criterion_main!(benches);
