use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use std::hint::black_box;

use mizar::proxy::Proxy;
use mizar::runtime::Runtime;
use mizar::runtime::RuntimeConfig;

fn bench_derivation(criterion: &mut Criterion) {
  let runtime: Runtime = Runtime::new(RuntimeConfig::default());
  let proxy: Proxy = runtime
    .proxy_from_string("billing/account : tcp -h node1 -p 4061 -t 2500 : ssl -h node2 -p 4062")
    .unwrap();

  let mut group = criterion.benchmark_group("derivation");

  group.bench_function("shared", |bench| {
    bench.iter(|| black_box(proxy.with_secure(false)));
  });

  group.bench_function("derived", |bench| {
    bench.iter(|| black_box(proxy.with_secure(true)));
  });

  group.bench_function("stringify", |bench| {
    bench.iter(|| black_box(proxy.to_string()));
  });

  group.bench_function("hash", |bench| {
    bench.iter(|| black_box(proxy.hash_value()));
  });

  group.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default();
  targets = bench_derivation
}

criterion_main!(benches);
