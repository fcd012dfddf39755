use carmine::RbTree;
use criterion::{
    measurement::Measurement, BatchSize, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};

use crate::Lfsr;

#[derive(Debug, Clone, Copy)]
struct BenchName {
    n_values: usize,
}

impl From<BenchName> for BenchmarkId {
    fn from(v: BenchName) -> Self {
        Self::new("n_values", v.n_values)
    }
}

pub(super) fn bench(c: &mut Criterion) {
    let mut g = c.benchmark_group("remove");

    for n_values in [100, 1_000, 10_000] {
        bench_param(&mut g, n_values)
    }
}

/// Measure the time needed to drain a tree of `n_values` entries key by key.
fn bench_param<M>(g: &mut BenchmarkGroup<'_, M>, n_values: usize)
where
    M: Measurement,
{
    // Generate the tree and remember the inserted keys.
    let mut rand = Lfsr::default();
    let mut t = RbTree::<i64, usize>::default();
    let mut keys = Vec::with_capacity(n_values);

    for _i in 0..n_values {
        let key = rand.next_key();
        keys.push(key);
        t.insert(key, 42_usize);
    }

    let bench_name = BenchName { n_values };
    g.throughput(Throughput::Elements(n_values as _)); // Keys removed per second
    g.bench_function(BenchmarkId::from(bench_name), |b| {
        b.iter_batched(
            // Hand each iteration its own structural copy to drain.
            || t.clone(),
            |mut t| {
                for key in &keys {
                    t.remove(key);
                }
                assert!(t.is_empty());
            },
            BatchSize::PerIteration,
        )
    });
}
