/// Overall simple performance bench for static # of elements in a few
/// scenarios. Here to quickly test for regressions.
use confluent::PersistentVector;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::SliceRandom;
use rand::{thread_rng, Rng};

const VECTOR_SIZES: [usize; 4] = [1 << 8, 1 << 12, 1 << 16, 1 << 20];

pub fn push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_back");
    group.throughput(Throughput::Elements(1));

    group.bench_function("sequential", |b| {
        let mut v = PersistentVector::<u64>::default();
        let mut i = 0u64;
        b.iter(|| {
            v = v.push_back(i);
            i += 1;
        })
    });

    group.finish();
}

pub fn random_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_get");
    group.throughput(Throughput::Elements(1));

    for size in VECTOR_SIZES {
        group.bench_with_input(BenchmarkId::new("vector", size), &size, |b, &size| {
            let v = PersistentVector::from_iter((0..size as u64).collect::<Vec<_>>());
            let mut rng = thread_rng();
            b.iter(|| {
                let idx = rng.gen_range(0..size);
                std::hint::black_box(v.at(idx));
            })
        });
    }

    group.finish();
}

pub fn random_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_set");
    group.throughput(Throughput::Elements(1));

    for size in VECTOR_SIZES {
        group.bench_with_input(BenchmarkId::new("vector", size), &size, |b, &size| {
            let v = PersistentVector::from_iter((0..size as u64).collect::<Vec<_>>());
            let mut rng = thread_rng();
            b.iter(|| {
                let idx = rng.gen_range(0..size);
                std::hint::black_box(v.set(idx, 0).unwrap());
            })
        });
    }

    group.finish();
}

pub fn undo_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("undo_chain");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push_then_undo", |b| {
        let mut v = PersistentVector::<u64>::default();
        for i in 0..1024u64 {
            v = v.push_back(i);
        }
        b.iter(|| {
            let pushed = v.push_back(0);
            std::hint::black_box(pushed.undo());
        })
    });

    group.finish();
}

pub fn shuffled_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffled_workload");
    group.throughput(Throughput::Elements(1));

    let mut indices: Vec<usize> = (0..4096).collect();
    indices.shuffle(&mut thread_rng());

    group.bench_function("interleaved_set_get", |b| {
        let v = PersistentVector::from_iter((0..4096u64).collect::<Vec<_>>());
        let mut i = 0usize;
        b.iter(|| {
            let idx = indices[i % indices.len()];
            i += 1;
            std::hint::black_box(v.at(idx));
        })
    });

    group.finish();
}

criterion_group!(
    vector_benches,
    push_back,
    random_get,
    random_set,
    undo_chain,
    shuffled_workload
);
criterion_main!(vector_benches);
