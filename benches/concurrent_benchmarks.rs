//! Concurrent Container Benchmarks
//!
//! Benchmarks for measuring container throughput under contended access.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use threaded_collections::config::ExpiringCacheConfig;
use threaded_collections::{BlockingQueue, DualKeyMap, ExpiringCache, RwList};

const CACHE_SIZE: usize = 10_000;
const OPS_PER_THREAD: usize = 1_000;
const THREADS: usize = 8;

/// Keyed containers benchmarked through one interface.
trait KeyedContainer: Send + Sync {
    fn bench_get(&self, key: usize) -> Option<usize>;
    fn bench_put(&self, key: usize, value: usize);
}

impl KeyedContainer for ExpiringCache<usize, usize> {
    fn bench_get(&self, key: usize) -> Option<usize> {
        self.try_get(&key)
    }

    fn bench_put(&self, key: usize, value: usize) {
        self.insert(key, value);
    }
}

impl KeyedContainer for DualKeyMap<usize, usize, usize> {
    fn bench_get(&self, key: usize) -> Option<usize> {
        self.get_by_key1(&key).ok()
    }

    fn bench_put(&self, key: usize, value: usize) {
        // Same key on both sides keeps every insert a valid pairing.
        let _ = self.insert(key, key, value);
    }
}

fn cache() -> ExpiringCache<usize, usize> {
    ExpiringCache::init(ExpiringCacheConfig {
        default_ttl: Duration::from_secs(600),
        capacity: CACHE_SIZE,
        ..ExpiringCacheConfig::default()
    })
}

fn run_concurrent_mixed<C>(container: Arc<C>, num_threads: usize, ops_per_thread: usize)
where
    C: KeyedContainer + 'static,
{
    let mut handles = Vec::with_capacity(num_threads);
    for t in 0..num_threads {
        let container = Arc::clone(&container);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = (t * ops_per_thread + i) % CACHE_SIZE;
                // 90% reads
                if i % 10 == 0 {
                    container.bench_put(key, i);
                } else {
                    black_box(container.bench_get(key));
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

/// Benchmark read-mostly traffic against the keyed containers
fn concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Mixed");
    group.throughput(Throughput::Elements((THREADS * OPS_PER_THREAD) as u64));

    let expiring = Arc::new(cache());
    let dual: Arc<DualKeyMap<usize, usize, usize>> = Arc::new(DualKeyMap::with_capacity(CACHE_SIZE));
    for i in 0..CACHE_SIZE {
        expiring.bench_put(i, i);
        dual.bench_put(i, i);
    }

    group.bench_function("ExpiringCache", |b| {
        b.iter(|| run_concurrent_mixed(Arc::clone(&expiring), THREADS, OPS_PER_THREAD));
    });
    group.bench_function("DualKeyMap", |b| {
        b.iter(|| run_concurrent_mixed(Arc::clone(&dual), THREADS, OPS_PER_THREAD));
    });

    group.finish();
}

/// Benchmark single-flight fills racing on a small key space
fn cache_get_or_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("ExpiringCache get_or_insert_with");

    for num_threads in [1, 2, 4, 8] {
        group.throughput(Throughput::Elements((num_threads * OPS_PER_THREAD) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            &num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let cache = Arc::new(cache());
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let cache = Arc::clone(&cache);
                            thread::spawn(move || {
                                for i in 0..OPS_PER_THREAD {
                                    let key = i % 64;
                                    black_box(cache.get_or_insert_with(
                                        key,
                                        Duration::from_secs(60),
                                        || key * 2,
                                    ));
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark producer/consumer hand-off through the blocking queue
fn queue_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("BlockingQueue hand-off");

    for pairs in [1, 2, 4] {
        group.throughput(Throughput::Elements((pairs * OPS_PER_THREAD) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pairs), &pairs, |b, &pairs| {
            b.iter(|| {
                let queue = Arc::new(BlockingQueue::with_capacity(OPS_PER_THREAD));
                let mut handles = Vec::with_capacity(pairs * 2);
                for _ in 0..pairs {
                    let producer = Arc::clone(&queue);
                    handles.push(thread::spawn(move || {
                        for i in 0..OPS_PER_THREAD {
                            producer.enqueue(i);
                        }
                    }));
                    let consumer = Arc::clone(&queue);
                    handles.push(thread::spawn(move || {
                        for _ in 0..OPS_PER_THREAD {
                            black_box(consumer.dequeue_with_timeout(Duration::from_secs(5)).unwrap());
                        }
                    }));
                }
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark snapshot iteration while writers append
fn list_snapshot_under_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("RwList snapshot");
    group.throughput(Throughput::Elements(OPS_PER_THREAD as u64));

    group.bench_function("iter with 2 writers", |b| {
        b.iter(|| {
            let list = Arc::new(RwList::from((0..1_000).collect::<Vec<usize>>()));
            let writers: Vec<_> = (0..2)
                .map(|_| {
                    let list = Arc::clone(&list);
                    thread::spawn(move || {
                        for i in 0..OPS_PER_THREAD {
                            list.push(i);
                        }
                    })
                })
                .collect();
            for _ in 0..10 {
                black_box(list.iter().sum::<usize>());
            }
            for writer in writers {
                writer.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    concurrent_mixed,
    cache_get_or_insert,
    queue_handoff,
    list_snapshot_under_writes
);
criterion_main!(benches);
