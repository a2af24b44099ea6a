use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use warden_rs::{
    CachedPolicyStore, ConditionOptions, Engine, Matcher, MemoryPolicyStore, NoopAuditor, Policy,
    PolicyStore, RegexMatcher, Request, Subject, WildcardMatcher,
};

fn quiet_engine(store: Arc<dyn PolicyStore>) -> Engine {
    Engine::builder(store).auditor(Arc::new(NoopAuditor)).build()
}

/// Engine holding `count` allow policies, one per resource prefix
fn engine_with_policies(count: usize) -> Engine {
    let engine = quiet_engine(Arc::new(MemoryPolicyStore::new()));
    for i in 0..count {
        engine
            .grant(
                Policy::builder(format!("p{}", i))
                    .actions(["read"])
                    .resources([format!("res_{}:*", i)])
                    .subject(Subject::new("svc-*"))
                    .allow()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }
    engine
}

fn read(resource: &str) -> Request {
    Request::builder()
        .action("read")
        .resource(resource)
        .scope("prod")
        .subject("svc-bench")
        .build()
}

/// Benchmark enforcement as the policy set grows
fn bench_store_size(c: &mut Criterion) {
    let policy_counts = vec![10, 100, 1_000];

    let mut group = c.benchmark_group("store_size");

    for count in policy_counts {
        group.throughput(Throughput::Elements(100));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let engine = engine_with_policies(count);

            b.iter(|| {
                for i in 0..100 {
                    let req = read(&format!("res_{}:item", i % count));
                    black_box(engine.verify(&req).is_ok());
                }
            });
        });
    }

    group.finish();
}

/// Benchmark the two matchers on equivalent patterns
fn bench_matchers(c: &mut Criterion) {
    let mut group = c.benchmark_group("matchers");

    let wildcard_patterns = vec!["users:*:documents".to_string()];
    let regex_patterns = vec!["users:<[a-z0-9]+>:documents".to_string()];

    group.bench_function("wildcard", |b| {
        let matcher = WildcardMatcher;
        b.iter(|| {
            for i in 0..100 {
                let value = format!("users:user{}:documents", i);
                black_box(matcher.matches(Some(&wildcard_patterns[..]), &value).unwrap());
            }
        });
    });

    // Compiled pattern is cached after the first call
    group.bench_function("regex_cached", |b| {
        let matcher = RegexMatcher::new();
        b.iter(|| {
            for i in 0..100 {
                let value = format!("users:user{}:documents", i);
                black_box(matcher.matches(Some(&regex_patterns[..]), &value).unwrap());
            }
        });
    });

    group.bench_function("regex_cold", |b| {
        b.iter(|| {
            let matcher = RegexMatcher::new();
            black_box(
                matcher
                    .matches(Some(&regex_patterns[..]), "users:user1:documents")
                    .unwrap(),
            );
        });
    });

    group.finish();
}

/// Benchmark condition evaluation on the allow path
fn bench_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("conditions");

    group.bench_function("cidr_and_bool", |b| {
        let engine = quiet_engine(Arc::new(MemoryPolicyStore::new()));
        let subject = engine
            .subject("svc-*")
            .condition(ConditionOptions::new("mfa", "bool").option("value", true))
            .condition(
                ConditionOptions::new("source_ip", "cidr_condition").option("cidr", "10.0.0.0/8"),
            )
            .build()
            .unwrap();
        engine
            .grant(Policy::builder("gated").subject(subject).allow().build().unwrap())
            .unwrap();

        let req = Request::builder()
            .action("read")
            .resource("db")
            .scope("prod")
            .subject("svc-bench")
            .context("mfa", true)
            .context("source_ip", "10.20.30.40")
            .build();

        b.iter(|| black_box(engine.verify(&req).is_ok()));
    });

    group.finish();
}

/// Benchmark deny vs allow evaluation
fn bench_deny_vs_allow(c: &mut Criterion) {
    let mut group = c.benchmark_group("deny_vs_allow");

    group.bench_function("allow_match", |b| {
        let engine = engine_with_policies(1);
        b.iter(|| {
            for i in 0..100 {
                let req = read(&format!("res_0:file_{}", i));
                black_box(engine.verify(&req).is_ok());
            }
        });
    });

    group.bench_function("deny_match", |b| {
        let engine = engine_with_policies(1);
        engine
            .grant(
                Policy::builder("block")
                    .resources(["res_0:*"])
                    .subject(Subject::new("svc-*"))
                    .deny()
                    .build()
                    .unwrap(),
            )
            .unwrap();

        b.iter(|| {
            for i in 0..100 {
                let req = read(&format!("res_0:file_{}", i));
                black_box(engine.verify(&req).is_err());
            }
        });
    });

    group.finish();
}

/// Benchmark point lookups through the expiring cache
fn bench_cached_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_get");

    let backend = Arc::new(MemoryPolicyStore::new());
    for i in 0..100 {
        backend
            .create(Arc::new(
                Policy::builder(format!("p{}", i))
                    .subject(Subject::new("svc-*"))
                    .allow()
                    .build()
                    .unwrap(),
            ))
            .unwrap();
    }

    group.bench_function("direct", |b| {
        b.iter(|| {
            let i = rand::random::<usize>() % 100;
            black_box(backend.get(&format!("p{}", i)).unwrap());
        });
    });

    group.bench_function("through_cache", |b| {
        let cache = CachedPolicyStore::new(backend.clone(), Duration::from_secs(60));
        b.iter(|| {
            let i = rand::random::<usize>() % 100;
            black_box(cache.get(&format!("p{}", i)).unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_store_size,
    bench_matchers,
    bench_conditions,
    bench_deny_vs_allow,
    bench_cached_get,
);
criterion_main!(benches);
