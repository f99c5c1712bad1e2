use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rolap_engine::{FlatMemberCache, Hierarchy, InMemoryMemberSource, MemberKey, MemberReader};
use std::time::Duration;

fn bench_members() -> usize {
    std::env::var("ROLAP_MEMBER_BENCH_SIZE")
        .ok()
        .and_then(|v| v.replace('_', "").parse::<usize>().ok())
        .filter(|&v| (1_000..=1_000_000).contains(&v))
        .unwrap_or(100_000)
}

/// `[All, Region, Store]` with 100 regions and `stores` stores spread over them.
fn build_source(stores: usize) -> InMemoryMemberSource {
    let regions = 100usize;
    let all = MemberKey::root("All");
    let hierarchy = Hierarchy::new("Store", vec!["All", "Region", "Store"]).with_all_level();
    let mut source = InMemoryMemberSource::new(hierarchy).with_member(all.clone(), "All Stores");
    let per_region = stores.div_ceil(regions);
    for r in 0..regions {
        let region = all.child(format!("Region_{r:03}"));
        source = source.with_member(region.clone(), format!("Region_{r:03}"));
        for s in 0..per_region {
            let name = format!("Store_{r:03}_{s:05}");
            source = source.with_member(region.child(name.clone()), name);
        }
    }
    source
}

fn bench_member_cache(c: &mut Criterion) {
    let stores = bench_members();
    let source = build_source(stores);

    let mut load = c.benchmark_group("member_cache_load");
    load.sample_size(10);
    load.measurement_time(Duration::from_secs(5));
    load.bench_with_input(BenchmarkId::new("flat", stores), &stores, |b, _| {
        b.iter(|| {
            let cache = FlatMemberCache::load(&source).unwrap();
            black_box(cache.get_member_count());
        })
    });
    load.finish();

    let cache = FlatMemberCache::load(&source).unwrap();
    let level = cache.hierarchy().level(2).unwrap().clone();
    let stores_at_level = cache.get_members_in_level(&level);
    let first = stores_at_level[0].clone();
    let middle = stores_at_level[stores_at_level.len() / 2].clone();
    let last = stores_at_level[stores_at_level.len() - 1].clone();

    let mut nav = c.benchmark_group("member_cache_navigation");
    nav.sample_size(20);
    nav.measurement_time(Duration::from_secs(5));

    nav.bench_with_input(BenchmarkId::new("lead_100", stores), &stores, |b, _| {
        b.iter(|| black_box(cache.get_lead_member(&middle, 100)))
    });

    nav.bench_with_input(BenchmarkId::new("range_full_level", stores), &stores, |b, _| {
        b.iter(|| black_box(cache.get_member_range(&level, &first, &last).unwrap().len()))
    });

    nav.bench_with_input(BenchmarkId::new("children", stores), &stores, |b, _| {
        let parent = cache.get_member_parent(&middle);
        b.iter(|| black_box(cache.get_member_children(&parent).len()))
    });

    nav.bench_with_input(BenchmarkId::new("lookup_by_key", stores), &stores, |b, _| {
        b.iter(|| black_box(cache.get_member(middle.key())))
    });

    nav.finish();
}

criterion_group!(benches, bench_member_cache);
criterion_main!(benches);
