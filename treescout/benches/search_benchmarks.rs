use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use tempfile::tempdir;
use treescout::{
    fs::{MemoryFs, OsFs},
    permissions::{AllowAll, RuleChecker},
    search::{collect, search_many, CyclePolicy, SearchOptions},
};

const EXTENSIONS: [&str; 4] = ["txt", "md", "png", "mp3"];

// `dirs` directories of `files_per_dir` files each, spread over two levels.
fn create_memory_tree(dirs: usize, files_per_dir: usize) -> MemoryFs {
    let mut tree = MemoryFs::new();
    for d in 0..dirs {
        for f in 0..files_per_dir {
            let ext = EXTENSIONS[f % EXTENSIONS.len()];
            tree.add_file(
                &format!("/root/group_{}/dir_{}/file_{}.{}", d % 8, d, f, ext),
                (f * 64) as u64,
            );
        }
    }
    tree
}

fn bench_queries(c: &mut Criterion) {
    let tree = create_memory_tree(50, 40);
    let options = SearchOptions::default();
    let queries = vec![
        "",
        "file_1",
        "case:sensitive FILE",
        "type:image",
        "ext:md notes",
        "glob:**/dir_1*/*.txt",
    ];

    let mut group = c.benchmark_group("Queries");
    for (i, query) in queries.iter().enumerate() {
        group.bench_function(format!("query_{}", i), |b| {
            b.iter(|| black_box(collect(&tree, "/root", query, &AllowAll, &options).unwrap()));
        });
    }
    group.finish();
}

fn bench_tree_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tree Scaling");
    for dirs in [10, 100, 1000] {
        let tree = create_memory_tree(dirs, 20);
        let options = SearchOptions::default();
        group.bench_function(format!("dirs_{}", dirs), |b| {
            b.iter(|| black_box(collect(&tree, "/root", "file", &AllowAll, &options).unwrap()));
        });
    }
    group.finish();
}

fn bench_symlink_cycles(c: &mut Criterion) {
    let mut tree = create_memory_tree(10, 10);
    tree.add_symlink("/root/loop", "/root");

    let mut group = c.benchmark_group("Symlink Cycles");
    for (name, policy) in [("depth", CyclePolicy::Depth), ("visited", CyclePolicy::Visited)] {
        let options = SearchOptions::default().with_cycle_policy(policy);
        group.bench_function(name, |b| {
            b.iter(|| black_box(collect(&tree, "/root", "", &AllowAll, &options).unwrap()));
        });
    }
    group.finish();
}

fn bench_permission_rules(c: &mut Criterion) {
    let tree = create_memory_tree(100, 20);
    let options = SearchOptions::default();
    let checker = RuleChecker::new()
        .hide_dotfiles(true)
        .with_rule(treescout::permissions::Rule::prefix("/root/group_3", false))
        .with_rule(treescout::permissions::Rule::regex(r"dir_\d*7(/|$)", false).unwrap());

    c.bench_function("permission_rules", |b| {
        b.iter(|| black_box(collect(&tree, "/root", "", &checker, &options).unwrap()));
    });
}

fn bench_parallel_scopes(c: &mut Criterion) {
    let tree = create_memory_tree(400, 20);
    let options = SearchOptions::default();
    let scopes: Vec<String> = (0..8).map(|g| format!("/root/group_{}", g)).collect();

    let mut group = c.benchmark_group("Parallel Scopes");
    group.bench_function("sequential", |b| {
        b.iter(|| {
            for scope in &scopes {
                black_box(collect(&tree, scope, "file", &AllowAll, &options).unwrap());
            }
        });
    });
    group.bench_function("search_many", |b| {
        b.iter(|| black_box(search_many(&tree, &scopes, "file", &AllowAll, &options).unwrap()));
    });
    group.finish();
}

fn bench_os_tree(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    for d in 0..20 {
        let sub = dir.path().join(format!("dir_{}", d));
        fs::create_dir_all(&sub).unwrap();
        for f in 0..20 {
            fs::write(sub.join(format!("file_{}.txt", f)), "x").unwrap();
        }
    }
    let scope = dir.path().to_string_lossy().into_owned();
    let options = SearchOptions::default();

    c.bench_function("os_tree", |b| {
        b.iter(|| black_box(collect(&OsFs, &scope, "file_1", &AllowAll, &options).unwrap()));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_queries, bench_tree_scaling, bench_symlink_cycles,
              bench_permission_rules, bench_parallel_scopes, bench_os_tree
}

criterion_main!(benches);
