//! Benchmarks for the corpus-assembly hot paths: deduplication hashing and
//! the pairwise refinement scan.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bioasm::agent::Agent;
use bioasm::corpus::dedup::combine_duplicates;
use bioasm::corpus::refine::combine_related;
use bioasm::ontology::HierarchySet;
use bioasm::statement::{Evidence, Statement};

fn corpus(n: usize) -> Vec<Statement> {
    let genes = ["BRAF", "ARAF", "RAF1", "MAP2K1", "MAP2K2", "MAPK1", "MAPK3"];
    let positions = ["218", "222", "445", "599"];
    (0..n)
        .map(|i| {
            let enz = Agent::new(genes[i % genes.len()]).with_grounding("HGNC", genes[i % genes.len()]);
            let sub_name = genes[(i + 3) % genes.len()];
            let sub = Agent::new(sub_name).with_grounding("HGNC", sub_name);
            let position = if i % 3 == 0 { None } else { Some(positions[i % positions.len()]) };
            Statement::phosphorylation(Some(enz), sub, position.map(|_| "S"), position)
                .with_evidence(Evidence::new("reach"))
        })
        .collect()
}

fn bench_dedup(c: &mut Criterion) {
    let stmts = corpus(2000);
    c.bench_function("combine_duplicates_2000", |b| {
        b.iter(|| combine_duplicates(black_box(&stmts)))
    });
}

fn bench_related(c: &mut Criterion) {
    let hierarchies = HierarchySet::with_seed_entities().unwrap();
    let unique = combine_duplicates(&corpus(2000));
    c.bench_function("combine_related_unique", |b| {
        b.iter(|| combine_related(black_box(unique.clone()), &hierarchies))
    });
}

criterion_group!(benches, bench_dedup, bench_related);
criterion_main!(benches);
