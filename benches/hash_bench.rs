use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dclass::{DcFile, SimpleParameter, SubatomicType};

fn schema(classes: usize) -> DcFile {
    let mut file = DcFile::new();
    let mut parent = None;
    for i in 0..classes {
        let class = file.add_class(&format!("Class{i}"), false).unwrap();
        if let Some(parent) = parent {
            file.add_parent(class, parent).unwrap();
        }
        for j in 0..8 {
            let arg = file.new_parameter_field("v", SimpleParameter::new(SubatomicType::UInt32).into());
            let field = file.new_atomic_field(&format!("set{i}_{j}"), vec![arg]).unwrap();
            file.add_field_keyword(field, "broadcast").unwrap();
            file.add_field(class, field).unwrap();
        }
        parent = Some(class);
    }
    file
}

fn hash_bench(c: &mut Criterion) {
    let file = schema(64);
    c.bench_function("generate_hash", |b| b.iter(|| black_box(file.generate_hash())));
}

fn layout_bench(c: &mut Criterion) {
    c.bench_function("inherited_fields", |b| {
        b.iter_with_setup(
            || schema(16),
            |file| {
                let last = file.get_class_by_name("Class15").unwrap();
                black_box(file.get_num_inherited_fields(last))
            },
        )
    });
}

criterion_group!(benches, hash_bench, layout_bench);
criterion_main!(benches);
