use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use gifti::{EmitOptions, Encoding, Output, Surface};

/// a strip of triangles over randomly placed vertices
fn random_surface(n: usize) -> Surface {
    let values: Array2<f32> = Array2::random((n, 3), Uniform::new(-100., 100.));
    let positions: Vec<[f32; 3]> = values
        .rows()
        .into_iter()
        .map(|row| [row[0], row[1], row[2]])
        .collect();
    let faces: Vec<[usize; 3]> = (0..n - 2).map(|i| [i, i + 1, i + 2]).collect();

    Surface::from_geometry(&positions, &faces).unwrap()
}

fn write(surface: &Surface, encoding: Encoding) -> String {
    let options = EmitOptions::default().with_encoding(encoding);
    let gifti = gifti::emit(surface, Output::Surface, &options).unwrap();
    gifti::to_string(&gifti).unwrap()
}

fn write_bench(c: &mut Criterion) {
    let surface = random_surface(50_000);

    c.bench_function("write base64 50k", |b| {
        b.iter(|| write(black_box(&surface), Encoding::Base64Binary))
    });

    c.bench_function("write ascii 50k", |b| {
        b.iter(|| write(black_box(&surface), Encoding::Ascii))
    });
}

criterion_group!(benches, write_bench);
criterion_main!(benches);
