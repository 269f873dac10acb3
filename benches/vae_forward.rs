use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use vanillavae::math::Matrix;
use vanillavae::models::{one_hot, CVAE, VAE};

fn bench_forward(c: &mut Criterion) {
    let batch = 16;
    let input = 28 * 28;
    let mut rng = rand::thread_rng();
    let x = Matrix::from_vec(batch, input, (0..batch * input).map(|_| rng.gen()).collect());
    let labels: Vec<usize> = (0..batch).map(|i| i % 10).collect();
    let cond = one_hot(&labels, 10).unwrap();

    let vae = VAE::new(input, 15);
    let cvae = CVAE::new(input, 10, 15);

    c.bench_function("vae_forward_batch16", |b| {
        b.iter(|| {
            let out = vae.forward(black_box(&x)).unwrap();
            black_box(out);
        });
    });

    c.bench_function("cvae_forward_batch16", |b| {
        b.iter(|| {
            let out = cvae.forward(black_box(&x), black_box(&cond)).unwrap();
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_forward);
criterion_main!(benches);
