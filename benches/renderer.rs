use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use struct_layout_viewer::config::{Config, DisplayMode, LayoutConfig};
use struct_layout_viewer::decode::{DATA_VERSION, decode, parse_layout};
use struct_layout_viewer::layout::compute_layout;
use struct_layout_viewer::normalize::normalize;
use struct_layout_viewer::view::LayoutView;

fn string(out: &mut Vec<u8>, value: &str) {
    let mut len = value.len();
    loop {
        let byte = (len & 0x7F) as u8;
        len >>= 7;
        if len == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out.extend_from_slice(value.as_bytes());
}

fn node_header(out: &mut Vec<u8>, ty: &str, name: &str, offset: i64, size: i64, category: u8) {
    string(out, ty);
    string(out, name);
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&8i64.to_le_bytes());
    out.push(category);
    out.extend_from_slice(&(-1i32).to_le_bytes());
    out.extend_from_slice(&(-1i32).to_le_bytes());
}

/// A root holding `members` nested structs of 32 bytes, each with a few
/// scalars, a pair of bitfields and a union.
fn synthetic_blob(members: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&DATA_VERSION.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    node_header(&mut out, "struct Big", "", 0, members as i64 * 32, 0);
    out.extend_from_slice(&(members as u32).to_le_bytes());
    for i in 0..members {
        node_header(&mut out, "struct Member", &format!("m{i}"), i as i64 * 32, 32, 3);
        out.extend_from_slice(&5u32.to_le_bytes());
        node_header(&mut out, "char", "tag", 0, 1, 1);
        out.extend_from_slice(&0u32.to_le_bytes());
        node_header(&mut out, "int", "count", 4, 4, 1);
        out.extend_from_slice(&0u32.to_le_bytes());
        node_header(&mut out, "unsigned", "lo", 8, 4, 2);
        out.extend_from_slice(&0u32.to_le_bytes());
        node_header(&mut out, "unsigned", "hi", 8, 4, 2);
        out.extend_from_slice(&0u32.to_le_bytes());
        node_header(&mut out, "union Value", "value", 16, 16, 12);
        out.extend_from_slice(&2u32.to_le_bytes());
        node_header(&mut out, "double", "d", 0, 8, 1);
        out.extend_from_slice(&0u32.to_le_bytes());
        node_header(&mut out, "char[16]", "s", 0, 16, 1);
        out.extend_from_slice(&0u32.to_le_bytes());
    }
    out
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for members in [8usize, 128, 2048] {
        let blob = synthetic_blob(members);
        group.bench_with_input(BenchmarkId::from_parameter(members), &blob, |b, data| {
            b.iter(|| {
                let outcome = decode(black_box(data)).unwrap();
                black_box(outcome.tree().map(|t| t.arena_len()));
            });
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    for members in [8usize, 128, 2048] {
        let tree = decode(&synthetic_blob(members)).unwrap().into_tree().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(members), &tree, |b, tree| {
            b.iter(|| {
                let mut tree = tree.clone();
                black_box(normalize(&mut tree));
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig {
        fast_text_metrics: true,
        ..Default::default()
    };
    for members in [8usize, 128, 2048] {
        let tree = parse_layout(&synthetic_blob(members))
            .unwrap()
            .into_tree()
            .unwrap();
        for columns in [8u32, 64] {
            group.bench_with_input(
                BenchmarkId::new(format!("stack_{columns}"), members),
                &tree,
                |b, tree| {
                    b.iter(|| {
                        let layout =
                            compute_layout(black_box(tree), columns, DisplayMode::Stack, &config);
                        black_box(layout.rows);
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    for members in [8usize, 128] {
        let tree = parse_layout(&synthetic_blob(members))
            .unwrap()
            .into_tree()
            .unwrap();
        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        let mut view = LayoutView::new(config);
        view.set_tree(Some(tree));
        view.expand_all();
        group.bench_with_input(BenchmarkId::from_parameter(members), &view, |b, view| {
            b.iter(|| black_box(view.render_svg().len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_normalize, bench_layout, bench_render);
criterion_main!(benches);
