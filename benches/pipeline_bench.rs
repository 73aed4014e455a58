//! Benchmark for compilation and per-tick execution.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use nlsl_lang::arrangement::uniform_rect;
use nlsl_lang::service::{compile_glsl, compile_request};
use nlsl_lang::{DeviceProfile, Engine, ShaderKind};

const GEOMETRY: &str = "
uniform float amplitude;

void main() {
    float wave = sin(iGlobalTime + iFragCoord.x * 0.5) * amplitude;
    sd_FragCoord = iFragCoord + vec3(0.0, wave, 0.0);
    sd_FragNormal = normalize(iFragNormal);
}";

const FRAGMENT: &str = "
float ripple(vec3 p, float t) {
    float d = length(vec2(p.x, p.z));
    return sin(d - t) * 0.5 + 0.5;
}

void main() {
    sd_FragHeight = ripple(iFragCoord, iGlobalTime);
    sd_FragAngle = 0.0;
}";

const PIXEL: &str = "
void main() {
    vec2 uv = iPixelCoord / iPixelResolution;
    float glow = 0.0;
    for (int i = 0; i < 4; i++) {
        glow = glow + abs(sin(iGlobalTime * float(i) + uv.x));
    }
    sd_PixelColor = vec4(uv, clamp(glow / 4.0, 0.0, 1.0), 1.0);
}";

fn benchmark_compile(c: &mut Criterion) {
    c.bench_function("compile fragment shader", |b| {
        b.iter(|| black_box(compile_request(ShaderKind::Fragment, black_box(FRAGMENT)).unwrap()));
    });

    c.bench_function("export pixel shader to GLSL", |b| {
        b.iter(|| black_box(compile_glsl(ShaderKind::Pixel, black_box(PIXEL)).unwrap()));
    });
}

fn engine(pixel_resolution: [u32; 2]) -> Engine {
    let mut engine = Engine::new(DeviceProfile { pixel_resolution });
    engine.set_arrangement(uniform_rect(10, 10, 1.0, 1.0));
    for (kind, source) in [
        (ShaderKind::Geometry, GEOMETRY),
        (ShaderKind::Fragment, FRAGMENT),
        (ShaderKind::Pixel, PIXEL),
    ] {
        engine.install(kind, compile_request(kind, source).unwrap()).unwrap();
    }
    engine
}

fn benchmark_tick(c: &mut Criterion) {
    let mut small = engine([1, 1]);
    c.bench_function("tick 121 fragments, 1x1 pixels", |b| {
        b.iter(|| black_box(small.execute_at(Duration::from_millis(500)).unwrap()));
    });

    let mut large = engine([4, 4]);
    c.bench_function("tick 121 fragments, 4x4 pixels", |b| {
        b.iter(|| black_box(large.execute_at(Duration::from_millis(500)).unwrap()));
    });
}

criterion_group!(benches, benchmark_compile, benchmark_tick);
criterion_main!(benches);
