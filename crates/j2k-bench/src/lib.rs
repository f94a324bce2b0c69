//! Benchmark inputs shared by the criterion suites.
//!
//! Run with: `cargo bench -p j2k-bench` (add `--features wgpu` for GPU rows).

/// Integer tile with smooth content plus a little texture.
pub fn tile_i32(width: usize, height: usize) -> Vec<i32> {
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            ((x * 3 + y * 2) % 256) as i32 + ((i * 7919) % 17) as i32 - 136
        })
        .collect()
}

/// Float copy of [`tile_i32`].
pub fn tile_f32(width: usize, height: usize) -> Vec<f32> {
    tile_i32(width, height).into_iter().map(|v| v as f32).collect()
}

/// Quantized coefficient block as fed to the entropy coder.
pub fn coefficients(len: usize) -> Vec<i32> {
    (0..len)
        .map(|i| {
            let v = ((i * 2_654_435_761usize) >> 11) % 4096;
            v as i32 - 2048
        })
        .collect()
}
