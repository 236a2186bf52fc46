//! Per-patch normal/height texture.
//!
//! Baked once on the CPU when a patch is created: one texel per blade cell
//! holding `(normal.xyz, height / terrain_height)`. Rows are baked in parallel.

use half::f16;
use rayon::prelude::*;

use crate::core::types::Vec3;
use crate::core::Result;
use crate::render::limits;
use super::patch::UvRect;
use super::provider::{HeightProvider, NormalProvider};

/// Bytes per `Rgba16Float` texel. Half floats keep the texture filterable
/// without extra device features; normalized heights keep 11 significant bits.
const TEXEL_BYTES: u32 = 8;

/// CPU-side normal/height grid, row-major
#[derive(Clone, Debug, PartialEq)]
pub struct NormalHeightData {
    resolution: u32,
    texels: Vec<[f32; 4]>,
}

impl NormalHeightData {
    /// Sample the terrain providers over `rect`.
    ///
    /// Cell `(row, col)` samples local uv `(col / res, row / res)` and lands in
    /// `texels[row * res + col]`.
    pub fn bake(
        rect: UvRect,
        resolution: u32,
        heights: &dyn HeightProvider,
        normals: &dyn NormalProvider,
        terrain_height: f32,
    ) -> Self {
        let res = resolution as usize;
        let inv_res = 1.0 / resolution as f32;
        let mut texels = vec![[0.0f32; 4]; res * res];

        texels
            .par_chunks_mut(res.max(1))
            .enumerate()
            .for_each(|(row, line)| {
                let v = row as f32 * inv_res;
                for (col, texel) in line.iter_mut().enumerate() {
                    let u = col as f32 * inv_res;
                    let (x, y) = rect.global(u, v);
                    let n = normals.normal(x, y);
                    let h = heights.height(x, y) / terrain_height;
                    *texel = [n.x, n.y, n.z, h];
                }
            });

        Self { resolution, texels }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// Texel at column `col`, row `row`
    pub fn texel(&self, col: u32, row: u32) -> [f32; 4] {
        self.texels[(row * self.resolution + col) as usize]
    }

    /// Full mip chain, level 0 first, down to 1x1.
    ///
    /// Each level is an area-weighted box filter of the previous one, so the
    /// mean height survives every level. Normals are renormalized after
    /// averaging.
    pub fn mip_chain(&self) -> Vec<Vec<[f32; 4]>> {
        let mut levels = vec![self.texels.clone()];
        let mut size = self.resolution;
        while size > 1 {
            let next = (size / 2).max(1);
            let level = downsample(&levels[levels.len() - 1], size, next);
            levels.push(level);
            size = next;
        }
        levels
    }

    /// Convert to `Rgba16Float` bytes
    fn encode(texels: &[[f32; 4]]) -> Vec<u8> {
        let bits: Vec<u16> = texels
            .iter()
            .flat_map(|t| t.iter().map(|&c| f16::from_f32(c).to_bits()))
            .collect();
        bytemuck::cast_slice(&bits).to_vec()
    }
}

/// Source texels covered by output texel `out` when `size` shrinks to `next`,
/// weighted by overlap. Weights sum to 1.
fn footprint(out: u32, size: u32, next: u32) -> Vec<(u32, f32)> {
    let scale = size as f32 / next as f32;
    let lo = out as f32 * scale;
    let hi = lo + scale;
    (lo.floor() as u32..(hi.ceil() as u32).min(size))
        .filter_map(|i| {
            let overlap = hi.min(i as f32 + 1.0) - lo.max(i as f32);
            (overlap > 0.0).then(|| (i, overlap / scale))
        })
        .collect()
}

/// Area-weighted box filter. Odd sizes spread the middle texel over both
/// neighbours so every source texel contributes equally.
fn downsample(src: &[[f32; 4]], size: u32, next: u32) -> Vec<[f32; 4]> {
    let spans: Vec<_> = (0..next).map(|i| footprint(i, size, next)).collect();
    let mut out = Vec::with_capacity((next * next) as usize);
    for rows in &spans {
        for cols in &spans {
            let mut sum = [0.0f32; 4];
            for &(y, wy) in rows {
                for &(x, wx) in cols {
                    let t = src[(y * size + x) as usize];
                    for c in 0..4 {
                        sum[c] += t[c] * wx * wy;
                    }
                }
            }
            let n = Vec3::new(sum[0], sum[1], sum[2]).normalize_or(Vec3::Y);
            out.push([n.x, n.y, n.z, sum[3]]);
        }
    }
    out
}

/// Number of mip levels for a square texture of edge `size`
pub fn mip_level_count(size: u32) -> u32 {
    32 - size.max(1).leading_zeros()
}

/// Mip level to sample at camera `distance`.
///
/// Level 0 up to `detail_distance`, then one level per doubling of the
/// distance. Fractional results blend adjacent levels under trilinear
/// filtering. Always 0 for a single-level texture.
pub fn normal_height_lod(distance: f32, detail_distance: f32, mip_levels: u32) -> f32 {
    let max_level = mip_levels.saturating_sub(1) as f32;
    if max_level == 0.0 || distance.is_nan() || distance <= detail_distance {
        return 0.0;
    }
    (distance / detail_distance).log2().min(max_level)
}

/// GPU copy of a patch's normal/height data
pub struct NormalHeightTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl NormalHeightTexture {
    /// Upload `data` as `Rgba16Float`.
    ///
    /// With `trilinear` the full mip chain is uploaded and sampled with linear
    /// mip filtering; otherwise only level 0 with bilinear filtering.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, data: &NormalHeightData, trilinear: bool) -> Result<Self> {
        let res = data.resolution();
        limits::check_texture_2d(&device.limits(), "grass_normal_height", res, res)?;

        let levels = if trilinear { data.mip_chain() } else { vec![data.texels.clone()] };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("grass_normal_height"),
            size: wgpu::Extent3d {
                width: res,
                height: res,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut size = res;
        for (level, texels) in levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &NormalHeightData::encode(texels),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(size * TEXEL_BYTES),
                    rows_per_image: Some(size),
                },
                wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
            );
            size = (size / 2).max(1);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grass_normal_height_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: if trilinear {
                wgpu::MipmapFilterMode::Linear
            } else {
                wgpu::MipmapFilterMode::Nearest
            },
            ..Default::default()
        });

        Ok(Self { texture, view, sampler })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn mip_level_count(&self) -> u32 {
        self.texture.mip_level_count()
    }

    /// Release the GPU texture now instead of on drop
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grass::provider::FlatTerrain;

    /// Height is x, normal encodes y, so texel placement is observable
    struct Gradient;

    impl HeightProvider for Gradient {
        fn height(&self, x: f32, _y: f32) -> f32 {
            x * 10.0
        }
    }

    impl NormalProvider for Gradient {
        fn normal(&self, _x: f32, y: f32) -> Vec3 {
            Vec3::new(y, 1.0, 0.0)
        }
    }

    #[test]
    fn test_flat_terrain_bake() {
        let flat = FlatTerrain::new(100.0, 100.0, 5.0, 20.0);
        let data = NormalHeightData::bake(UvRect::new(0.0, 0.0, 0.1, 0.1), 8, &flat, &flat, 20.0);

        assert_eq!(data.texels().len(), 64);
        for t in data.texels() {
            assert_eq!(*t, [0.0, 1.0, 0.0, 0.25]);
        }
    }

    #[test]
    fn test_texel_layout_is_row_major() {
        let rect = UvRect::new(0.5, 0.25, 0.5, 0.5);
        let data = NormalHeightData::bake(rect, 4, &Gradient, &Gradient, 10.0);

        // Column drives global x (height), row drives global y (normal.x)
        for row in 0..4 {
            for col in 0..4 {
                let t = data.texel(col, row);
                let x = 0.5 + 0.5 * col as f32 / 4.0;
                let y = 0.25 + 0.5 * row as f32 / 4.0;
                assert!((t[3] - x).abs() < 1e-6, "height at ({col}, {row})");
                assert!((t[0] - y).abs() < 1e-6, "normal at ({col}, {row})");
            }
        }
        assert_eq!(data.texels()[6], data.texel(2, 1));
    }

    #[test]
    fn test_mip_chain_sizes() {
        let flat = FlatTerrain::new(1.0, 1.0, 2.0, 4.0);
        let data = NormalHeightData::bake(UvRect::new(0.0, 0.0, 1.0, 1.0), 32, &flat, &flat, 4.0);
        let chain = data.mip_chain();

        assert_eq!(chain.len() as u32, mip_level_count(32));
        let sizes: Vec<usize> = chain.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1024, 256, 64, 16, 4, 1]);
        // Constant input stays constant
        assert_eq!(chain[5][0], [0.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_mip_chain_odd_size() {
        let flat = FlatTerrain::new(1.0, 1.0, 1.0, 1.0);
        let data = NormalHeightData::bake(UvRect::new(0.0, 0.0, 1.0, 1.0), 12, &flat, &flat, 1.0);
        let sizes: Vec<usize> = data.mip_chain().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![144, 36, 9, 1]);
        assert_eq!(mip_level_count(12), 4);
    }

    fn mean_height(level: &[[f32; 4]]) -> f32 {
        level.iter().map(|t| t[3]).sum::<f32>() / level.len() as f32
    }

    #[test]
    fn test_odd_footprint_covers_every_texel() {
        let weights = footprint(0, 3, 1);
        assert_eq!(weights.iter().map(|&(i, _)| i).collect::<Vec<_>>(), vec![0, 1, 2]);
        for (_, w) in weights {
            assert!((w - 1.0 / 3.0).abs() < 1e-6);
        }

        // 5 -> 2 splits the middle texel between both outputs
        assert_eq!(footprint(0, 5, 2), vec![(0, 0.4), (1, 0.4), (2, 0.2)]);
        assert_eq!(footprint(1, 5, 2), vec![(2, 0.2), (3, 0.4), (4, 0.4)]);
    }

    #[test]
    fn test_mip_chain_keeps_mean_height() {
        // Height runs 0..11/12 across the columns of a 12x12 grid
        let data = NormalHeightData::bake(UvRect::new(0.0, 0.0, 1.0, 1.0), 12, &Gradient, &Gradient, 10.0);
        let chain = data.mip_chain();
        let mean = mean_height(data.texels());
        assert!((mean - 5.5 / 12.0).abs() < 1e-5);

        for (level, texels) in chain.iter().enumerate() {
            assert!((mean_height(texels) - mean).abs() < 1e-5, "level {level}");
        }
        assert!((chain[3][0][3] - mean).abs() < 1e-5);
    }

    #[test]
    fn test_lod_level_from_distance() {
        assert_eq!(normal_height_lod(5.0, 10.0, 6), 0.0);
        assert_eq!(normal_height_lod(10.0, 10.0, 6), 0.0);
        assert!((normal_height_lod(20.0, 10.0, 6) - 1.0).abs() < 1e-6);
        assert!((normal_height_lod(30.0, 10.0, 6) - 30.0f32.log2() + 10.0f32.log2()).abs() < 1e-5);
        assert_eq!(normal_height_lod(1e6, 10.0, 6), 5.0);
        assert_eq!(normal_height_lod(f32::INFINITY, 10.0, 6), 5.0);
        // Bilinear textures have a single level
        assert_eq!(normal_height_lod(1e6, 10.0, 1), 0.0);
    }

    #[test]
    fn test_half_float_height_precision() {
        // f16 keeps 11 significant bits of the normalized height
        for i in 0..=1000 {
            let h = i as f32 / 1000.0;
            let bytes = NormalHeightData::encode(&[[0.0, 1.0, 0.0, h]]);
            let stored = f16::from_bits(u16::from_ne_bytes([bytes[6], bytes[7]])).to_f32();
            assert!((stored - h).abs() <= 2.0f32.powi(-11) + f32::EPSILON, "height {h}");
        }
    }

    #[test]
    fn test_encode_is_half_float() {
        let bytes = NormalHeightData::encode(&[[0.0, 1.0, 0.0, 0.5]]);
        assert_eq!(bytes.len(), TEXEL_BYTES as usize);
        let bits: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(f16::from_bits(bits[1]).to_f32(), 1.0);
        assert_eq!(f16::from_bits(bits[3]).to_f32(), 0.5);
    }
}
