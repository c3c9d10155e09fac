use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kiln_engine::crowd::InstancedGroup;
use kiln_engine::device::{Gpu, GpuInit};
use kiln_engine::geometry::{CurveBuilder, GpuLineStrip};
use kiln_engine::gpu::WgpuBuffer;
use kiln_engine::logging::{init_logging, LoggingConfig};
use kiln_engine::render::{Camera, CrowdRenderer, LineStripRenderer, Mesh, Viewport};
use kiln_engine::shader::BindSession;

/// Studio settings, read from `KILN_*` environment variables.
#[derive(Debug, Clone)]
struct StudioConfig {
    crowd_size: usize,
    frames: u32,
    subdivisions: usize,
    seed: u64,
    size: Viewport,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            crowd_size: 256,
            frames: 120,
            subdivisions: 32,
            seed: 7,
            size: Viewport::new(1280, 720),
        }
    }
}

impl StudioConfig {
    fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            crowd_size: env_or("KILN_CROWD", d.crowd_size)?,
            frames: env_or("KILN_FRAMES", d.frames)?,
            subdivisions: env_or("KILN_SUBDIVISIONS", d.subdivisions)?,
            seed: env_or("KILN_SEED", d.seed)?,
            size: Viewport::new(
                env_or("KILN_WIDTH", d.size.width)?,
                env_or("KILN_HEIGHT", d.size.height)?,
            ),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key}={raw:?} is not a valid value")),
        Err(_) => Ok(default),
    }
}

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

const CURVE_COLOR: [f32; 4] = [1.0, 0.75, 0.2, 1.0];

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::from_env()?;
    log::info!("studio config: {config:?}");

    let init = GpuInit {
        size: config.size,
        ..GpuInit::default()
    };
    let gpu = match Gpu::new_blocking(init) {
        Ok(gpu) => gpu,
        Err(err) => {
            log::error!("GPU init failed: {err:#}");
            return Err(err);
        }
    };

    run(&gpu, &config)
}

fn run(gpu: &Gpu, config: &StudioConfig) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let ctx = gpu.render_ctx();

    // ── crowd ─────────────────────────────────────────────────────────────

    let started = Instant::now();
    let mut crowd: InstancedGroup<WgpuBuffer> =
        InstancedGroup::create(&ctx, config.crowd_size).context("creating crowd")?;

    for i in 0..crowd.capacity() {
        let position = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-1.0..1.0),
        );
        let axis = random_axis(&mut rng);
        let size = rng.gen_range(0.03..0.09);

        crowd.translate_member(i, position)?;
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        crowd.rotate_member(i, Quat::from_axis_angle(axis, angle))?;
        crowd.scale_member(i, Vec3::splat(size))?;
    }
    log::info!(
        "crowd: {} members placed in {:?}",
        crowd.population(),
        started.elapsed()
    );

    // ── curve ─────────────────────────────────────────────────────────────

    let mut curve = CurveBuilder::new(spiral(10, 0.8))?;
    curve.make_anchor(3)?;
    curve.make_anchor(6)?;

    let started = Instant::now();
    let polyline = curve.build(config.subdivisions)?;
    log::info!(
        "curve: {} segments, {} polyline points built in {:?}",
        curve.num_segments(),
        polyline.len(),
        started.elapsed()
    );
    let strip: GpuLineStrip<WgpuBuffer> =
        GpuLineStrip::upload(&ctx, &polyline).context("uploading curve")?;

    // ── frames ────────────────────────────────────────────────────────────

    let mesh = Mesh::cube(&ctx);
    let interface = CrowdRenderer::interface();
    let mut crowd_renderer = CrowdRenderer::new();
    let mut line_renderer = LineStripRenderer::new();
    let camera = Camera::looking_at(Vec3::new(0.0, 1.2, 2.6), Vec3::ZERO);

    let spin = Quat::from_rotation_y(0.6f32.to_radians());
    let mut total = Duration::ZERO;

    for frame in 0..config.frames {
        let started = Instant::now();

        // One 64-byte write per member.
        for i in 0..crowd.capacity() {
            crowd.rotate_member_global(i, spin)?;
        }

        let mut session = BindSession::with_program(&interface);
        crowd.bind(&mut session)?;

        let mut bind_result = Ok(());
        gpu.render(CLEAR, |ctx, target| {
            bind_result = crowd_renderer.render(ctx, target, &session, &mesh, &camera);
            line_renderer.render(ctx, target, &strip, &camera, CURVE_COLOR);
        });
        bind_result?;

        crowd.unbind(&mut session)?;

        let elapsed = started.elapsed();
        total += elapsed;
        log::debug!("frame {frame}: {elapsed:?}");
    }

    if config.frames > 0 {
        log::info!(
            "{} frames recorded, {:?} average",
            config.frames,
            total / config.frames
        );
    }
    Ok(())
}

fn random_axis(rng: &mut StdRng) -> Vec3 {
    let v = Vec3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    v.try_normalize().unwrap_or(Vec3::Y)
}

/// Points on a rising helix; every third one becomes an anchor.
fn spiral(count: usize, radius: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1).max(1) as f32;
            let angle = t * std::f32::consts::TAU * 1.5;
            Vec3::new(radius * angle.cos(), t - 0.5, radius * angle.sin())
        })
        .collect()
}
