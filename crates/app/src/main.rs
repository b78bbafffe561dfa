//! Command-line entry point: load an OBJ file and report what the renderer
//! would receive.

use anyhow::{Context, Result, bail};
use asset::{LoadOptions, MeshLoader};
use corelib::BoundsSeed;

struct Args {
    path: String,
    options: LoadOptions,
}

fn parse_bounds_seed_arg(val: &str) -> BoundsSeed {
    match val.to_ascii_lowercase().as_str() {
        "origin" | "zero" => BoundsSeed::Origin,
        "first" | "first-vertex" => BoundsSeed::FirstVertex,
        other => {
            log::warn!("Unknown bounds seed '{}', falling back to first-vertex.", other);
            BoundsSeed::FirstVertex
        }
    }
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    // Accept: <file.obj> [--bounds-seed=origin|first] [--scale-divisor=<f32>] [--remap-texcoords]
    let mut path = None;
    let mut options = LoadOptions::default();

    for arg in args {
        if let Some(val) = arg.strip_prefix("--bounds-seed=") {
            options.bounds_seed = parse_bounds_seed_arg(val);
        } else if let Some(val) = arg.strip_prefix("--scale-divisor=") {
            let divisor: f32 = val
                .parse()
                .with_context(|| format!("Invalid --scale-divisor '{}'", val))?;
            if !(divisor.is_finite() && divisor > 0.0) {
                bail!("--scale-divisor must be a positive number, got {}", divisor);
            }
            options.scale_divisor = divisor;
        } else if arg == "--remap-texcoords" {
            options.remap_texcoords = true;
        } else if arg.starts_with("--") {
            log::warn!("Ignoring unknown flag '{}'", arg);
        } else if path.is_none() {
            path = Some(arg);
        } else {
            bail!("Only one OBJ file may be given (extra argument '{}')", arg);
        }
    }

    let path = path.context(
        "Usage: app <file.obj> [--bounds-seed=origin|first] [--scale-divisor=N] [--remap-texcoords]",
    )?;
    Ok(Args { path, options })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1))?;
    log::info!("Loading {} with {:?}", args.path, args.options);

    let mut loader = MeshLoader::with_options(args.options);
    loader
        .load(&args.path)
        .with_context(|| format!("Failed to load mesh {}", args.path))?;

    if let Some(mesh) = loader.mesh() {
        let counts = mesh.counts();
        let bounds = mesh.bounds();
        log::info!(
            "v={} vt={} vn={} f={} indices={}",
            counts.vertices,
            counts.texcoords,
            counts.normals,
            counts.faces,
            mesh.index_count()
        );
        log::info!(
            "bounds min={:?} max={:?} center={:?} scale={:.5}",
            bounds.min,
            bounds.max,
            bounds.center(),
            mesh.scale()
        );
        log::info!(
            "normals: {:?} (has_normals={}), centroid={:?}",
            mesh.normal_source(),
            loader.has_normals(),
            mesh.centroid()
        );

        let interleaved = mesh.to_mesh_data();
        log::info!(
            "interleaved: {} vertices, {} indices, per-vertex uvs={}",
            interleaved.vertices.len(),
            interleaved.indices.len(),
            mesh.texcoords_per_vertex()
        );
    }

    loader.release();
    Ok(())
}
