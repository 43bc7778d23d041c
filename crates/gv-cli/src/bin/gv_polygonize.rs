//! Vectorize a categorical label raster into simplified GeoJSON polygons.
//!
//! The raster is any 8- or 16-bit grayscale image the `image` crate can
//! decode; pixel values are the class labels. Georeferencing comes from an
//! optional JSON sidecar (`affine` six-tuple, `crs` string, `nodata`
//! label); without one the output stays in pixel coordinates.
//!
//! Exit codes: 0 success, 1 configuration error, 2 I/O error,
//! 3 tile failure.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use geovec::{
    Affine, Cancellation, Grid, PolygonizeConfig, PolygonizeError, VectorLayer, default_chain,
    fill_small_blobs, polygonize_with,
};
use log::info;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "gv_polygonize")]
#[command(about = "Convert a categorical raster into a gap-free polygon layer")]
struct Cli {
    /// Label raster (8- or 16-bit grayscale image)
    #[arg(long)]
    input: PathBuf,

    /// Georeferencing sidecar JSON: {"affine": [a,b,c,d,e,f], "crs": "...", "nodata": n}
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Output GeoJSON path
    #[arg(long)]
    output: PathBuf,

    /// Tile side length in pixels
    #[arg(long, default_value_t = 200)]
    tile_size: usize,

    /// Worker threads (0 = all cores)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Dissolve regions smaller than this many pixels before vectorizing
    #[arg(long, default_value_t = 5)]
    min_blob_size: usize,

    /// Ground size of one pixel; taken from the affine when omitted
    #[arg(long)]
    meters_per_pixel: Option<f64>,

    /// Simplification tolerance in pixels
    #[arg(long, default_value_t = 2.0)]
    simplification_pixel_window: f64,

    /// Chaikin smoothing iterations
    #[arg(long, default_value_t = 5)]
    smoothing_iterations: usize,
}

#[derive(Debug, Deserialize)]
struct RasterMeta {
    affine: [f64; 6],
    #[serde(default)]
    crs: Option<String>,
    #[serde(default)]
    nodata: Option<i32>,
}

enum RunError {
    Config(anyhow::Error),
    Io(anyhow::Error),
    Pipeline(PolygonizeError),
}

impl RunError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::Io(_) => 2,
            Self::Pipeline(PolygonizeError::Config(_)) => 1,
            Self::Pipeline(_) => 3,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Config(e) => format!("{e:#}"),
            Self::Io(e) => format!("{e:#}"),
            Self::Pipeline(e) => e.to_string(),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let meta = match &cli.meta {
        Some(path) => Some(load_meta(path).map_err(RunError::Io)?),
        None => None,
    };
    let affine = meta
        .as_ref()
        .map_or_else(Affine::unit, |m| {
            let [a, b, c, d, e, f] = m.affine;
            Affine::new(a, b, c, d, e, f)
        });
    let nodata = meta.as_ref().and_then(|m| m.nodata);
    let crs = meta.as_ref().and_then(|m| m.crs.clone());

    let mut grid = load_raster(&cli.input).map_err(RunError::Io)?;
    info!(
        "loaded {}x{} label raster from {}",
        grid.width(),
        grid.height(),
        cli.input.display()
    );

    if cli.min_blob_size > 1 {
        fill_small_blobs(&mut grid, cli.min_blob_size, nodata);
    }

    let cfg = PolygonizeConfig {
        tile_size: cli.tile_size,
        workers: if cli.workers == 0 {
            PolygonizeConfig::default().workers
        } else {
            cli.workers
        },
        meters_per_pixel: cli.meters_per_pixel,
        simplification_pixel_window: cli.simplification_pixel_window,
        smoothing_iterations: cli.smoothing_iterations,
    };
    cfg.validate()
        .map_err(|e| RunError::Config(anyhow!("{e}")))?;

    let pixel_size = cfg.meters_per_pixel.unwrap_or_else(|| affine.pixel_size());
    let chain = default_chain(
        cfg.simplification_pixel_window * pixel_size,
        cfg.smoothing_iterations,
    );

    let layer = polygonize_with(
        &grid.as_view(),
        &affine,
        nodata,
        &cfg,
        &chain,
        &Cancellation::new(),
    )
    .map_err(RunError::Pipeline)?;

    let n_polygons: usize = layer.classes.iter().map(|c| c.polygons.len()).sum();
    info!(
        "{} polygons in {} classes",
        n_polygons,
        layer.classes.len()
    );

    write_geojson(&cli.output, &layer, crs.as_deref()).map_err(RunError::Io)?;
    info!("wrote {}", cli.output.display());
    Ok(())
}

fn load_meta(path: &Path) -> Result<RasterMeta> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading sidecar {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing sidecar {}", path.display()))
}

fn load_raster(path: &Path) -> Result<Grid<i32>> {
    let img = image::open(path).with_context(|| format!("reading raster {}", path.display()))?;
    let gray = img.into_luma16();
    let (w, h) = (gray.width() as usize, gray.height() as usize);

    let data: Vec<i32> = gray.into_raw().into_iter().map(i32::from).collect();
    Grid::from_vec(w, h, data).map_err(|e| anyhow!("raster dimensions invalid: {e}"))
}

fn write_geojson(path: &Path, layer: &VectorLayer, crs: Option<&str>) -> Result<()> {
    let ring = |r: &[geovec::Point2]| -> Vec<Vec<f64>> {
        r.iter().map(|p| vec![p.x, p.y]).collect()
    };

    let mut features = Vec::new();
    for class in &layer.classes {
        for polygon in &class.polygons {
            let mut rings = vec![ring(&polygon.shell)];
            rings.extend(polygon.holes.iter().map(|h| ring(h)));

            let mut properties = JsonObject::new();
            properties.insert("label".to_string(), JsonValue::from(class.label));

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(rings))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    let foreign_members = crs.map(|crs| {
        let mut members = JsonObject::new();
        members.insert("crs".to_string(), JsonValue::from(crs));
        members
    });

    let collection = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    });

    fs::write(path, collection.to_string())
        .with_context(|| format!("writing {}", path.display()))
}
