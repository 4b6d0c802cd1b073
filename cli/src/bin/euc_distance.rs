use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use distance::{DistanceRequest, Environment, euclidean_distance};
use tracing::error;

/// Euclidean distance from a feature class, limited to the cells of a mask raster
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feature class holding the sources (shapefile, GeoJSON, GeoPackage, ...)
    in_features: PathBuf,
    /// Output raster (.asc, .tif, .img)
    out_raster: PathBuf,
    /// Output cell size in map units
    cell_size: f64,
    /// Mask raster, or a polygon feature class
    mask_raster: PathBuf,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    cli::init_tracing();

    let args = Cli::parse();
    let request = DistanceRequest::new(args.in_features, args.out_raster, args.cell_size, args.mask_raster);
    let mut env = Environment::default();

    match euclidean_distance(&request, &mut env) {
        Ok(outcome) => {
            for message in &outcome.messages {
                println!("{message}");
            }
            Ok(())
        }
        Err(err) => {
            error!(kind = err.kind(), "{err}");
            Err(eyre!("EucDistance failed [{}]: {}", err.kind(), err))
        }
    }
}
