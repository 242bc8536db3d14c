use crate::cli::MapArgs;
use crate::config::{Overrides, build_load_config};
use crate::error::Result;
use nalgebra::Point3;
use std::path::Path;
use tracing::info;
use xtal::engine::error::XtalError;
use xtal::workflows::load;

pub fn run(args: MapArgs, config_path: Option<&Path>) -> Result<()> {
    let overrides = Overrides {
        no_sigma_scale: args.no_sigma_scale,
        ..Overrides::default()
    };
    let config = build_load_config(config_path, overrides)?;

    info!("Loading density map from {}", args.path.display());
    let map = load::load_map_path(&args.path, &config.map)?;
    println!("{}", map.summary());

    if let Some([x, y, z]) = args.center {
        let region = map
            .points_and_values(&Point3::new(x, y, z), args.radius)
            .map_err(XtalError::from)?;
        println!(
            "Box around ({:.3}, {:.3}, {:.3}) +- {:.3}: {:?} grid points ({} total)",
            x,
            y,
            z,
            args.radius,
            region.size,
            region.len()
        );
        if let Some((min, max)) = region.value_range() {
            println!("  values: min {:.4}, max {:.4}", min, max);
        }
    }
    Ok(())
}
