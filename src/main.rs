use clap::{Arg, Command};
use log::{error, info, warn};
use std::path::PathBuf;
use csv2kmz::{convert_file, ConvertOptions, DEFAULT_OUTPUT_DIR};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("csv2kmz")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts a parsed csv file to a kmz Google Earth overlay")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .num_args(1)
                .required(true)
                .help("The csv file to convert"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .num_args(1)
                .default_value(DEFAULT_OUTPUT_DIR)
                .help("The output directory"),
        )
        .arg(
            Arg::new("styles")
                .short('s')
                .long("styles")
                .num_args(1)
                .help("Location of the JSON point style settings (optional)"),
        )
        .get_matches();

    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let options = ConvertOptions {
        output_dir: PathBuf::from(matches.get_one::<String>("output").unwrap()),
        style_config: matches.get_one::<String>("styles").map(PathBuf::from),
    };

    match convert_file(&input, &options) {
        Ok(conversion) => {
            for warning in conversion.diagnostics.warnings() {
                warn!("{}", warning);
            }
            info!(
                "Converted {} records into {} placemarks across {} folders",
                conversion.records, conversion.placemarks, conversion.folders
            );
            if let Some(extent) = conversion.extent {
                info!(
                    "Extent: ({:.5}, {:.5}) to ({:.5}, {:.5})",
                    extent.min().x,
                    extent.min().y,
                    extent.max().x,
                    extent.max().y
                );
            }
            info!("Created {}", conversion.output_path.display());
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
