use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use montage::config::{DEFAULT_ALPHA, DEFAULT_BLUR_SIGMA, DEFAULT_THRESHOLD};
use montage::{build_montage, io, MontageConfig};

/// Create a montage from a sequence of aligned photos of one scene.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The input photos, composited in the order given.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// The path to save the montage to. The format follows the extension.
    #[arg(short, long)]
    output: PathBuf,

    /// Amount to blur the images before differencing and the mask after.
    #[arg(short, long, default_value_t = DEFAULT_BLUR_SIGMA, allow_negative_numbers = true)]
    blur_sigma: f32,

    /// Summed RGB difference at which a pixel counts as foreground.
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, allow_negative_numbers = true)]
    threshold: i64,

    /// Opacity of the foreground when blending (0.0-1.0).
    #[arg(short, long, default_value_t = DEFAULT_ALPHA, allow_negative_numbers = true)]
    alpha: f32,

    /// Also save the estimated background plate to this path.
    #[arg(long)]
    background: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> MontageConfig {
        MontageConfig {
            blur_sigma: self.blur_sigma,
            threshold: self.threshold,
            alpha: self.alpha,
        }
    }
}

fn run(args: &Args) -> montage::Result<()> {
    let config = args.config();
    // Reject bad knobs before decoding anything.
    config.mask_params()?;

    log::info!("Loading {} images", args.inputs.len());
    let images = io::load_images(&args.inputs)?;

    let montage = build_montage(&images, &config)?;

    if let Some(path) = &args.background {
        log::info!("Saving background to {:?}", path);
        io::save_image(&montage.background, path)?;
    }

    log::info!("Saving montage to {:?}", args.output);
    io::save_image(&montage.image, &args.output)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["montage", "-o", "out.png", "a.jpg", "b.jpg"]).unwrap();

        assert_eq!(args.inputs, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.background, None);

        let config = args.config();
        assert_eq!(config.blur_sigma, 3.0);
        assert_eq!(config.threshold, 16);
        assert_eq!(config.alpha, 0.9);
        assert_eq!(config, MontageConfig::default());
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "montage", "-b", "1.5", "-t", "40", "-a", "0.5", "-o", "out.png", "x.png",
        ])
        .unwrap();

        assert_eq!(
            args.config(),
            MontageConfig {
                blur_sigma: 1.5,
                threshold: 40,
                alpha: 0.5,
            }
        );
    }

    #[test]
    fn test_negative_values_reach_validation() {
        let args =
            Args::try_parse_from(["montage", "-t", "-3", "-o", "out.png", "x.png"]).unwrap();
        assert_eq!(args.threshold, -3);
        assert!(args.config().mask_params().is_err());
    }

    #[test]
    fn test_requires_output_and_inputs() {
        assert!(Args::try_parse_from(["montage", "x.png"]).is_err());
        assert!(Args::try_parse_from(["montage", "-o", "out.png"]).is_err());
    }
}
