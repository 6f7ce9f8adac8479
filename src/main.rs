use clap::{Parser, Subcommand};
use std::path::PathBuf;

use meterscan::config::{AugmentConfig, PredictConfig};
use meterscan::{augment, cropper, CropReport, Predictor};

#[derive(Parser)]
#[command(name = "meterscan")]
#[command(about = "Read utility water meter photographs with a two-stage detection pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: locate meters, crop, locate digits
    Predict {
        /// Path to the JSON pipeline configuration
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
    /// Crop labelled regions out of a dataset directory
    Crop {
        /// Dataset root containing images/ and labels/
        #[arg(value_name = "INPUT_DIR")]
        input_dir: PathBuf,

        /// Output dataset root for the crops
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,
    },
    /// Expand a labelled dataset with rotation and brightness jitter
    Augment {
        /// Path to the JSON augmentation configuration
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        Command::Predict { config } => {
            let config = PredictConfig::from_file(&config)?;
            let output_dir = config.output_dir.clone();
            let report = Predictor::from_config(config)
                .with_verbose(args.verbose)
                .run()?;

            println!("\n=== Pipeline Results ===");
            println!("Meter labels produced: {}", report.meter_labels);
            print_crop_summary(&report.crop);
            println!("Digit labels produced: {}", report.digit_labels);
            println!("Annotated images kept: {}", report.annotated_images);
            println!("Final dataset saved in {}", output_dir.display());
        }
        Command::Crop {
            input_dir,
            output_dir,
        } => {
            let report = cropper::crop_dataset(
                &input_dir.join("images"),
                &input_dir.join("labels"),
                &output_dir,
            )?;

            println!("\n=== Cropping Results ===");
            print_crop_summary(&report);
            println!("Cropped data saved in {}", output_dir.display());
        }
        Command::Augment { config } => {
            let config = AugmentConfig::from_file(&config)?;
            let report = augment::augment_dataset(&config)?;

            println!("\n=== Augmentation Results ===");
            println!("Source images augmented: {}", report.images_augmented);
            println!("Variants written: {}", report.variants_written);
            if report.images_skipped_no_label > 0 {
                println!("Skipped (no label): {}", report.images_skipped_no_label);
            }
            if report.images_failed > 0 {
                println!("Skipped (unreadable): {}", report.images_failed);
            }
            println!(
                "Augmented data saved in {}",
                config.output_folder.display()
            );
        }
    }

    Ok(())
}

fn print_crop_summary(report: &CropReport) {
    println!(
        "Images cropped: {} ({} boxes)",
        report.images_processed, report.boxes_cropped
    );
    if report.images_skipped_no_label > 0 {
        println!("Skipped (no label): {}", report.images_skipped_no_label);
    }
    if report.labels_malformed > 0 {
        println!("Skipped (malformed label): {}", report.labels_malformed);
    }
    if report.images_failed > 0 {
        println!("Skipped (unreadable image): {}", report.images_failed);
    }
    if report.boxes_skipped_degenerate > 0 {
        println!(
            "Boxes skipped (degenerate): {}",
            report.boxes_skipped_degenerate
        );
    }
}
