// Batch-compress voice recordings (.m4a, .aifc) in a directory tree through
// ffmpeg, mirroring the structure under an output directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use longform::convert::{
    ConvertOpts, DEFAULT_BITRATE, DEFAULT_SAMPLE_RATE, build_output_path, compress_file,
    ensure_ffmpeg, ffmpeg_args, scan_inputs, should_skip,
};
use longform::error::Error;

#[derive(Parser, Debug)]
#[command(name = "compress-audio")]
#[command(about = "Compress voice audio in a folder (.aifc, .m4a) using ffmpeg (AAC)")]
struct Args {
    /// Folder to scan (recursively) for audio files.
    input_dir: PathBuf,

    /// Where to write compressed files. Defaults to '<input_dir>/compressed'.
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Audio bitrate (e.g. 24k, 32k, 48k).
    #[arg(long, default_value = DEFAULT_BITRATE)]
    bitrate: String,

    /// Sample rate in Hz (e.g. 16000, 24000, 32000).
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    samplerate: u32,

    /// Overwrite original file names (writes .m4a with the same base name).
    #[arg(long)]
    overwrite: bool,

    /// Show what would be done without writing files.
    #[arg(long)]
    dry_run: bool,

    /// Exit nonzero when any file fails to convert. Without this flag the
    /// process exits 0 and only reports the failure count, matching the
    /// historical behavior.
    #[arg(long)]
    fail_on_error: bool,

    /// Anything after this flag is passed straight to ffmpeg (advanced use).
    #[arg(long = "extra-ffmpeg-args", num_args = 0.., allow_hyphen_values = true)]
    extra_ffmpeg_args: Vec<String>,
}

fn main() {
    longform::logging::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            println!("{err}");
            std::process::exit(1);
        }
    };

    match run(&args) {
        Ok(failures) if failures > 0 && args.fail_on_error => std::process::exit(1),
        Ok(_) => {}
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Run the batch and return the per-file failure count.
fn run(args: &Args) -> Result<usize> {
    let root = &args.input_dir;
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "input directory does not exist or is not a directory: {}",
            root.display()
        ))
        .into());
    }

    ensure_ffmpeg()?;

    let outdir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| root.join("compressed"));

    let inputs = scan_inputs(root)?;
    if inputs.is_empty() {
        println!("No .aifc or .m4a files found under: {}", root.display());
        return Ok(0);
    }

    println!(
        "Found {} input file(s). Output dir: {}",
        inputs.len(),
        outdir.display()
    );

    let opts = ConvertOpts {
        bitrate: args.bitrate.clone(),
        samplerate: args.samplerate,
        overwrite: args.overwrite,
        extra_ffmpeg_args: args.extra_ffmpeg_args.clone(),
    };

    let mut failures = 0;
    for src in &inputs {
        let dst = build_output_path(src, root, &outdir, args.overwrite)?;

        if should_skip(&dst, args.dry_run) {
            println!("Skipping (already exists): {}", dst.display());
            continue;
        }

        if args.dry_run {
            let cmd = ffmpeg_args(src, &dst, &opts).join(" ");
            println!("[DRY RUN] Would run: ffmpeg {cmd}");
            continue;
        }

        println!("Compressing: {}  ->  {}", src.display(), dst.display());
        match compress_file(src, &dst, &opts) {
            Ok(()) => println!("  Done: {}", dst.display()),
            // A missing ffmpeg is fatal; a bad input file is tallied and
            // the remaining files still get their chance.
            Err(err @ Error::DependencyMissing(_)) => return Err(err.into()),
            Err(err) => {
                println!("  ffmpeg failed for: {} ({err})", src.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        println!("\nCompleted with {failures} failure(s).");
    } else {
        println!("\nAll files processed successfully.");
    }

    Ok(failures)
}
