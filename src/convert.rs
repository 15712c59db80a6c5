//! Batch re-encoding of voice recordings through ffmpeg.
//!
//! Scans a directory tree for `.m4a`/`.aifc` files and re-encodes each one as
//! mono AAC at a voice-friendly sample rate and bitrate, mirroring the input
//! directory structure under the output directory. The input root is threaded
//! through explicitly wherever relative paths are computed; there is no
//! process-wide state.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Input extensions the scanner picks up (case-insensitive).
pub const SUPPORTED_INPUT_EXTS: &[&str] = &["m4a", "aifc"];

pub const DEFAULT_BITRATE: &str = "32k";
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Settings for one conversion batch.
#[derive(Debug, Clone)]
pub struct ConvertOpts {
    /// Target bitrate, e.g. `"24k"`, `"32k"`, `"48k"`.
    pub bitrate: String,

    /// Target sample rate in Hz.
    pub samplerate: u32,

    /// Write `<stem>.m4a` instead of `<stem>_compressed.m4a` for `.m4a` inputs.
    pub overwrite: bool,

    /// Extra arguments passed straight through to ffmpeg.
    pub extra_ffmpeg_args: Vec<String>,
}

impl Default for ConvertOpts {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE.to_owned(),
            samplerate: DEFAULT_SAMPLE_RATE,
            overwrite: false,
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

/// Fail fast when ffmpeg is not installed, before any file is touched.
pub fn ensure_ffmpeg() -> Result<()> {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(Error::DependencyMissing(
            "ffmpeg is required but was not found in PATH".into(),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Recursively collect supported input files under `root`, in a stable order.
pub fn scan_inputs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry
            .map_err(|err| Error::msg(format!("failed to scan {}: {err}", root.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .is_some_and(|ext| SUPPORTED_INPUT_EXTS.iter().any(|s| ext.eq_ignore_ascii_case(s)));
        if supported {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Compute the destination for one source file.
///
/// - `.aifc` inputs convert to `<stem>.m4a`.
/// - `.m4a` inputs keep their extension and gain a `_compressed` suffix,
///   unless `overwrite` requests the plain stem.
/// - The path relative to `root` is preserved under `outdir`.
pub fn build_output_path(
    src: &Path,
    root: &Path,
    outdir: &Path,
    overwrite: bool,
) -> Result<PathBuf> {
    let rel = src.strip_prefix(root).map_err(|_| {
        Error::Config(format!(
            "{} is not under the input directory {}",
            src.display(),
            root.display()
        ))
    })?;

    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let is_aifc = rel
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("aifc"));

    let target_name = if is_aifc || overwrite {
        format!("{stem}.m4a")
    } else {
        format!("{stem}_compressed.m4a")
    };

    Ok(match rel.parent() {
        Some(parent) if parent != Path::new("") => outdir.join(parent).join(target_name),
        _ => outdir.join(target_name),
    })
}

/// Whether a source should be skipped because its destination already exists.
///
/// A dry run never skips: it reports the command for every scanned file so
/// the full batch can be previewed.
pub fn should_skip(dst: &Path, dry_run: bool) -> bool {
    dst.exists() && !dry_run
}

/// Build the ffmpeg argument list for one conversion.
///
/// Mono, fixed sample rate, AAC at the target bitrate, `+faststart` for
/// better streaming startup, and source metadata carried over.
pub fn ffmpeg_args(src: &Path, dst: &Path, opts: &ConvertOpts) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        src.to_string_lossy().into_owned(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        opts.samplerate.to_string(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        opts.bitrate.clone(),
        "-movflags".into(),
        "+faststart".into(),
        "-map_metadata".into(),
        "0".into(),
        "-y".into(),
    ];
    args.extend(opts.extra_ffmpeg_args.iter().cloned());
    args.push(dst.to_string_lossy().into_owned());
    args
}

/// Re-encode one file. The destination's parent directories are created as
/// needed; a nonzero ffmpeg exit is an error the caller may tally rather
/// than abort on.
pub fn compress_file(src: &Path, dst: &Path, opts: &ConvertOpts) -> Result<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let args = ffmpeg_args(src, dst, opts);
    debug!(src = %src.display(), dst = %dst.display(), "running ffmpeg");

    let status = Command::new("ffmpeg")
        .args(&args)
        .status()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::DependencyMissing(
                    "ffmpeg is required but was not found in PATH".into(),
                )
            } else {
                Error::Io(err)
            }
        })?;

    if !status.success() {
        return Err(Error::msg(format!(
            "ffmpeg failed for {} (exit {})",
            src.display(),
            status.code().map_or_else(|| "signal".into(), |c| c.to_string())
        )));
    }

    Ok(())
}
