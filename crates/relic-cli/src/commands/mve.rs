use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use relic_video::{Decoder, Frame, PlaybackConfig, Player};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::output::render_json;
use crate::{MveCommands, OutputFormat};

pub async fn handle(cmd: MveCommands, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        MveCommands::Info { file } => show_info(&file, format),
        MveCommands::Frames {
            file,
            outdir,
            realtime,
        } => frames(&file, &outdir, realtime).await,
    }
}

fn open(file: &Path) -> anyhow::Result<Decoder> {
    let data = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    Decoder::new(data).with_context(|| format!("{} is not a movie", file.display()))
}

/// Write `frame` as an 8-bit RGB PNG
pub fn write_png(frame: &Frame, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        u32::try_from(frame.width())?,
        u32::try_from(frame.height())?,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(frame.pixels())?;
    writer.finish()?;
    Ok(())
}

fn show_info(file: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let mut decoder = open(file)?;
    let mut frames = 0usize;
    let mut error = None;
    loop {
        match decoder.next_frame() {
            Ok(Some(_)) => frames += 1,
            Ok(None) => break,
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }
    let size = decoder.frame_size();
    let movie = decoder.movie_info();

    if format == OutputFormat::Text {
        if let Some((width, height)) = size {
            println!("Frame size:  {width}x{height}");
        }
        if let Some(movie) = movie {
            println!("Movie size:  {}x{}", movie.width, movie.height);
        }
        println!("Frame delay: {:?}", decoder.delay());
        println!("Frames:      {frames}");
        if let Some(e) = &error {
            println!("Stopped at:  {e}");
        }
        return Ok(());
    }

    let value = json!({
        "frame_size": size.map(|(w, h)| json!({ "width": w, "height": h })),
        "movie_size": movie.map(|m| json!({ "width": m.width, "height": m.height })),
        "delay_ms": u64::try_from(decoder.delay().as_millis()).unwrap_or(u64::MAX),
        "frames": frames,
        "error": error.map(|e| e.to_string()),
    });
    if let Some(text) = render_json(&value, format)? {
        println!("{text}");
    }
    Ok(())
}

async fn frames(file: &Path, outdir: &Path, realtime: bool) -> anyhow::Result<()> {
    let decoder = open(file)?;
    fs::create_dir_all(outdir).with_context(|| format!("failed to create {}", outdir.display()))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut player = Player::new(PlaybackConfig::default().with_realtime(realtime));
    player.play(decoder, tx);

    let mut written = 0usize;
    loop {
        tokio::select! {
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                let path = outdir.join(format!("frame_{written:05}.png"));
                write_png(&frame, &path)?;
                written += 1;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping playback");
                player.stop();
                // Drain frames published before the stop took effect
                while let Some(frame) = rx.recv().await {
                    write_png(&frame, &outdir.join(format!("frame_{written:05}.png")))?;
                    written += 1;
                }
                break;
            }
        }
    }

    if let Some(summary) = player.wait().await
        && let Some(e) = summary.error
    {
        warn!("Movie ended early: {}", e);
    }
    info!("Wrote {} frames to {}", written, outdir.display());
    Ok(())
}
