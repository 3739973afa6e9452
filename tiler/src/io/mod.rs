use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{Level, LevelFilter, info, log};
use nanofiche::entities::Tile;
use nanofiche::io::ext_repr::{ExtInstance, ExtTile};
use serde::Serialize;
use svg::Document;

use crate::EPOCH;

pub mod cli;
pub mod output;

pub fn read_instance(path: &Path) -> Result<ExtInstance> {
    let file = File::open(path).context("could not open instance file")?;
    serde_json::from_reader(BufReader::new(file)).context("not a valid instance file")
}

pub fn write_json(json: &impl Serialize, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, json)?;
    info!("[IO] json written to file://{}", fs::canonicalize(path)?.to_str().unwrap_or("?"));
    Ok(())
}

pub fn write_svg(document: &Document, path: &Path) -> Result<()> {
    svg::save(path, document)?;
    info!("[IO] svg written to file://{}", fs::canonicalize(path)?.to_str().unwrap_or("?"));
    Ok(())
}

/// Writes tiles as JSON lines, one batch at a time.
pub fn write_tile_batches(
    batches: impl Iterator<Item = Vec<Tile>>,
    source_of: impl Fn(usize) -> String,
    path: &Path,
) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut n_written = 0;
    for batch in batches {
        for tile in &batch {
            let ext_tile = ExtTile {
                index: tile.seq,
                source: source_of(tile.seq),
                x: tile.x,
                y: tile.y,
            };
            serde_json::to_writer(&mut writer, &ext_tile)?;
            writer.write_all(b"\n")?;
        }
        n_written += batch.len();
        writer.flush()?;
    }
    info!("[IO] {n_written} tiles streamed to file://{}", fs::canonicalize(path)?.to_str().unwrap_or("?"));
    Ok(n_written)
}

pub fn init_logger(level_filter: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        // Perform allocation-free log formatting
        .format(|out, message, record| {
            let handle = std::thread::current();
            let thread_name = handle.name().unwrap_or("-");

            let duration = EPOCH.elapsed();
            let sec = duration.as_secs() % 60;
            let min = (duration.as_secs() / 60) % 60;
            let hours = (duration.as_secs() / 60) / 60;

            let prefix = format!(
                "[{}] [{:0>2}:{:0>2}:{:0>2}] <{}>",
                record.level(),
                hours,
                min,
                sec,
                thread_name,
            );

            out.finish(format_args!("{prefix:<27}{message}"))
        })
        // Add blanket level filter -
        .level(level_filter)
        .chain(std::io::stdout())
        .apply()?;
    log!(Level::Info, "[EPOCH]: {}", jiff::Timestamp::now());
    Ok(())
}
