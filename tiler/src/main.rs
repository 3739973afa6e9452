use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::{info, warn};
use nanofiche::entities::Instance;
use nanofiche::io::ext_repr::{ExtInstance, ExtSearchReport};
use nanofiche::io::svg::result_to_svg;
use thousands::Separable;
use tiler::config::TilerConfig;
use tiler::io::cli::Cli;
use tiler::io::output::PackOutput;
use tiler::opt::orchestrator::{PackingOrchestrator, PackingPlan};
use tiler::{EPOCH, io};

fn main() -> Result<()> {
    let args = Cli::parse();
    io::init_logger(args.log_level)?;

    let config = match args.config_file {
        None => {
            warn!("[MAIN] No config file provided, use --config-file to provide a custom config");
            TilerConfig::default()
        }
        Some(config_file) => {
            let file = File::open(config_file)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).context("incorrect config file format")?
        }
    };

    info!("[MAIN] Successfully parsed TilerConfig: {config:?}");

    let input_stem = args
        .input_file
        .file_stem()
        .and_then(|s| s.to_str())
        .context("input file has no valid name")?
        .to_owned();

    fs::create_dir_all(&args.solution_folder).with_context(|| {
        format!(
            "could not create solution folder: {}",
            args.solution_folder.display()
        )
    })?;

    let ext_instance = io::read_instance(args.input_file.as_path())?;
    let instance = nanofiche::io::import(&ext_instance)?;

    let orchestrator = PackingOrchestrator::new(config);
    let plan = orchestrator.plan(&instance)?;

    match plan.requires_batching(&config.batching) {
        true => stream_tiles(&plan, &instance, &config, &input_stem, &args.solution_folder),
        false => write_solution(plan, &ext_instance, &instance, config, &input_stem, args.solution_folder),
    }
}

/// Writes the tiles of a layout too large to hold in memory as a JSON-lines stream.
fn stream_tiles(
    plan: &PackingPlan<'_>,
    instance: &Instance,
    config: &TilerConfig,
    input_stem: &str,
    output_folder: &Path,
) -> Result<()> {
    info!(
        "[MAIN] rendered layout needs {} bytes, streaming {} tiles in batches of {}",
        plan.rendered_bytes(config.batching.bytes_per_pixel)
            .separate_with_commas(),
        plan.n_tiles().separate_with_commas(),
        config.batching.batch_size
    );
    let sources = instance
        .items
        .iter()
        .map(|i| (i.seq, i.source.as_str()))
        .collect::<HashMap<_, _>>();

    let path = output_folder.join(format!("tiles_{input_stem}.jsonl"));
    io::write_tile_batches(
        plan.batches(config.batching.batch_size),
        |seq| sources.get(&seq).copied().unwrap_or_default().to_string(),
        &path,
    )?;

    let envelope = plan.envelope();
    info!(
        "[MAIN] {:?} envelope: {}x{}",
        envelope.shape, envelope.width, envelope.height
    );
    Ok(())
}

fn write_solution(
    plan: PackingPlan<'_>,
    ext_instance: &ExtInstance,
    instance: &Instance,
    config: TilerConfig,
    input_stem: &str,
    output_folder: PathBuf,
) -> Result<()> {
    let search = plan.search_report();
    let result = plan.into_result();

    {
        let mut solution = nanofiche::io::export(instance, &result, *EPOCH);
        solution.search = search.map(|r| ExtSearchReport {
            iterations: r.iterations,
            lower_bound: r.lower_bound,
            upper_bound: r.upper_bound,
            bisection_result: r.bisection_result,
            monotonicity_violations: r.monotonicity_violations,
        });
        let output = PackOutput {
            instance: ext_instance.clone(),
            solution,
            config,
        };
        let solution_path = output_folder.join(format!("sol_{input_stem}.json"));
        io::write_json(&output, &solution_path)?;
    }

    {
        let svg_path = output_folder.join(format!("sol_{input_stem}.svg"));
        let svg = result_to_svg(&result, config.svg_draw_options, &ext_instance.name);
        io::write_svg(&svg, &svg_path)?;
    }

    Ok(())
}
