use anyhow::{Context, Result};
use clap::Parser;

use synthseg_bids::{logging, SegmentationPipeline, SystemProcessRunner, ValueConfig};

fn main() -> Result<()> {
    let config = ValueConfig::parse();
    logging::init();

    let request = config.request();
    let settings = config.settings();
    let runner = SystemProcessRunner::new().with_timeout(settings.timeout);

    let summary = SegmentationPipeline::new(runner, settings)
        .run(&request)
        .with_context(|| format!("SynthSeg run for {} aborted", request.participant))?;
    println!("{summary}");

    Ok(())
}
