use anyhow::{Context, Result};
use clap::Parser;

use synthseg_bids::{logging, FlagConfig, SegmentationPipeline, SystemProcessRunner};

fn main() -> Result<()> {
    let config = FlagConfig::parse();
    logging::init();

    let request = config
        .request()
        .context("Please specify the type of scans you would like to process (--t1w, --t2w, --flair or --mprage) and try again")?;
    let settings = config.settings();
    let runner = SystemProcessRunner::new().with_timeout(settings.timeout);

    let summary = SegmentationPipeline::new(runner, settings)
        .run(&request)
        .with_context(|| format!("SynthSeg run for {} aborted", request.participant))?;
    println!("{summary}");

    Ok(())
}
