use super::{basecall, classify, config::Config, qc, report};

/// Run the pipeline stages in sequence.  Each stage reads its input from the
/// files left in the output directory by the stage before it, and any stage
/// failure aborts the run.
pub fn run(cfg: &Config) -> anyhow::Result<()> {
    debug!("Output directory: {}", cfg.output_dir().display());

    basecall::basecall(cfg)?;
    qc::quality_check(cfg)?;
    classify::search_db(cfg)?;
    report::generate_report(cfg)?;
    align(cfg)?;

    info!(
        "Pipeline completed successfully for sample '{}'",
        cfg.sample_name()
    );
    Ok(())
}

// Placeholder stage.
// TODO align the basecalled reads against the reference set with minimap2
fn align(cfg: &Config) -> anyhow::Result<()> {
    debug!(
        "Alignment not implemented; skipping for sample '{}'",
        cfg.sample_name()
    );
    Ok(())
}
