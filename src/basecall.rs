use std::{fs, process::Command};

use anyhow::Context;

use super::{config::Config, utils::run_command_stdout_to};

/// Basecall the raw pod5 signal data with dorado.  The FASTQ emitted on
/// stdout is collected into the per-sample basecalled file.
pub fn basecall(cfg: &Config) -> anyhow::Result<()> {
    info!(
        "Running basecall on sample '{}' with accuracy '{}'",
        cfg.sample_name(),
        cfg.accuracy()
    );

    let fastq = cfg.fastq_file();
    let mut cmd = Command::new(cfg.dorado_bin());
    cmd.arg("basecaller")
        .arg("--emit-fastq")
        .arg(cfg.accuracy().to_string())
        .arg(cfg.pod5_dir());

    run_command_stdout_to(&mut cmd, &fastq, "dorado basecaller")?;

    // An empty FASTQ is useless to the downstream tools
    let meta = fs::metadata(&fastq)
        .with_context(|| format!("Error checking basecall output {}", fastq.display()))?;
    if meta.len() == 0 {
        return Err(anyhow!(
            "Basecalling produced no reads in {}",
            fastq.display()
        ));
    }

    info!(
        "Basecalling completed for sample '{}'; output saved to {}",
        cfg.sample_name(),
        fastq.display()
    );
    Ok(())
}
