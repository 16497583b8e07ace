use std::{collections::HashMap, fs, io::BufRead, path::Path, process::Command};

use anyhow::Context;
use compress_io::compress::CompressIo;

use super::{config::Config, utils::run_command};

// Minimum acceptable sequencing yield and read quality
const MIN_READS: f64 = 10000.0;
const MIN_MEAN_QUAL: f64 = 10.0;

/// Summary statistics pulled from the NanoPlot output.  Metrics missing from
/// the statistics file count as zero.
#[derive(Debug, Clone, Copy)]
pub struct QcSummary {
    number_of_reads: f64,
    mean_qual: f64,
}

impl QcSummary {
    pub fn number_of_reads(&self) -> f64 {
        self.number_of_reads
    }
    pub fn mean_qual(&self) -> f64 {
        self.mean_qual
    }
    pub fn reads_ok(&self) -> bool {
        self.number_of_reads > MIN_READS
    }
    pub fn qual_ok(&self) -> bool {
        self.mean_qual > MIN_MEAN_QUAL
    }
}

/// Run NanoPlot on the basecalled reads and check the summary statistics
/// against the minimum read count and quality.  A failed check is reported
/// but does not stop the run.
pub fn quality_check(cfg: &Config) -> anyhow::Result<QcSummary> {
    info!("Running quality check on sample '{}'", cfg.sample_name());

    let qc_dir = cfg.nanoplot_dir();
    fs::create_dir_all(&qc_dir)
        .with_context(|| format!("Error creating QC output directory {}", qc_dir.display()))?;

    let mut cmd = Command::new("NanoPlot");
    cmd.arg("--fastq")
        .arg(cfg.fastq_file())
        .arg("--outdir")
        .arg(&qc_dir)
        .arg("--tsv_stats");
    run_command(&mut cmd, "NanoPlot")?;

    let summary = read_nanostats(&cfg.nanostats_file())?;
    debug!("{:?}", summary);

    if summary.reads_ok() {
        info!(
            "Number of reads ({}) is greater than {}",
            summary.number_of_reads(),
            MIN_READS
        );
    } else {
        warn!(
            "Number of reads ({}) is less than or equal to {}",
            summary.number_of_reads(),
            MIN_READS
        );
    }
    if summary.qual_ok() {
        info!(
            "Mean quality ({}) is greater than {}",
            summary.mean_qual(),
            MIN_MEAN_QUAL
        );
    } else {
        warn!(
            "Mean quality ({}) is less than or equal to {}",
            summary.mean_qual(),
            MIN_MEAN_QUAL
        );
    }

    info!("Quality check completed for sample '{}'", cfg.sample_name());
    Ok(summary)
}

fn read_nanostats(path: &Path) -> anyhow::Result<QcSummary> {
    let rdr = CompressIo::new()
        .path(path)
        .bufreader()
        .with_context(|| format!("Error opening NanoPlot statistics file {}", path.display()))?;
    parse_nanostats(rdr).with_context(|| format!("Error reading {}", path.display()))
}

// Keep only lines that split into exactly two tab separated fields; the
// statistics file mixes in headings and histogram blocks that do not.
fn parse_nanostats<R: BufRead>(rdr: R) -> anyhow::Result<QcSummary> {
    let mut metrics = HashMap::new();
    for line in rdr.lines() {
        let line = line?;
        let fields: Vec<_> = line.trim_end().split('\t').collect();
        if let [key, value] = fields.as_slice() {
            metrics.insert(key.to_string(), value.to_string());
        }
    }

    Ok(QcSummary {
        number_of_reads: get_metric(&metrics, "number_of_reads")?,
        mean_qual: get_metric(&metrics, "mean_qual")?,
    })
}

fn get_metric(metrics: &HashMap<String, String>, key: &str) -> anyhow::Result<f64> {
    match metrics.get(key) {
        Some(v) => v
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Bad value '{}' for statistic {}", v, key)),
        None => Ok(0.0),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const STATS: &str = "\
General summary:
mean_qual\t12.6
mean_read_length\t2318.2
number_of_reads\t22345.0
n50\t4526.0
top5_longest_reads\t1\t28403
";

    #[test]
    fn parses_two_field_lines_only() {
        let s = parse_nanostats(STATS.as_bytes()).unwrap();
        assert_eq!(s.number_of_reads(), 22345.0);
        assert_eq!(s.mean_qual(), 12.6);
    }

    #[test]
    fn missing_metrics_default_to_zero() {
        let s = parse_nanostats("mean_qual\t9.1\n".as_bytes()).unwrap();
        assert_eq!(s.number_of_reads(), 0.0);
        assert!(!s.reads_ok());
    }

    #[test]
    fn bad_metric_value_is_an_error() {
        assert!(parse_nanostats("number_of_reads\tlots\n".as_bytes()).is_err());
    }

    #[test]
    fn thresholds_are_strict() {
        let s = QcSummary {
            number_of_reads: 10000.0,
            mean_qual: 10.0,
        };
        assert!(!s.reads_ok());
        assert!(!s.qual_ok());

        let s = QcSummary {
            number_of_reads: 10001.0,
            mean_qual: 10.1,
        };
        assert!(s.reads_ok());
        assert!(s.qual_ok());
    }
}
