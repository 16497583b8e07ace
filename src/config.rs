use std::{
    fmt,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
};

use regex::Regex;

use super::{cli::cli_model, utils::init_log};

/// Basecalling model accuracy, passed through to dorado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Fast,
    Hac,
    Sup,
}

impl FromStr for Accuracy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "hac" => Ok(Self::Hac),
            "sup" => Ok(Self::Sup),
            _ => Err(anyhow!(
                "unknown accuracy '{}' (expected fast, hac or sup)",
                s
            )),
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fast => "fast",
            Self::Hac => "hac",
            Self::Sup => "sup",
        })
    }
}

#[derive(Debug)]
pub struct Config {
    // Sample name - keys the fixed naming scheme for all per-sample files
    sample_name: String,
    // Directory with the raw pod5 signal files
    pod5_dir: PathBuf,
    // Directory where all output files are written
    output_dir: PathBuf,
    accuracy: Accuracy,
    // External tool locations
    dorado_bin: PathBuf,
    kraken_db: PathBuf,
    logo_file: PathBuf,
    // General options:
    threads: usize,
}

impl Config {
    pub fn sample_name(&self) -> &str {
        &self.sample_name
    }
    pub fn pod5_dir(&self) -> &Path {
        self.pod5_dir.as_path()
    }
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_path()
    }
    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }
    pub fn dorado_bin(&self) -> &Path {
        self.dorado_bin.as_path()
    }
    pub fn kraken_db(&self) -> &Path {
        self.kraken_db.as_path()
    }
    pub fn logo_file(&self) -> &Path {
        self.logo_file.as_path()
    }
    pub fn threads(&self) -> usize {
        self.threads
    }

    // Per-sample file naming scheme.  Every stage derives its file locations
    // from here so that they agree on the layout.
    pub fn fastq_file(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_basecalled.fastq", self.sample_name))
    }
    pub fn nanoplot_dir(&self) -> PathBuf {
        self.output_dir.join("NanoPlot_output")
    }
    pub fn nanostats_file(&self) -> PathBuf {
        self.nanoplot_dir().join("NanoStats.txt")
    }
    pub fn kraken_report_file(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_kraken_report.txt", self.sample_name))
    }
    pub fn kraken_assignments_file(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_kraken_output.txt", self.sample_name))
    }
    pub fn patient_info_file(&self) -> PathBuf {
        self.output_dir.join(format!("{}.txt", self.sample_name))
    }
    pub fn report_pdf_file(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_kraken_report.pdf", self.sample_name))
    }
}

// The sample name is spliced into file names, so keep it to a safe alphabet
fn check_sample_name(name: &str) -> anyhow::Result<()> {
    let re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
    if re.is_match(name) {
        Ok(())
    } else {
        Err(anyhow!(
            "invalid sample name '{}' (allowed: letters, digits, '.', '_' and '-')",
            name
        ))
    }
}

fn check_dir(path: &Path, desc: &str) -> anyhow::Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} '{}' does not exist or is not a directory",
            desc,
            path.display()
        ))
    }
}

pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m);

    debug!("Processing command line options");

    let sample_name = m
        .get_one::<String>("sample")
        .expect("Missing sample name")
        .to_owned();
    check_sample_name(&sample_name)?;

    let pod5_dir = m
        .get_one::<PathBuf>("pod5")
        .expect("Missing pod5 directory")
        .to_owned();
    check_dir(&pod5_dir, "pod5 path")?;

    let output_dir = m
        .get_one::<PathBuf>("output_dir")
        .expect("Missing output directory")
        .to_owned();
    check_dir(&output_dir, "output path")?;

    let accuracy = *m
        .get_one::<Accuracy>("accuracy")
        .expect("Missing default accuracy");

    let dorado_bin = m
        .get_one::<PathBuf>("dorado")
        .expect("Missing default dorado path")
        .to_owned();

    let kraken_db = m
        .get_one::<PathBuf>("kraken_db")
        .expect("Missing default kraken database")
        .to_owned();

    let logo_file = m
        .get_one::<PathBuf>("logo")
        .expect("Missing default logo path")
        .to_owned();

    // Threads option should be non-zero.  If not set, set to number of available CPUs
    let threads = m
        .get_one::<NonZeroUsize>("threads")
        .map(|i| usize::from(*i))
        .unwrap_or_else(num_cpus::get);

    Ok(Config {
        sample_name,
        pod5_dir,
        output_dir,
        accuracy,
        dorado_bin,
        kraken_db,
        logo_file,
        threads,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accuracy_from_str() {
        assert_eq!("fast".parse::<Accuracy>().unwrap(), Accuracy::Fast);
        assert_eq!("HAC".parse::<Accuracy>().unwrap(), Accuracy::Hac);
        assert_eq!("sup".parse::<Accuracy>().unwrap(), Accuracy::Sup);
        assert!("best".parse::<Accuracy>().is_err());
    }

    #[test]
    fn accuracy_display_round_trip() {
        for acc in [Accuracy::Fast, Accuracy::Hac, Accuracy::Sup] {
            assert_eq!(acc.to_string().parse::<Accuracy>().unwrap(), acc);
        }
    }

    #[test]
    fn sample_names() {
        for name in ["barcode01", "S1.2-a_ok", "7d"] {
            assert!(check_sample_name(name).is_ok(), "{}", name);
        }
        for name in ["", "bad/name", "-leading", ".hidden", "a b"] {
            assert!(check_sample_name(name).is_err(), "{}", name);
        }
    }
}
