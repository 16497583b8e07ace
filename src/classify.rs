use std::{cmp::Ordering, io::BufRead, path::Path, process::Command};

use anyhow::Context;
use compress_io::compress::CompressIo;

use super::{config::Config, utils::run_command};

// Confident hits are genus level assignments above this share of the reads
const CONFIDENT_RANK: &str = "G";
const MIN_PCT: f64 = 1.0;

/// One row of the kraken2 report: the share of reads and read counts for a
/// clade, its rank code, NCBI taxid and (indented) scientific name.
#[derive(Debug, Clone)]
pub struct TaxonCount {
    pub pct: f64,
    pub clade_reads: u64,
    pub direct_reads: u64,
    pub rank: String,
    pub tax_id: u32,
    pub name: String,
}

/// Classify the basecalled reads against the configured kraken2 database.
/// The per-clade report and the per-read assignments are left in the output
/// directory for the report stage.
pub fn search_db(cfg: &Config) -> anyhow::Result<()> {
    info!(
        "Running database search on sample '{}' using kraken2",
        cfg.sample_name()
    );

    let report = cfg.kraken_report_file();
    let mut cmd = Command::new("kraken2");
    cmd.arg("--db")
        .arg(cfg.kraken_db())
        .arg("--threads")
        .arg(cfg.threads().to_string())
        .arg("--report")
        .arg(&report)
        .arg("--use-names")
        .arg("--output")
        .arg(cfg.kraken_assignments_file())
        .arg(cfg.fastq_file());
    run_command(&mut cmd, "kraken2")?;

    if !report.is_file() {
        return Err(anyhow!(
            "kraken2 did not produce the report file {}",
            report.display()
        ));
    }

    info!(
        "Database search completed successfully for sample '{}'",
        cfg.sample_name()
    );
    Ok(())
}

pub fn read_report(path: &Path) -> anyhow::Result<Vec<TaxonCount>> {
    let rdr = CompressIo::new()
        .path(path)
        .bufreader()
        .with_context(|| format!("Error opening kraken2 report {}", path.display()))?;
    parse_report(rdr).with_context(|| format!("Error reading kraken2 report {}", path.display()))
}

fn parse_report<R: BufRead>(rdr: R) -> anyhow::Result<Vec<TaxonCount>> {
    let mut recs = Vec::new();
    for (ix, line) in rdr.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        recs.push(parse_report_line(&line).with_context(|| format!("line {}", ix + 1))?);
    }
    Ok(recs)
}

fn parse_report_line(line: &str) -> anyhow::Result<TaxonCount> {
    let fields: Vec<_> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(anyhow!(
            "expected six tab separated fields, found {}",
            fields.len()
        ));
    }
    Ok(TaxonCount {
        pct: fields[0]
            .trim()
            .parse()
            .with_context(|| format!("bad percentage '{}'", fields[0]))?,
        clade_reads: fields[1]
            .trim()
            .parse()
            .with_context(|| format!("bad clade read count '{}'", fields[1]))?,
        direct_reads: fields[2]
            .trim()
            .parse()
            .with_context(|| format!("bad read count '{}'", fields[2]))?,
        rank: fields[3].trim().to_owned(),
        tax_id: fields[4]
            .trim()
            .parse()
            .with_context(|| format!("bad taxid '{}'", fields[4]))?,
        name: fields[5].to_owned(),
    })
}

/// Filter to the genus level entries above the reporting threshold, sorted
/// by share of reads in descending order.
pub fn confident_hits(mut recs: Vec<TaxonCount>) -> Vec<TaxonCount> {
    recs.retain(|r| r.rank == CONFIDENT_RANK && r.pct > MIN_PCT);
    recs.sort_by(|a, b| b.pct.partial_cmp(&a.pct).unwrap_or(Ordering::Equal));
    recs
}

#[cfg(test)]
mod test {
    use super::*;

    const REPORT: &str = "\
 90.25\t36489\t36489\tU\t0\tunclassified
  9.75\t3941\t120\tR\t1\troot
  8.20\t3315\t0\tD\t2759\t  Eukaryota
  7.80\t3154\t210\tG\t5658\t    Leishmania
  4.10\t1658\t1658\tS\t5661\t      Leishmania donovani
  0.80\t323\t323\tG\t5690\t    Trypanosoma
";

    #[test]
    fn parses_report_rows() {
        let recs = parse_report(REPORT.as_bytes()).unwrap();
        assert_eq!(recs.len(), 6);
        let g = &recs[3];
        assert_eq!(g.rank, "G");
        assert_eq!(g.tax_id, 5658);
        assert_eq!(g.clade_reads, 3154);
        assert_eq!(g.direct_reads, 210);
        assert_eq!(g.name.trim(), "Leishmania");
    }

    #[test]
    fn skips_blank_lines() {
        let recs = parse_report("\n 1.00\t5\t5\tU\t0\tunclassified\n\n".as_bytes()).unwrap();
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn rejects_short_rows() {
        let err = parse_report(" 1.00\t5\t5\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(parse_report(" pct\t5\t5\tU\t0\tunclassified\n".as_bytes()).is_err());
    }

    #[test]
    fn selects_confident_genus_hits() {
        let recs = parse_report(REPORT.as_bytes()).unwrap();
        let hits = confident_hits(recs);
        // Trypanosoma is below 1% and the other rows are not genus level
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name.trim(), "Leishmania");
    }

    #[test]
    fn hits_sorted_by_share() {
        let tc = |pct, rank: &str| TaxonCount {
            pct,
            clade_reads: 10,
            direct_reads: 10,
            rank: rank.to_owned(),
            tax_id: 1,
            name: "x".to_owned(),
        };
        let hits = confident_hits(vec![tc(1.5, "G"), tc(3.0, "G"), tc(2.0, "G"), tc(5.0, "S")]);
        let pcts: Vec<f64> = hits.iter().map(|h| h.pct).collect();
        assert_eq!(pcts, [3.0, 2.0, 1.5]);
    }
}
