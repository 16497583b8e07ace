use std::{collections::HashMap, io::BufRead, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;

/// Patient metadata shown in the report header table, read from the two
/// column tab separated `<sample>.txt` file supplied by the laboratory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: String,
    pub id: String,
    pub age: String,
    pub dob: String,
    pub dot: String,
    pub location: String,
}

pub fn read_patient_info(path: &Path) -> anyhow::Result<PatientInfo> {
    let rdr = CompressIo::new()
        .path(path)
        .bufreader()
        .with_context(|| format!("Error opening patient info file {}", path.display()))?;
    parse_patient_info(rdr)
        .with_context(|| format!("Error reading patient info file {}", path.display()))
}

fn parse_patient_info<R: BufRead>(rdr: R) -> anyhow::Result<PatientInfo> {
    let mut attrs = HashMap::new();
    for line in rdr.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once('\t') {
            Some((key, value)) => attrs.insert(key.trim().to_owned(), value.trim().to_owned()),
            None => return Err(anyhow!("expected two tab separated fields in '{}'", line)),
        };
    }

    Ok(PatientInfo {
        name: take_attr(&mut attrs, "Name")?,
        id: take_attr(&mut attrs, "ID")?,
        age: take_attr(&mut attrs, "Age")?,
        dob: take_attr(&mut attrs, "D.O.B")?,
        dot: take_attr(&mut attrs, "D.O.T")?,
        location: take_attr(&mut attrs, "Location")?,
    })
}

fn take_attr(attrs: &mut HashMap<String, String>, key: &str) -> anyhow::Result<String> {
    attrs
        .remove(key)
        .ok_or_else(|| anyhow!("missing required attribute '{}'", key))
}

#[cfg(test)]
mod test {
    use super::*;

    const INFO: &str = "\
Name\tJane Doe
ID\tNQ-0042
Age\t34
D.O.B\t12/03/1991
D.O.T\t05/06/2025
Location\tAl-khobar
";

    #[test]
    fn parses_patient_info() {
        let p = parse_patient_info(INFO.as_bytes()).unwrap();
        assert_eq!(
            p,
            PatientInfo {
                name: "Jane Doe".to_owned(),
                id: "NQ-0042".to_owned(),
                age: "34".to_owned(),
                dob: "12/03/1991".to_owned(),
                dot: "05/06/2025".to_owned(),
                location: "Al-khobar".to_owned(),
            }
        );
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let txt = format!("{}Physician\tDr. A\n", INFO);
        assert!(parse_patient_info(txt.as_bytes()).is_ok());
    }

    #[test]
    fn missing_attribute_is_named() {
        let txt = "Name\tJane Doe\nID\tNQ-0042\n";
        let err = parse_patient_info(txt.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Age"));
    }

    #[test]
    fn line_without_tab_is_an_error() {
        assert!(parse_patient_info("Name Jane\n".as_bytes()).is_err());
    }
}
