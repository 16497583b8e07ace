use std::{fs::File, io::BufWriter, path::Path};

use anyhow::Context;
use printpdf::{
    path::PaintMode, BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
};

use super::{
    classify::{confident_hits, read_report, TaxonCount},
    config::Config,
    patient::{read_patient_info, PatientInfo},
};

// Page geometry (mm, A4)
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;

// Logo box in the header, 1.5in x 0.5in
const LOGO_WIDTH: f32 = 38.1;
const LOGO_HEIGHT: f32 = 12.7;

const ROW_HEIGHT: f32 = 7.0;
const CELL_PAD: f32 = 1.5;
const MM_PER_PT: f32 = 0.352_778;

const HEADER_FILL: (f32, f32, f32) = (0.5, 0.5, 0.5);
const HEADER_TEXT: (f32, f32, f32) = (0.96, 0.96, 0.96);
const BODY_FILL: (f32, f32, f32) = (0.96, 0.96, 0.86);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

const LAB_ADDRESS: [&str; 2] = ["Laboratory of Nuqta Genomics", "Al-khobar, Saudi Arabia"];

const PATIENT_HEADER: [&str; 6] = ["Name", "ID", "Age", "D.O.B", "D.O.T", "Location"];
const PATIENT_COLS: [f32; 6] = [30.0, 30.0, 30.0, 30.0, 30.0, 30.0];

const HITS_HEADER: [&str; 4] = ["% Reads", "Reads", "Taxon", "Taxonomy"];
const HITS_COLS: [f32; 4] = [30.0, 30.0, 30.0, 90.0];

// The summary paragraph never sits higher than this on the page
const SUMMARY_TOP: f32 = 95.0;
const SUMMARY_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 4.2;
const WRAP_COLS: usize = 105;

const SUMMARY_TITLE: &str = "Summary of Analysis:";
const SUMMARY_TEXT: [&str; 8] = [
    "This report details the most confident taxonomic classifications based on the Kraken2 \
     analysis of the basecalled reads. The analysis was conducted using a reference database \
     specific to Leishmania species. The quality of the sequencing data was verified using \
     NanoPlot, and the experiment proceeded only after verifying sufficient read count and \
     quality.",
    "",
    "The key steps in this analysis included:",
    "1. Basecalling using high accuracy.",
    "2. Quality check to ensure read quality and quantity.",
    "3. Taxonomic classification using Kraken2.",
    "",
    "This report highlights the significant taxonomic hits with a confidence greater than 1% \
     of the total reads.",
];

/// Render the per-sample PDF report from the kraken2 report and the patient
/// metadata file left in the output directory.
pub fn generate_report(cfg: &Config) -> anyhow::Result<()> {
    info!("Generating PDF report for sample '{}'", cfg.sample_name());

    let report_file = cfg.kraken_report_file();
    let hits = confident_hits(read_report(&report_file)?);
    match hits.first() {
        Some(top) => debug!(
            "Top hit {} (taxid {}): {:.2}% of reads, {} assigned directly",
            top.name.trim(),
            top.tax_id,
            top.pct,
            top.direct_reads
        ),
        None => warn!(
            "No confident genus level hits found in {}",
            report_file.display()
        ),
    }

    let patient = read_patient_info(&cfg.patient_info_file())?;

    let pdf_file = cfg.report_pdf_file();
    render(&pdf_file, cfg.logo_file(), &patient, &hits)
        .with_context(|| format!("Error writing report {}", pdf_file.display()))?;

    info!("PDF report generated successfully: {}", pdf_file.display());
    Ok(())
}

fn render(
    path: &Path,
    logo: &Path,
    patient: &PatientInfo,
    hits: &[TaxonCount],
) -> anyhow::Result<()> {
    let (doc, page, layer) = PdfDocument::new(
        "Kraken2 Classification Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "report",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut y = PAGE_HEIGHT - MARGIN;
    y = draw_header(&layer, logo, &font, y);
    y = hrule(&layer, y);

    let row = [
        patient.name.as_str(),
        patient.id.as_str(),
        patient.age.as_str(),
        patient.dob.as_str(),
        patient.dot.as_str(),
        patient.location.as_str(),
    ];
    y = draw_table(
        &layer,
        &font,
        &bold,
        y,
        &PATIENT_COLS,
        &PATIENT_HEADER,
        &[row.map(str::to_owned).to_vec()],
        8.0,
        false,
    );
    y = hrule(&layer, y - 4.0);

    let rows: Vec<Vec<String>> = hits
        .iter()
        .map(|h| {
            vec![
                format!("{:.2}%", h.pct),
                h.clade_reads.to_string(),
                h.rank.clone(),
                h.name.trim().to_owned(),
            ]
        })
        .collect();
    y = draw_table(
        &layer, &font, &bold, y, &HITS_COLS, &HITS_HEADER, &rows, 9.0, true,
    );

    let top = (y - 6.0).min(SUMMARY_TOP);
    let top = hrule(&layer, top);
    draw_summary(&layer, &font, &bold, top);

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))?;
    Ok(())
}

fn draw_header(layer: &PdfLayerReference, logo: &Path, font: &IndirectFontRef, top: f32) -> f32 {
    if logo.exists() {
        if let Err(e) = embed_logo(layer, logo, top) {
            warn!("Skipping logo {}: {:#}", logo.display(), e);
        }
    }

    set_fill(layer, BLACK);
    let x = PAGE_WIDTH - MARGIN - 55.0;
    let mut ty = top - 4.0;
    for s in LAB_ADDRESS {
        layer.use_text(s, 10.0, Mm(x), Mm(ty), font);
        ty -= 4.5;
    }

    top - LOGO_HEIGHT - 4.0
}

fn embed_logo(layer: &PdfLayerReference, path: &Path, top: f32) -> anyhow::Result<()> {
    use printpdf::{image_crate::codecs::jpeg::JpegDecoder, Image, ImageTransform};

    let mut file =
        File::open(path).with_context(|| format!("Error opening {}", path.display()))?;
    let image = Image::try_from(JpegDecoder::new(&mut file).context("Error decoding JPEG")?)
        .context("Error decoding JPEG")?;

    // Natural size at the target resolution, scaled to fit the logo box
    let dpi = 300.0;
    let w = image.image.width.0 as f32 * 25.4 / dpi;
    let h = image.image.height.0 as f32 * 25.4 / dpi;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(MARGIN)),
            translate_y: Some(Mm(top - LOGO_HEIGHT)),
            scale_x: Some(LOGO_WIDTH / w),
            scale_y: Some(LOGO_HEIGHT / h),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    Ok(())
}

// Full width rule.  Returns the y position for the content below it.
fn hrule(layer: &PdfLayerReference, y: f32) -> f32 {
    layer.set_outline_color(rgb(BLACK));
    layer.set_outline_thickness(1.0);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    });
    y - 6.0
}

#[allow(clippy::too_many_arguments)]
fn draw_table(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    top: f32,
    col_widths: &[f32],
    header: &[&str],
    rows: &[Vec<String>],
    size: f32,
    shade_body: bool,
) -> f32 {
    let width: f32 = col_widths.iter().sum();
    let bottom = top - (rows.len() + 1) as f32 * ROW_HEIGHT;

    // Cell shading goes down first so the grid and text paint over it
    fill_rect(layer, MARGIN, top - ROW_HEIGHT, MARGIN + width, top, HEADER_FILL);
    if shade_body && !rows.is_empty() {
        fill_rect(layer, MARGIN, bottom, MARGIN + width, top - ROW_HEIGHT, BODY_FILL);
    }

    // Grid
    layer.set_outline_color(rgb(BLACK));
    layer.set_outline_thickness(0.5);
    let mut x = MARGIN;
    for w in col_widths {
        vline(layer, x, bottom, top);
        x += w;
    }
    vline(layer, x, bottom, top);
    for i in 0..=rows.len() + 1 {
        let y = top - i as f32 * ROW_HEIGHT;
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(y)), false),
                (Point::new(Mm(MARGIN + width), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    set_fill(layer, HEADER_TEXT);
    draw_row(layer, bold, top, col_widths, header.iter().copied(), size);

    set_fill(layer, BLACK);
    for (i, row) in rows.iter().enumerate() {
        let row_top = top - (i + 1) as f32 * ROW_HEIGHT;
        draw_row(
            layer,
            font,
            row_top,
            col_widths,
            row.iter().map(String::as_str),
            size,
        );
    }

    bottom
}

fn draw_row<'a, I>(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    row_top: f32,
    col_widths: &[f32],
    cells: I,
    size: f32,
) where
    I: IntoIterator<Item = &'a str>,
{
    let y = row_top - ROW_HEIGHT + 2.4;
    let mut x = MARGIN;
    for (w, txt) in col_widths.iter().zip(cells) {
        text_centered(layer, txt, size, x, *w, y, font);
        x += w;
    }
}

// Approximate centering; the builtin Helvetica face carries no metrics so
// the width is estimated at half an em per character.
fn text_centered(
    layer: &PdfLayerReference,
    txt: &str,
    size: f32,
    x: f32,
    w: f32,
    y: f32,
    font: &IndirectFontRef,
) {
    let est = txt.chars().count() as f32 * size * 0.5 * MM_PER_PT;
    let x = x + ((w - est) / 2.0).max(CELL_PAD);
    layer.use_text(txt, size, Mm(x), Mm(y), font);
}

fn draw_summary(layer: &PdfLayerReference, font: &IndirectFontRef, bold: &IndirectFontRef, top: f32) {
    set_fill(layer, BLACK);
    layer.use_text(SUMMARY_TITLE, SUMMARY_SIZE, Mm(MARGIN), Mm(top), bold);

    let mut y = top - 2.0 * LINE_HEIGHT;
    for para in SUMMARY_TEXT {
        let lines = wrap_text(para, WRAP_COLS);
        if lines.is_empty() {
            y -= LINE_HEIGHT;
            continue;
        }
        for line in lines {
            layer.use_text(line, SUMMARY_SIZE, Mm(MARGIN), Mm(y), font);
            y -= LINE_HEIGHT;
        }
    }
}

/// Greedy word wrap to a fixed column limit.  Words longer than the limit
/// are kept whole on their own line.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if !cur.is_empty() && cur.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

fn vline(layer: &PdfLayerReference, x: f32, y0: f32, y1: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x), Mm(y0)), false),
            (Point::new(Mm(x), Mm(y1)), false),
        ],
        is_closed: false,
    });
}

fn fill_rect(layer: &PdfLayerReference, x0: f32, y0: f32, x1: f32, y1: f32, c: (f32, f32, f32)) {
    set_fill(layer, c);
    layer.add_rect(Rect::new(Mm(x0), Mm(y0), Mm(x1), Mm(y1)).with_mode(PaintMode::Fill));
}

fn set_fill(layer: &PdfLayerReference, c: (f32, f32, f32)) {
    layer.set_fill_color(rgb(c));
}

fn rgb(c: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(c.0, c.1, c.2, None))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, ["one two", "three", "four five"]);
    }

    #[test]
    fn long_words_stay_whole() {
        let lines = wrap_text("a extraordinarily b", 5);
        assert_eq!(lines, ["a", "extraordinarily", "b"]);
    }

    #[test]
    fn empty_text_gives_no_lines() {
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn summary_fits_page_width() {
        for para in SUMMARY_TEXT {
            for line in wrap_text(para, WRAP_COLS) {
                assert!(line.chars().count() <= WRAP_COLS);
            }
        }
    }

    #[test]
    fn renders_report_pdf() {
        let patient = PatientInfo {
            name: "Jane Doe".to_owned(),
            id: "NQ-0042".to_owned(),
            age: "34".to_owned(),
            dob: "12/03/1991".to_owned(),
            dot: "05/06/2025".to_owned(),
            location: "Al-khobar".to_owned(),
        };
        let hits = vec![TaxonCount {
            pct: 7.8,
            clade_reads: 3154,
            direct_reads: 210,
            rank: "G".to_owned(),
            tax_id: 5658,
            name: "    Leishmania".to_owned(),
        }];

        let path =
            std::env::temp_dir().join(format!("nuqta_report_test_{}.pdf", std::process::id()));
        let missing_logo = Path::new("no_such_logo.jpg");
        render(&path, missing_logo, &patient, &hits).unwrap();

        let len = std::fs::metadata(&path).unwrap().len();
        assert!(len > 0);
        let _ = std::fs::remove_file(&path);
    }
}
