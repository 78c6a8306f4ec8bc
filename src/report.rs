//! PDF rendering for prediction reports via `printpdf`.
//!
//! Takes the decoded `ReportPayload` produced by the prediction store and
//! lays it out on a single A4 page with built-in fonts. Returns raw PDF
//! bytes; the HTTP layer owns the download headers.

use std::io::BufWriter;

use printpdf::*;
use thiserror::Error;

use crate::prediction::ReportPayload;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF render error: {0}")]
    Render(String),
}

/// Generates the prediction report PDF. Returns PDF bytes.
pub fn generate_report_pdf(payload: &ReportPayload) -> Result<Vec<u8>, ReportError> {
    let (doc, page1, layer1) = PdfDocument::new("Prediction Report", Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Render(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Render(format!("font error: {e}")))?;

    let mut y = Mm(280.0);

    layer.use_text("Prediction Report", 16.0, Mm(20.0), y, &bold);
    y -= Mm(7.0);
    layer.use_text(format!("Date: {}", payload.date), 9.0, Mm(20.0), y, &font);
    y -= Mm(10.0);

    let fields = [
        ("Patient ID:", payload.subject_id.clone()),
        (
            "Predicted Disease:",
            format!("{} ({}% confidence)", payload.disease_name, payload.confidence),
        ),
        ("Severity:", payload.severity.clone()),
        ("Status:", payload.status.clone()),
        ("Doctor:", payload.doctor.clone()),
    ];
    for (label, value) in fields {
        layer.use_text(label, 11.0, Mm(20.0), y, &bold);
        for line in wrap_text(&value, 80) {
            layer.use_text(&line, 10.0, Mm(65.0), y, &font);
            y -= Mm(5.0);
        }
        y -= Mm(3.0);
    }

    y -= Mm(4.0);
    layer.use_text("Symptoms:", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    if payload.symptoms.is_empty() {
        layer.use_text("-", 10.0, Mm(25.0), y, &font);
    } else {
        for symptom in &payload.symptoms {
            let text = format!("  \u{b7} {symptom}");
            for line in wrap_text(&text, 80) {
                layer.use_text(&line, 10.0, Mm(25.0), y, &font);
                y -= Mm(5.0);
            }
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Render(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Render(format!("buffer error: {e}")))
}

/// Attachment filename for a report download.
pub fn report_filename(payload: &ReportPayload) -> String {
    let stamp = payload
        .recorded_at
        .map(|d| d.format("%Y%m%d%H%M").to_string())
        .unwrap_or_else(|| "report".to_string());
    format!("prediction_{}_{}.pdf", payload.subject_id, stamp)
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::Confidence;
    use chrono::NaiveDate;

    fn payload() -> ReportPayload {
        ReportPayload {
            subject_id: "P1".into(),
            recorded_at: Some(
                NaiveDate::from_ymd_opt(2026, 1, 7)
                    .unwrap()
                    .and_hms_opt(14, 30, 0)
                    .unwrap(),
            ),
            date: "2026-01-07 14:30".into(),
            disease_name: "Migraine".into(),
            confidence: Confidence::new(82.5),
            severity: "Moderate".into(),
            status: "completed".into(),
            doctor: "Dr. Asha".into(),
            symptoms: vec!["headache".into(), "nausea".into()],
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let bytes = generate_report_pdf(&payload()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn empty_symptoms_still_render() {
        let mut p = payload();
        p.symptoms.clear();
        assert!(generate_report_pdf(&p).is_ok());
    }

    #[test]
    fn filename_includes_subject_and_stamp() {
        assert_eq!(report_filename(&payload()), "prediction_P1_202601071430.pdf");
        let mut p = payload();
        p.recorded_at = None;
        assert_eq!(report_filename(&p), "prediction_P1_report.pdf");
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("one two three four five six seven eight", 10);
        assert!(lines.iter().all(|l| l.len() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six seven eight");
    }
}
