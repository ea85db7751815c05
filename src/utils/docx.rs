// src/utils/docx.rs

//! Builds the downloadable Word-compatible document for a quiz job.
//!
//! The export is an HTML file with print page-size CSS, served with a .doc
//! name and the msword content type; word processors open it natively.

use serde::Deserialize;

use crate::models::job::QuizJob;
use crate::utils::latex::format_math_for_word;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PaperSize {
    #[default]
    #[serde(rename = "A4")]
    A4,
    #[serde(rename = "FOLIO")]
    Folio,
}

impl PaperSize {
    /// `@page` size value for the chosen paper.
    pub fn dimensions(&self) -> &'static str {
        match self {
            PaperSize::A4 => "210mm 297mm",
            PaperSize::Folio => "215.9mm 330.2mm",
        }
    }
}

const DOC_STYLE: &str = "\
  @page {\n\
    size: __DIMENSIONS__;\n\
    margin: 2cm 2.5cm 2cm 2.5cm;\n\
    mso-page-orientation: portrait;\n\
  }\n\
  body { font-family: 'Times New Roman', serif; font-size: 11pt; line-height: 1.5; color: black; }\n\
  .header { text-align: center; margin-bottom: 20pt; border-bottom: 2pt solid black; padding-bottom: 10pt; }\n\
  .title { font-size: 14pt; font-weight: bold; text-transform: uppercase; }\n\
  .meta { font-size: 10pt; margin-top: 5pt; }\n\
  .question-block { margin-bottom: 15pt; page-break-inside: avoid; }\n\
  .q-text { font-weight: bold; margin-bottom: 5pt; }\n\
  .options-list { margin-left: 20pt; }\n\
  .option-item { margin-bottom: 3pt; }\n\
  .answer-key {\n\
    margin-top: 10pt;\n\
    padding: 10pt;\n\
    background: #f3f4f6;\n\
    border-left: 3pt solid #ea580c;\n\
    font-size: 10pt;\n\
  }\n";

/// Download name: SOAL_/KUNCI_ prefix, uppercased subject, millisecond stamp.
pub fn export_filename(job: &QuizJob, include_answers: bool) -> String {
    format!(
        "{}_{}_{}.doc",
        if include_answers { "KUNCI" } else { "SOAL" },
        job.subject.to_uppercase(),
        chrono::Utc::now().timestamp_millis()
    )
}

/// Renders the full document. All job-derived text goes through the
/// sanitizing math formatter before being embedded.
pub fn render_doc(job: &QuizJob, include_answers: bool, paper: PaperSize) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<div class=\"header\">\
           <div class=\"title\">{}</div>\
           <div class=\"meta\">Mata Pelajaran: {} | Kelas: {} | Topik: {}</div>\
         </div>\n",
        format_math_for_word(&job.title),
        format_math_for_word(&job.subject),
        format_math_for_word(&job.grade),
        format_math_for_word(&job.topic),
    ));

    let results = job.results.as_deref().unwrap_or(&[]);
    for (idx, q) in results.iter().enumerate() {
        body.push_str("<div class=\"question-block\">");
        body.push_str("<table border=\"0\" cellspacing=\"0\" cellpadding=\"0\" style=\"width:100%\"><tr>");
        body.push_str(&format!(
            "<td style=\"width:25pt; vertical-align:top; font-weight:bold;\">{}.</td>",
            idx + 1
        ));
        body.push_str("<td style=\"vertical-align:top;\">");
        body.push_str(&format!(
            "<div class=\"q-text\">{}</div>",
            format_math_for_word(&q.question)
        ));

        match q.options.as_deref().filter(|opts| !opts.is_empty()) {
            Some(options) => {
                body.push_str("<div class=\"options-list\">");
                for (o_idx, option) in options.iter().enumerate() {
                    body.push_str(&format!(
                        "<div class=\"option-item\"><strong>{}.</strong> {}</div>",
                        option_letter(o_idx),
                        format_math_for_word(option)
                    ));
                }
                body.push_str("</div>");
            }
            // Essay types get a dashed writing area instead of options.
            None => body.push_str(
                "<div style=\"height:50pt; border:1pt dashed #ccc; margin-top:10pt;\"></div>",
            ),
        }

        body.push_str("</td></tr></table></div>\n");
    }

    if include_answers {
        body.push_str("<br clear=\"all\" style=\"page-break-before:always\" />");
        body.push_str(
            "<div style=\"font-weight:bold; text-align:center; padding:10px; \
             background:#000; color:#fff;\">KUNCI JAWABAN &amp; PEMBAHASAN</div>\n",
        );
        for (idx, q) in results.iter().enumerate() {
            body.push_str(&format!(
                "<div class=\"answer-key\">\
                   <strong>SOAL NO {}</strong><br/>\
                   <strong>Kunci:</strong> {}<br/>\
                   <strong>Pembahasan:</strong> {}\
                 </div>\n",
                idx + 1,
                format_math_for_word(&q.answer),
                format_math_for_word(&q.explanation),
            ));
        }
    }

    format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\n\
         <head>\n<meta charset='utf-8'>\n<style>\n{}</style>\n</head>\n\
         <body>\n{}</body>\n</html>",
        DOC_STYLE.replace("__DIMENSIONS__", paper.dimensions()),
        body
    )
}

fn option_letter(idx: usize) -> char {
    // Option lists top out at a handful of entries; anything longer wraps.
    char::from(b'A' + (idx % 26) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuizQuestion;

    fn sample_job(options: Option<Vec<String>>) -> QuizJob {
        use crate::models::job::JobStatus;
        QuizJob {
            id: "job-1".to_string(),
            title: "Penilaian Harian Kimia".to_string(),
            subject: "Kimia".to_string(),
            grade: "Kelas 10".to_string(),
            topic: "Struktur Atom".to_string(),
            status: JobStatus::Completed,
            progress: 100,
            results: Some(vec![QuizQuestion {
                id: "q1".to_string(),
                question: "Berapa massa molar $\\ce{H2O}$?".to_string(),
                options,
                answer: "18 g/mol".to_string(),
                explanation: "Jumlah massa atom penyusunnya.".to_string(),
                indicator: "Menghitung massa molar".to_string(),
                cognitive_level: "C3 (Menerapkan)".to_string(),
                has_image: None,
                image_url: None,
                fact_check_status: None,
                fact_check_comment: None,
            }]),
            error: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            published: false,
        }
    }

    #[test]
    fn folio_paper_sets_page_size() {
        let doc = render_doc(&sample_job(None), false, PaperSize::Folio);
        assert!(doc.contains("215.9mm 330.2mm"));
    }

    #[test]
    fn questions_without_options_get_an_essay_area() {
        let doc = render_doc(&sample_job(None), false, PaperSize::A4);
        assert!(doc.contains("border:1pt dashed #ccc"));
        assert!(!doc.contains("options-list"));
    }

    #[test]
    fn answer_key_is_opt_in() {
        let job = sample_job(Some(vec!["16".into(), "18 g/mol".into()]));
        let without = render_doc(&job, false, PaperSize::A4);
        let with = render_doc(&job, true, PaperSize::A4);
        assert!(!without.contains("KUNCI JAWABAN"));
        assert!(with.contains("KUNCI JAWABAN"));
        assert!(with.contains("SOAL NO 1"));
    }

    #[test]
    fn filename_carries_prefix_and_subject() {
        let job = sample_job(None);
        assert!(export_filename(&job, false).starts_with("SOAL_KIMIA_"));
        assert!(export_filename(&job, true).starts_with("KUNCI_KIMIA_"));
    }
}
