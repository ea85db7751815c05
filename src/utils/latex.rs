// src/utils/latex.rs

use regex::Regex;
use std::sync::LazyLock;

static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(.*?)\$").expect("inline math pattern is valid"));

/// Prepares model-produced text for the exported Word document.
///
/// The text is sanitized first so generated content cannot inject markup,
/// then every `$...$` segment is wrapped in a Cambria Math span, which both
/// Word and the browser print path render as an inline formula.
pub fn format_math_for_word(text: &str) -> String {
    let clean = ammonia::clean(text);
    INLINE_MATH
        .replace_all(
            &clean,
            r#"<span style="font-family:'Cambria Math',serif;font-style:italic;">$1</span>"#,
        )
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_inline_math_segments() {
        let out = format_math_for_word("Hitung $6.02 \\times 10^{23}$ partikel.");
        assert!(out.contains("Cambria Math"));
        assert!(out.contains("6.02 \\times 10^{23}"));
        assert!(out.starts_with("Hitung "));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(format_math_for_word("Tanpa rumus."), "Tanpa rumus.");
    }

    #[test]
    fn strips_injected_markup() {
        let out = format_math_for_word("<script>alert(1)</script>Aman");
        assert!(!out.contains("<script>"));
        assert!(out.contains("Aman"));
    }
}
