use super::Category;

/// Substrings that mark a spreadsheet-like content type.
const SPREADSHEET_MARKERS: [&str; 3] = ["csv", "excel", "spreadsheet"];

/// Map a declared content type to its extraction category.
///
/// Rules are checked in order and the first match wins. The declared type is
/// trusted as given: matching is case-sensitive and never looks at the bytes.
pub fn classify(content_type: &str) -> Category {
    if content_type.starts_with("image/") {
        Category::Image
    } else if content_type == "application/pdf" {
        Category::Pdf
    } else if content_type.starts_with("text/") {
        Category::PlainText
    } else if SPREADSHEET_MARKERS
        .iter()
        .any(|marker| content_type.contains(marker))
    {
        Category::Spreadsheet
    } else {
        Category::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images() {
        assert_eq!(classify("image/png"), Category::Image);
        assert_eq!(classify("image/jpeg"), Category::Image);
        assert_eq!(classify("image/"), Category::Image);
    }

    #[test]
    fn test_pdf_requires_exact_match() {
        assert_eq!(classify("application/pdf"), Category::Pdf);
        assert_eq!(classify("application/pdf; charset=binary"), Category::Unsupported);
        assert_eq!(classify("APPLICATION/PDF"), Category::Unsupported);
    }

    #[test]
    fn test_text_wins_over_csv() {
        // text/csv hits the text/ rule before the spreadsheet markers
        assert_eq!(classify("text/csv"), Category::PlainText);
        assert_eq!(classify("text/plain"), Category::PlainText);
        assert_eq!(classify("text/markdown"), Category::PlainText);
    }

    #[test]
    fn test_spreadsheets() {
        assert_eq!(classify("application/csv"), Category::Spreadsheet);
        assert_eq!(classify("application/vnd.ms-excel"), Category::Spreadsheet);
        assert_eq!(
            classify("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            Category::Spreadsheet
        );
        assert_eq!(
            classify("application/vnd.oasis.opendocument.spreadsheet"),
            Category::Spreadsheet
        );
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        assert_eq!(classify("application/CSV"), Category::Unsupported);
        assert_eq!(classify("application/Excel"), Category::Unsupported);
    }

    #[test]
    fn test_everything_else_is_unsupported() {
        assert_eq!(classify("application/unknown-binary"), Category::Unsupported);
        assert_eq!(classify("application/zip"), Category::Unsupported);
        assert_eq!(classify(""), Category::Unsupported);
    }
}
