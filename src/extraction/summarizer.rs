// Category-specific framing for extracted text

use std::borrow::Cow;

use super::Category;

const ELLIPSIS: &str = "...";

/// Copy and truncation limit for one category.
#[derive(Debug)]
pub struct Framing {
    /// Maximum excerpt length in characters; `None` keeps the whole text.
    pub limit: Option<usize>,
    pub icon: &'static str,
    pub label: &'static str,
    pub heading: &'static str,
    pub kind: &'static str,
    pub generic_noun: &'static str,
    pub empty_notice: &'static str,
}

const IMAGE: Framing = Framing {
    limit: None,
    icon: "📷",
    label: "Image Analysis",
    heading: "Text found in image:",
    kind: "Image",
    generic_noun: "image file",
    empty_notice: "No text detected in the image.",
};

const PDF: Framing = Framing {
    limit: Some(2000),
    icon: "📄",
    label: "PDF Analysis",
    heading: "Document content:",
    kind: "PDF",
    generic_noun: "PDF file",
    empty_notice: "No text content found in the PDF.",
};

const PLAIN_TEXT: Framing = Framing {
    limit: Some(2000),
    icon: "📝",
    label: "Text File Analysis",
    heading: "File content:",
    kind: "Text file",
    generic_noun: "text file",
    empty_notice: "File appears to be empty.",
};

const SPREADSHEET: Framing = Framing {
    limit: Some(1000),
    icon: "📊",
    label: "Spreadsheet Analysis",
    heading: "Data content:",
    kind: "Spreadsheet",
    generic_noun: "spreadsheet file",
    empty_notice: "No data content found.",
};

const UNSUPPORTED: Framing = Framing {
    limit: None,
    icon: "📎",
    label: "File",
    heading: "",
    kind: "File",
    generic_noun: "file",
    empty_notice: "File type not supported for automatic analysis.",
};

impl Category {
    pub fn framing(self) -> &'static Framing {
        match self {
            Category::Image => &IMAGE,
            Category::Pdf => &PDF,
            Category::PlainText => &PLAIN_TEXT,
            Category::Spreadsheet => &SPREADSHEET,
            Category::Unsupported => &UNSUPPORTED,
        }
    }
}

/// Build the description handed to the assistant.
///
/// Never fails: empty text turns into a notice naming the file (or a generic
/// noun), and unsupported files always get the same fixed notice.
pub fn summarize(
    category: Category,
    raw_text: &str,
    display_name: Option<&str>,
    content_type: &str,
) -> String {
    let framing = category.framing();
    let name = display_name
        .filter(|name| !name.is_empty())
        .unwrap_or(framing.generic_noun);

    if category == Category::Unsupported {
        return format!(
            "{} {} uploaded: {} ({})\n\n{}",
            framing.icon, framing.kind, name, content_type, framing.empty_notice
        );
    }

    if raw_text.is_empty() {
        return format!(
            "{} {} uploaded: {}\n\n{}",
            framing.icon, framing.kind, name, framing.empty_notice
        );
    }

    let excerpt = match framing.limit {
        Some(limit) => truncate(raw_text, limit),
        None => Cow::Borrowed(raw_text),
    };

    format!(
        "{} {}:\n\n{}\n\"{}\"",
        framing.icon, framing.label, framing.heading, excerpt
    )
}

/// Keep at most `limit` characters, marking a cut with an ellipsis.
pub fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], ELLIPSIS)),
        None => Cow::Borrowed(text),
    }
}
