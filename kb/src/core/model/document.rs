use crate::err;
use crate::error::KbError;

/// File types `markitdown_ingest` and `simple_ingest` know how to read.
/// Drives [Parser][crate::core::document::parser::Parser] selection.
#[derive(Debug, Clone, Copy)]
pub enum DocumentType {
    /// Any file read as plain text: `.txt`, `.md`, `.json`, `.csv`, `.xml`.
    Text(TextDocumentType),
    Docx,
    Pdf,
    /// `.html`/`.htm`, converted to Markdown by `markitdown_ingest`.
    Html,
}

#[derive(Debug, Clone, Copy)]
pub enum TextDocumentType {
    Md,
    Xml,
    Json,
    Csv,
    Txt,
}

impl DocumentType {
    pub fn try_from_file_name(name: &str) -> Result<Self, KbError> {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return err!(BadInput, "'{}' is missing a file extension", name);
        };
        Self::try_from(ext)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::Text(ty) => match ty {
                TextDocumentType::Md => write!(f, "md"),
                TextDocumentType::Xml => write!(f, "xml"),
                TextDocumentType::Json => write!(f, "json"),
                TextDocumentType::Csv => write!(f, "csv"),
                TextDocumentType::Txt => write!(f, "txt"),
            },
            DocumentType::Docx => write!(f, "docx"),
            DocumentType::Pdf => write!(f, "pdf"),
            DocumentType::Html => write!(f, "html"),
        }
    }
}

impl TryFrom<&str> for DocumentType {
    type Error = KbError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "md" => Ok(Self::Text(TextDocumentType::Md)),
            "xml" => Ok(Self::Text(TextDocumentType::Xml)),
            "json" => Ok(Self::Text(TextDocumentType::Json)),
            "csv" => Ok(Self::Text(TextDocumentType::Csv)),
            "txt" => Ok(Self::Text(TextDocumentType::Txt)),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "html" | "htm" => Ok(Self::Html),
            other => err!(BadInput, "unsupported file type '{}'", other),
        }
    }
}

impl TryFrom<String> for DocumentType {
    type Error = KbError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}
