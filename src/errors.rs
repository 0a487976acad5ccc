// ABOUTME: Error types for the vocab-slides application
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Vocabulary error: {0}")]
    VocabularyError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("Speech synthesis error: {0}")]
    SynthesisError(String),

    #[error("Image search error: {0}")]
    ImageSearchError(String),

    #[error("Translation error: {0}")]
    TranslationError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

// Implement conversion from anyhow::Error to our VocabError
impl From<anyhow::Error> for VocabError {
    fn from(err: anyhow::Error) -> Self {
        VocabError::UnknownError(err.to_string())
    }
}

// Implement conversion from zip errors
impl From<zip::result::ZipError> for VocabError {
    fn from(err: zip::result::ZipError) -> Self {
        VocabError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

// Implement conversion from quick-xml errors
impl From<quick_xml::Error> for VocabError {
    fn from(err: quick_xml::Error) -> Self {
        VocabError::XmlError(err.to_string())
    }
}

// Implement conversion from CSV errors
impl From<csv::Error> for VocabError {
    fn from(err: csv::Error) -> Self {
        VocabError::VocabularyError(format!("CSV parse failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, VocabError>;
