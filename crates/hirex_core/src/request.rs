/// Only LaTeX sources are accepted as the base resume.
pub const REQUIRED_EXTENSION: &str = ".tex";

/// A document picked by the user, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// One optimization job, built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub document: DocumentUpload,
    pub job_description: String,
    pub humanize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please upload a .tex resume file.")]
    MissingDocument,
    #[error("Only .tex resumes are supported (got {filename}).")]
    WrongExtension { filename: String },
    #[error("Please paste a job description.")]
    EmptyJobDescription,
}

pub fn has_required_extension(filename: &str) -> bool {
    let ext_len = REQUIRED_EXTENSION.len();
    filename.len() > ext_len
        && filename
            .get(filename.len() - ext_len..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(REQUIRED_EXTENSION))
}

/// Checks the form before anything leaves the client. Content is never
/// inspected here; decoding problems are reported by the backend.
pub fn validate_submission(
    document: Option<&DocumentUpload>,
    job_description: &str,
) -> Result<(), ValidationError> {
    let document = document.ok_or(ValidationError::MissingDocument)?;
    if !has_required_extension(&document.filename) {
        return Err(ValidationError::WrongExtension {
            filename: document.filename.clone(),
        });
    }
    if job_description.trim().is_empty() {
        return Err(ValidationError::EmptyJobDescription);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_required_extension("resume.tex"));
        assert!(has_required_extension("Resume.TEX"));
        assert!(!has_required_extension("resume.pdf"));
        assert!(!has_required_extension(".tex"));
        assert!(!has_required_extension("resume.tex.pdf"));
    }

    #[test]
    fn multibyte_names_do_not_panic() {
        assert!(!has_required_extension("résumé"));
        assert!(has_required_extension("résumé.tex"));
    }
}
