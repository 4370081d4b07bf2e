#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked the base resume file.
    DocumentSelected(crate::DocumentUpload),
    /// User removed the selected file.
    DocumentCleared,
    /// User edited the job description box.
    JobDescriptionChanged(String),
    /// User flipped the humanize checkbox.
    HumanizeToggled(bool),
    /// User pressed Generate.
    SubmitClicked,
    /// User pressed Cancel (Ctrl-C in the terminal client).
    CancelClicked,
    /// Transport finished, one way or another.
    SubmissionFinished(crate::TransportOutcome),
    /// Writing the result to storage failed.
    PersistFailed(String),
    /// User asked to clear the cached result.
    ResetClicked,
}
