use diffsarif_core::DiffSarifError;

/// The one line format every finding must follow in the model's reply.
///
/// [`crate::parser`] decodes exactly this shape.
pub const ISSUE_FORMAT: &str = "Issue <N> (Line <Y>, Column <Z>)::: <comment>";

/// Reply the model is told to give when it has nothing to report.
pub const NO_ISSUES_REPLY: &str = "No issues found.";

/// Build the analysis prompt for one changed file.
///
/// The prompt names the file, fixes the response format to [`ISSUE_FORMAT`]
/// and appends the diff verbatim after a `diff:` marker. An empty diff is
/// allowed and produces a prompt with no code body.
///
/// # Errors
///
/// Returns [`DiffSarifError::Validation`] if `filename` is empty.
///
/// # Examples
///
/// ```
/// use diffsarif_review::prompt::build_prompt;
///
/// let prompt = build_prompt("src/app.py", "+print('hi')").unwrap();
/// assert!(prompt.contains("src/app.py"));
/// assert!(prompt.ends_with("diff:\n+print('hi')"));
/// ```
pub fn build_prompt(filename: &str, diff: &str) -> Result<String, DiffSarifError> {
    if filename.trim().is_empty() {
        return Err(DiffSarifError::Validation(
            "cannot build a prompt for a file without a name".into(),
        ));
    }

    Ok(format!(
        "Analyze the following code changes to the file `{filename}`.\n\
         Provide feedback on the quality, readability, and potential issues in the code.\n\
         \n\
         Report every issue on its own line, using exactly this format:\n\
         {ISSUE_FORMAT}\n\
         \n\
         <N> is the issue number, <Y> and <Z> are the line and column in `{filename}` \
         the issue refers to, and <comment> is a one-line explanation.\n\
         Do not write anything else. If there are no issues, reply with: {NO_ISSUES_REPLY}\n\
         \n\
         diff:\n\
         {diff}"
    ))
}
