//! Line-oriented renderer for [`Form`]s.
//!
//! Each descriptor becomes one prompt. Answers are applied through the form,
//! so validation and file handling behave exactly as in any other front end.

use std::path::Path;

use anyhow::{Context, bail};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stderr, Stdin,
};

use roster_core::domain::{FieldDescriptor, FieldKind, FormValues};
use roster_core::draft::DraftStore;
use roster_core::form::Form;
use roster_core::ports::FileSource;

use crate::output::human_size;

/// Value typed to clear an optional file field.
const CLEAR: &str = "-";

pub struct Prompter<R, W> {
    lines: Lines<R>,
    out: W,
}

impl Prompter<BufReader<Stdin>, Stderr> {
    /// Read answers from stdin, write prompts to stderr.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    async fn say(&mut self, text: &str) -> anyhow::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    /// `None` once input is exhausted.
    async fn ask(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        self.say(question).await?;
        let line = self.lines.next_line().await.context("failed to read input")?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    pub async fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        let answer = self.ask(&format!("{} [y/N]: ", question)).await?;
        Ok(matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "Yes")))
    }

    /// Prompt for every field, submit, and re-prompt only the fields that
    /// failed until the form validates. The draft (if any) is saved after
    /// each answer.
    pub async fn fill(
        &mut self,
        form: &mut Form,
        files: &dyn FileSource,
        drafts: Option<&DraftStore>,
    ) -> anyhow::Result<FormValues> {
        let mut pending: Vec<String> = form.fields().iter().map(|f| f.name.clone()).collect();

        loop {
            for name in &pending {
                if !self.field(form, name, files).await? {
                    bail!("input ended before the form was complete");
                }
                if let Some(drafts) = drafts {
                    if let Err(e) = drafts.save(form.values()).await {
                        tracing::warn!(error = %e, "Failed to save draft");
                    }
                }
            }

            match form.submit(|values| values) {
                Ok(values) => return Ok(values),
                Err(errors) => {
                    for field in form.fields() {
                        if let Some(message) = errors.get(&field.name) {
                            self.say(&format!("  ✗ {}: {}\n", field.label, message)).await?;
                        }
                    }
                    pending = form
                        .fields()
                        .iter()
                        .filter(|f| errors.get(&f.name).is_some())
                        .map(|f| f.name.clone())
                        .collect();
                }
            }
        }
    }

    /// Render one field and apply the answer. `false` on end of input.
    pub async fn field(
        &mut self,
        form: &mut Form,
        name: &str,
        files: &dyn FileSource,
    ) -> anyhow::Result<bool> {
        let field = form
            .field(name)
            .cloned()
            .with_context(|| format!("unknown field '{}'", name))?;
        let current = form.value(name).map(str::to_string);

        loop {
            let prompt = question(&field, current.as_deref());
            let Some(answer) = self.ask(&prompt).await? else {
                return Ok(false);
            };

            match &field.kind {
                FieldKind::Text
                | FieldKind::Number { .. }
                | FieldKind::Phone
                | FieldKind::Email
                | FieldKind::Password { .. } => {
                    if answer.is_empty() && current.is_some() {
                        return Ok(true);
                    }
                    form.set_value(name, answer);
                    return Ok(true);
                }
                FieldKind::File { .. } => {
                    if answer.is_empty() {
                        return Ok(true);
                    }
                    if answer == CLEAR {
                        form.set_value(name, "");
                        return Ok(true);
                    }
                    match form.load_file(name, files, Path::new(&answer)).await {
                        Ok(()) => {
                            if let Some(preview) = form.preview(name) {
                                self.say(&format!(
                                    "  ✓ {} ({})\n",
                                    preview.mime,
                                    human_size(preview.size)
                                ))
                                .await?;
                            }
                            return Ok(true);
                        }
                        Err(e) => self.say(&format!("  ✗ {}\n", e)).await?,
                    }
                }
            }
        }
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}

fn question(field: &FieldDescriptor, current: Option<&str>) -> String {
    let mut q = field.label.clone();
    if field.required {
        q.push('*');
    }

    let hint = match &field.kind {
        FieldKind::Text | FieldKind::Phone | FieldKind::Email => {
            current.map(str::to_string).or_else(|| placeholder(field))
        }
        FieldKind::Number { min, max, .. } => match (current, min, max) {
            (Some(value), _, _) => Some(value.to_string()),
            (None, Some(min), Some(max)) => Some(format!("{}-{}", min, max)),
            (None, Some(min), None) => Some(format!(">= {}", min)),
            (None, None, Some(max)) => Some(format!("<= {}", max)),
            (None, None, None) => placeholder(field),
        },
        FieldKind::Password { .. } => current.map(|_| "unchanged".to_string()),
        FieldKind::File { .. } => match current {
            Some(value) if !value.is_empty() => Some(format!(
                "{}; '{}' to clear",
                crate::output::describe_photo(Some(value)),
                CLEAR
            )),
            _ => placeholder(field),
        },
    };

    match hint {
        Some(hint) => format!("{} [{}]: ", q, hint),
        None => format!("{}: ", q),
    }
}

fn placeholder(field: &FieldDescriptor) -> Option<String> {
    Some(field.placeholder.clone()).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;

    use roster_core::FileError;
    use roster_core::domain::{login_fields, person_fields, register_fields};
    use roster_core::ports::SelectedFile;
    use roster_infra::InMemoryStore;

    use super::*;

    struct FakeFiles;

    #[async_trait]
    impl FileSource for FakeFiles {
        async fn read(&self, path: &Path) -> Result<SelectedFile, FileError> {
            match path.to_str() {
                Some("me.png") => Ok(SelectedFile::new(
                    "me.png",
                    "image/png",
                    vec![0x89, b'P', b'N', b'G'],
                )),
                Some("cv.pdf") => Ok(SelectedFile::new("cv.pdf", "application/pdf", b"%PDF".to_vec())),
                _ => Err(FileError::Read(format!("{}: not found", path.display()))),
            }
        }
    }

    fn prompter(input: &'static str) -> Prompter<&'static [u8], Vec<u8>> {
        Prompter::new(input.as_bytes(), Vec::new())
    }

    #[tokio::test]
    async fn test_fill_reprompts_invalid_fields() {
        let mut form = Form::new(person_fields());
        let mut prompts = prompter("Ada\n200\n12 Analytical St\n+44 20 7946 0000\n\n36\n");

        let values = prompts.fill(&mut form, &FakeFiles, None).await.unwrap();

        assert_eq!(values["name"], "Ada");
        assert_eq!(values["age"], "36");
        assert!(!values.contains_key("photo"));
        let shown = String::from_utf8_lossy(prompts.output()).to_string();
        assert!(shown.contains("Age* [0-150]: "));
        assert!(shown.contains("✗ Age:"));
    }

    #[tokio::test]
    async fn test_file_field_retries_after_bad_file() {
        let mut form = Form::new(person_fields());
        let mut prompts = prompter("cv.pdf\nme.png\n");

        assert!(prompts.field(&mut form, "photo", &FakeFiles).await.unwrap());

        assert!(form.value("photo").unwrap().starts_with("data:image/png;base64,"));
        let shown = String::from_utf8_lossy(prompts.output()).to_string();
        assert!(shown.contains("Unsupported file type: application/pdf"));
        assert!(shown.contains("✓ image/png (4 B)"));
    }

    #[tokio::test]
    async fn test_blank_answer_keeps_current_value() {
        let initial = FormValues::from([("name".to_string(), "Ada".to_string())]);
        let mut form = Form::with_values(person_fields(), initial);
        let mut prompts = prompter("\n");

        prompts.field(&mut form, "name", &FakeFiles).await.unwrap();

        assert_eq!(form.value("name"), Some("Ada"));
        let shown = String::from_utf8_lossy(prompts.output()).to_string();
        assert_eq!(shown, "Name* [Ada]: ");
    }

    #[tokio::test]
    async fn test_password_confirmation_mismatch() {
        let mut form = Form::new(register_fields());
        let mut prompts =
            prompter("ada\nada@example.com\nSecret123\nSecret124\nSecret123\n");

        let values = prompts.fill(&mut form, &FakeFiles, None).await.unwrap();

        assert_eq!(values["confirmPassword"], "Secret123");
        let shown = String::from_utf8_lossy(prompts.output()).to_string();
        assert!(shown.contains("✗ Confirm password: Passwords do not match"));
    }

    #[tokio::test]
    async fn test_saves_draft_after_each_answer() {
        let drafts = DraftStore::new(Arc::new(InMemoryStore::new()));
        let mut form = Form::new(person_fields());
        let mut prompts = prompter("Ada\n");

        let err = prompts.fill(&mut form, &FakeFiles, Some(&drafts)).await;

        assert!(err.is_err());
        let saved = drafts.restore().await.unwrap();
        assert_eq!(saved["name"], "Ada");
    }

    #[tokio::test]
    async fn test_end_of_input_is_reported() {
        let mut form = Form::new(login_fields());
        let mut prompts = prompter("ada\n");

        let err = prompts.fill(&mut form, &FakeFiles, None).await.unwrap_err();
        assert!(err.to_string().contains("input ended"));
    }

    #[tokio::test]
    async fn test_confirm() {
        assert!(prompter("y\n").confirm("Delete?").await.unwrap());
        assert!(!prompter("\n").confirm("Delete?").await.unwrap());
        assert!(!prompter("").confirm("Delete?").await.unwrap());
    }
}
