//! # Generic form
//!
//! Holds the values and errors of a form described by a list of
//! [`FieldDescriptor`]s. Rendering is left to the caller; this type only
//! tracks state, converts selected images to inline data and validates on
//! submit.
//!
//! Lifecycle: `Idle -> Editing -> Validating -> {Submitted | Invalid}`.
//! Editing a field clears its error immediately.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{FieldDescriptor, FieldKind, FormValues};
use crate::error::{FileError, ValidationErrors};
use crate::image::{self, ImagePreview};
use crate::ports::{FileSource, SelectedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Editing,
    Validating,
    Submitted,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<FieldDescriptor>,
    values: FormValues,
    errors: BTreeMap<String, String>,
    phase: FormPhase,
}

impl Form {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self::with_values(fields, FormValues::new())
    }

    /// Start from initial values. Keys that don't name a field are dropped.
    pub fn with_values(fields: Vec<FieldDescriptor>, initial: FormValues) -> Self {
        let values = initial
            .into_iter()
            .filter(|(name, _)| fields.iter().any(|f| &f.name == name))
            .collect();
        Self {
            fields,
            values,
            errors: BTreeMap::new(),
            phase: FormPhase::Idle,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Update a field's value and clear its error.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        if self.field(name).is_none() {
            tracing::warn!(field = %name, "Ignoring value for unknown field");
            return;
        }
        self.values.insert(name.to_string(), value.into());
        self.errors.remove(name);
        self.phase = FormPhase::Editing;
    }

    /// Apply the outcome of reading a file for a file field.
    ///
    /// An accepted image is stored as a base64 data URI. Anything else
    /// records a field error and leaves the previous value in place.
    pub fn select_file(
        &mut self,
        name: &str,
        selected: Result<SelectedFile, FileError>,
    ) -> Result<(), FileError> {
        let accept = match self.field(name).map(|f| &f.kind) {
            Some(FieldKind::File { accept }) => accept.clone(),
            _ => {
                return Err(FileError::Read(format!("'{}' is not a file field", name)));
            }
        };
        self.phase = FormPhase::Editing;

        match selected.and_then(|file| image::to_data_uri(&file, &accept)) {
            Ok(uri) => {
                self.values.insert(name.to_string(), uri);
                self.errors.remove(name);
                Ok(())
            }
            Err(err) => {
                self.errors.insert(name.to_string(), err.to_string());
                Err(err)
            }
        }
    }

    /// Read `path` through `source` and apply it to the file field `name`.
    pub async fn load_file(
        &mut self,
        name: &str,
        source: &dyn FileSource,
        path: &Path,
    ) -> Result<(), FileError> {
        let selected = source.read(path).await;
        self.select_file(name, selected)
    }

    /// Preview of the inline image held by `name`, if any.
    pub fn preview(&self, name: &str) -> Option<ImagePreview> {
        self.value(name).and_then(image::preview)
    }

    /// Check every field without changing state.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let errors: BTreeMap<String, String> = self
            .fields
            .iter()
            .filter_map(|field| {
                let value = self.value(&field.name).unwrap_or("");
                check_field(field, value, &self.values, &self.fields)
                    .map(|msg| (field.name.clone(), msg))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Validate, then hand the values to `on_submit`.
    ///
    /// The callback is never invoked when any field fails.
    pub fn submit<F, R>(&mut self, on_submit: F) -> Result<R, ValidationErrors>
    where
        F: FnOnce(FormValues) -> R,
    {
        self.phase = FormPhase::Validating;

        match self.validate() {
            Ok(()) => {
                self.errors.clear();
                self.phase = FormPhase::Submitted;
                Ok(on_submit(self.values.clone()))
            }
            Err(errors) => {
                tracing::debug!(failed = errors.len(), "Form validation failed");
                self.errors = errors.0.clone();
                self.phase = FormPhase::Invalid;
                Err(errors)
            }
        }
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.phase = FormPhase::Idle;
    }
}

fn check_field(
    field: &FieldDescriptor,
    value: &str,
    values: &FormValues,
    fields: &[FieldDescriptor],
) -> Option<String> {
    let blank = value.trim().is_empty();
    if blank && field.required {
        return Some(message(field, format!("{} is required", field.label)));
    }

    let problem = match &field.kind {
        FieldKind::Password {
            confirms: Some(other),
        } => {
            let expected = values.get(other).map(String::as_str).unwrap_or("");
            (value != expected).then(|| {
                let other_label = fields
                    .iter()
                    .find(|f| &f.name == other)
                    .map(|f| f.label.as_str())
                    .unwrap_or(other.as_str());
                format!("{} must match {}", field.label, other_label)
            })
        }
        _ if blank => None,
        FieldKind::Text | FieldKind::Password { confirms: None } => None,
        FieldKind::Number { min, max, integer } => {
            check_number(&field.label, value, *min, *max, *integer)
        }
        FieldKind::Phone => (!is_phone(value))
            .then(|| format!("{} must be a valid phone number", field.label)),
        FieldKind::Email => (!is_email(value))
            .then(|| format!("{} must be a valid email address", field.label)),
        FieldKind::File { .. } => None,
    };

    problem.map(|default| message(field, default))
}

fn message(field: &FieldDescriptor, default: String) -> String {
    field.message.clone().unwrap_or(default)
}

fn check_number(
    label: &str,
    value: &str,
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
) -> Option<String> {
    let number = match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => return Some(format!("{} must be a number", label)),
    };
    if integer && number.fract() != 0.0 {
        return Some(format!("{} must be a whole number", label));
    }
    if let Some(min) = min.filter(|min| number < *min) {
        return Some(format!("{} must be at least {}", label, min));
    }
    if let Some(max) = max.filter(|max| number > *max) {
        return Some(format!("{} must be at most {}", label, max));
    }
    None
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_phone(value: &str) -> bool {
    let value = value.trim();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    allowed && value.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{NewPerson, person_fields, register_fields};

    fn filled_person() -> Form {
        let mut form = Form::new(person_fields());
        form.set_value("name", "Ada Lovelace");
        form.set_value("age", "36");
        form.set_value("address", "12 St James's Square");
        form.set_value("phone", "+44 20 7946 0000");
        form
    }

    fn png() -> SelectedFile {
        SelectedFile::new("ada.png", "image/png", vec![0x89, b'P', b'N', b'G', 9, 9])
    }

    #[test]
    fn test_required_blank_blocks_submit() {
        for field in person_fields().iter().filter(|f| f.required) {
            let mut form = filled_person();
            form.set_value(&field.name, "   ");

            let called = Cell::new(false);
            let result = form.submit(|_| called.set(true));

            let errors = result.unwrap_err();
            assert!(errors.get(&field.name).unwrap().contains(&field.label));
            assert!(!called.get());
            assert_eq!(form.phase(), FormPhase::Invalid);
        }
    }

    #[test]
    fn test_number_bounds() {
        let fields = vec![FieldDescriptor::number("age", "Age", Some(18.0), Some(65.0))];
        let check = |value: &str| {
            let mut form = Form::new(fields.clone());
            form.set_value("age", value);
            form.validate().err().and_then(|e| e.get("age").map(String::from))
        };

        assert_eq!(check("17").as_deref(), Some("Age must be at least 18"));
        assert_eq!(check("66").as_deref(), Some("Age must be at most 65"));
        assert_eq!(check("forty").as_deref(), Some("Age must be a number"));
        assert_eq!(check("18"), None);
        assert_eq!(check("40.5"), None);
        assert_eq!(check("65"), None);
    }

    #[test]
    fn test_person_age_must_be_whole() {
        let mut form = filled_person();
        form.set_value("age", "36.5");

        let errors = form.submit(|values| values).unwrap_err();
        assert_eq!(errors.get("age"), Some("Age must be a whole number"));

        form.set_value("age", "36");
        let values = form.submit(|values| values).unwrap();
        assert_eq!(NewPerson::from_values(&values).unwrap().age, 36);
    }

    #[test]
    fn test_confirmation_mismatch() {
        let cases = [
            ("Secret123", "Secret124", true),
            ("", "x", true),
            ("x", "", true),
            ("Secret123", "Secret123", false),
        ];

        for (password, confirm, expect_error) in cases {
            let mut form = Form::new(register_fields());
            form.set_value("username", "ada");
            form.set_value("email", "ada@example.com");
            form.set_value("password", password);
            form.set_value("confirmPassword", confirm);

            let errors = form.validate().err().unwrap_or_default();
            assert_eq!(
                errors.get("confirmPassword") == Some("Passwords do not match"),
                expect_error,
                "password={password:?} confirm={confirm:?}"
            );
        }
    }

    #[test]
    fn test_submit_round_trip_with_photo() {
        let mut form = filled_person();
        form.select_file("photo", Ok(png())).unwrap();

        let submitted = form.submit(|values| values).unwrap();

        assert_eq!(submitted.get("name").unwrap(), "Ada Lovelace");
        assert_eq!(submitted.get("age").unwrap(), "36");
        assert_eq!(submitted.get("address").unwrap(), "12 St James's Square");
        assert_eq!(submitted.get("phone").unwrap(), "+44 20 7946 0000");
        assert_eq!(
            submitted.get("photo").unwrap(),
            &image::to_data_uri(&png(), &[]).unwrap()
        );
        assert_eq!(form.phase(), FormPhase::Submitted);
    }

    #[test]
    fn test_non_image_rejected_and_not_stored() {
        let mut form = filled_person();
        form.select_file("photo", Ok(png())).unwrap();
        let before = form.value("photo").unwrap().to_string();

        let pdf = SelectedFile::new("cv.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        let err = form.select_file("photo", Ok(pdf)).unwrap_err();

        assert!(matches!(err, FileError::UnsupportedType { .. }));
        assert!(form.error("photo").is_some());
        assert_eq!(form.value("photo"), Some(before.as_str()));
    }

    #[test]
    fn test_edit_clears_error() {
        let mut form = filled_person();
        form.set_value("age", "abc");
        assert!(form.submit(|_| ()).is_err());
        assert!(form.error("age").is_some());

        form.set_value("age", "37");
        assert!(form.error("age").is_none());
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn test_email_and_phone_rules() {
        let mut form = Form::new(vec![
            FieldDescriptor::email("email", "Email"),
            FieldDescriptor::phone("phone", "Phone"),
        ]);
        form.set_value("email", "not-an-email");
        form.set_value("phone", "call me");
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        form.set_value("email", "ada@example.com");
        form.set_value("phone", "555.010.0000");
        assert!(form.validate().unwrap_err().get("phone").is_some());

        form.set_value("phone", "(555) 010-0000");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_initial_values_filtered_to_fields() {
        let initial = FormValues::from([
            ("name".to_string(), "Grace".to_string()),
            ("unrelated".to_string(), "x".to_string()),
        ]);
        let form = Form::with_values(person_fields(), initial);
        assert_eq!(form.value("name"), Some("Grace"));
        assert_eq!(form.value("unrelated"), None);
        assert_eq!(form.phase(), FormPhase::Idle);
    }

    struct FakeFiles;

    #[async_trait]
    impl FileSource for FakeFiles {
        async fn read(&self, path: &Path) -> Result<SelectedFile, FileError> {
            if path.ends_with("ada.png") {
                Ok(png())
            } else {
                Err(FileError::Read(format!("{} not found", path.display())))
            }
        }
    }

    #[tokio::test]
    async fn test_load_file_through_source() {
        let mut form = filled_person();

        form.load_file("photo", &FakeFiles, &PathBuf::from("/pics/ada.png"))
            .await
            .unwrap();
        let preview = form.preview("photo").unwrap();
        assert_eq!(preview.mime, "image/png");
        assert_eq!(preview.size, 6);

        let err = form
            .load_file("photo", &FakeFiles, &PathBuf::from("/pics/missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Read(_)));
        assert!(form.preview("photo").is_some());
    }
}
