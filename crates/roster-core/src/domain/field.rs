//! Declarative form field descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flat string-keyed record produced by a form.
pub type FormValues = BTreeMap<String, String>;

/// Input kind, carrying exactly the validation parameters it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        /// Reject fractional values.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        integer: bool,
    },
    Phone,
    Email,
    Password {
        /// Name of the field this one must equal.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confirms: Option<String>,
    },
    File {
        /// Accepted MIME patterns, e.g. `image/*`. Empty accepts any image.
        #[serde(default)]
        accept: Vec<String>,
    },
}

/// Static configuration for one form input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
    /// Replaces the default validation message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            placeholder: String::new(),
            required: false,
            message: None,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn number(
        name: impl Into<String>,
        label: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Number {
                min,
                max,
                integer: false,
            },
        )
    }

    /// Whole numbers only.
    pub fn integer(
        name: impl Into<String>,
        label: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Number {
                min,
                max,
                integer: true,
            },
        )
    }

    pub fn phone(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Phone)
    }

    pub fn email(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub fn password(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Password { confirms: None })
    }

    /// Password field that must equal `other`.
    pub fn confirmation(
        name: impl Into<String>,
        label: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Password {
                confirms: Some(other.into()),
            },
        )
    }

    pub fn image(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(
            name,
            label,
            FieldKind::File {
                accept: vec!["image/*".to_string()],
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, FieldKind::File { .. })
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.kind, FieldKind::Password { .. })
    }
}

/// Fields of the person entry form.
pub fn person_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::text("name", "Name")
            .required()
            .with_placeholder("Full name"),
        FieldDescriptor::integer("age", "Age", Some(0.0), Some(150.0))
            .required()
            .with_placeholder("e.g. 42"),
        FieldDescriptor::text("address", "Address")
            .required()
            .with_placeholder("Street, city"),
        FieldDescriptor::phone("phone", "Phone")
            .required()
            .with_placeholder("+1 555 0100"),
        FieldDescriptor::image("photo", "Photo").with_placeholder("Path to an image file"),
    ]
}

/// Fields of the login form.
pub fn login_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::text("username", "Username").required(),
        FieldDescriptor::password("password", "Password").required(),
    ]
}

/// Fields of the registration form.
pub fn register_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::text("username", "Username").required(),
        FieldDescriptor::email("email", "Email")
            .required()
            .with_placeholder("you@example.com"),
        FieldDescriptor::password("password", "Password").required(),
        FieldDescriptor::confirmation("confirmPassword", "Confirm password", "password")
            .required()
            .with_message("Passwords do not match"),
    ]
}
