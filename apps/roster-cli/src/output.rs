//! Output formatting for command results (stdout).

use clap::ValueEnum;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use roster_core::domain::{Person, User};
use roster_core::image;
use roster_shared::dto::{HealthResponse, Page};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn people(&self, people: &[Person]) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => print_json(&people),
            OutputFormat::Table => {
                if people.is_empty() {
                    println!("No people found.");
                } else {
                    println!("{}", people_table(people));
                }
                Ok(())
            }
        }
    }

    pub fn page(&self, page: &Page<Person>) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => print_json(page),
            OutputFormat::Table => {
                self.people(&page.items)?;
                println!(
                    "Page {} ({} per page), {} total",
                    page.page, page.limit, page.total
                );
                Ok(())
            }
        }
    }

    pub fn person(&self, person: &Person) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => print_json(person),
            OutputFormat::Table => {
                println!("{}", person_table(person));
                Ok(())
            }
        }
    }

    pub fn user(&self, user: &User) -> anyhow::Result<()> {
        let user = User {
            password: None,
            ..user.clone()
        };
        match self {
            OutputFormat::Json => print_json(&user),
            OutputFormat::Table => {
                let since = user
                    .created_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".into());
                println!("{} <{}> (id {}, member since {})", user.username, user.email, user.id, since);
                Ok(())
            }
        }
    }

    pub fn health(&self, health: &HealthResponse) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => print_json(health),
            OutputFormat::Table => {
                match &health.version {
                    Some(version) => println!("API status: {} (version {})", health.status, version),
                    None => println!("API status: {}", health.status),
                }
                Ok(())
            }
        }
    }

    pub fn upload(&self, url: &str) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => print_json(&serde_json::json!({ "url": url })),
            OutputFormat::Table => {
                println!("Uploaded: {}", url);
                Ok(())
            }
        }
    }

    /// One-line confirmation; JSON mode wraps it as `{"message": ...}`.
    pub fn message(&self, message: &str) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => print_json(&serde_json::json!({ "message": message })),
            OutputFormat::Table => {
                println!("{}", message);
                Ok(())
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

#[derive(Tabled)]
struct PersonRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "NAME")]
    name: &'a str,
    #[tabled(rename = "AGE")]
    age: u32,
    #[tabled(rename = "PHONE")]
    phone: &'a str,
    #[tabled(rename = "ADDRESS")]
    address: &'a str,
    #[tabled(rename = "PHOTO")]
    photo: String,
}

impl<'a> From<&'a Person> for PersonRow<'a> {
    fn from(p: &'a Person) -> Self {
        Self {
            id: &p.id,
            name: &p.name,
            age: p.age,
            phone: &p.phone,
            address: &p.address,
            photo: describe_photo(p.photo.as_deref()),
        }
    }
}

fn people_table(people: &[Person]) -> String {
    Table::new(people.iter().map(PersonRow::from))
        .with(Style::blank())
        .to_string()
}

fn person_table(person: &Person) -> String {
    let mut builder = Builder::default();
    builder.push_record(["FIELD", "VALUE"]);
    builder.push_record(["id".to_string(), person.id.clone()]);
    builder.push_record(["name".to_string(), person.name.clone()]);
    builder.push_record(["age".to_string(), person.age.to_string()]);
    builder.push_record(["address".to_string(), person.address.clone()]);
    builder.push_record(["phone".to_string(), person.phone.clone()]);
    builder.push_record(["photo".to_string(), describe_photo(person.photo.as_deref())]);
    builder.build().with(Style::blank()).to_string()
}

/// Inline images are summarised; URLs are shown as-is.
pub fn describe_photo(photo: Option<&str>) -> String {
    match photo {
        None | Some("") => "-".to_string(),
        Some(uri) if image::is_data_uri(uri) => match image::preview(uri) {
            Some(preview) => format!("inline {} ({})", preview.mime, human_size(preview.size)),
            None => "inline (unreadable)".to_string(),
        },
        Some(url) => url.to_string(),
    }
}

pub fn human_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{} B", bytes)
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{:.1} MiB", bytes_f / (KIB * KIB))
    }
}
