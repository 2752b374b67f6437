//! Domain entities - the records the client reads, edits and submits.

mod field;
mod person;
mod user;

pub use field::{FieldDescriptor, FieldKind, FormValues, login_fields, person_fields, register_fields};
pub use person::{NewPerson, Person};
pub use user::User;
