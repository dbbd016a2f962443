use tablemap_api::TableRecord;

use crate::error::CliError;
use crate::sample::Contact;

pub fn run() -> Result<(), CliError> {
    let schema = Contact::schema();
    println!("{}", schema.type_name());
    for field in schema.descriptors() {
        let class = match field.class() {
            tablemap_api::FieldClass::Scalar => "scalar",
            tablemap_api::FieldClass::Complex => "complex",
        };
        println!("  {:<12} {:<8} {}", field.name(), class, field.ty());
    }
    Ok(())
}
