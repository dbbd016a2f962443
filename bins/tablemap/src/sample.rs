use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tablemap_api::TableRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postcode: String,
}

/// Record used by the `fields` and `demo` commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TableRecord)]
pub struct Contact {
    #[table(rename = "ContactId")]
    pub contact_id: String,
    #[table(rename = "FirstName")]
    pub first_name: String,
    #[table(rename = "LastName")]
    pub last_name: String,
    #[table(rename = "Age")]
    pub age: i32,
    #[table(rename = "Email")]
    pub email: Option<String>,
    #[table(rename = "Created")]
    pub created: DateTime<Utc>,
    #[table(rename = "Tags")]
    pub tags: Vec<String>,
    #[table(rename = "Address")]
    pub address: Address,
}

pub fn contacts() -> Vec<Contact> {
    let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single().unwrap_or_default();
    vec![
        Contact {
            contact_id: "c-100".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            age: 36,
            email: Some("ada@example.org".into()),
            created,
            tags: vec!["math".into(), "engines".into()],
            address: Address {
                street: "12 St James's Square".into(),
                city: "London".into(),
                postcode: "SW1Y 4JH".into(),
            },
        },
        Contact {
            contact_id: "c-101".into(),
            first_name: "Alan".into(),
            last_name: "Turing".into(),
            age: 41,
            email: None,
            created,
            tags: vec!["computing".into()],
            address: Address {
                street: "Hollymeade".into(),
                city: "Wilmslow".into(),
                postcode: "SK9 1AB".into(),
            },
        },
        Contact {
            // No identifier: the encoder generates one.
            contact_id: String::new(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            age: 29,
            email: Some("grace@example.org".into()),
            created,
            tags: Vec::new(),
            address: Address::default(),
        },
    ]
}
