//! Static description of the queryable phone relation

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Relation populated by the phone scraper
pub const PHONES_RELATION: &str = "samsung_phones";

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Text,
    Varchar(u16),
    Timestamp,
    Boolean,
}

impl FieldType {
    /// PostgreSQL column type
    pub fn sql_type(&self) -> String {
        match self {
            Self::Integer => "INTEGER".to_string(),
            Self::Text => "TEXT".to_string(),
            Self::Varchar(len) => format!("VARCHAR({})", len),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Text => write!(f, "text"),
            Self::Varchar(_) => write!(f, "varchar"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// One field of the relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub description: String,
    /// Filled in by the store rather than by the data producer
    #[serde(default)]
    pub generated: bool,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: description.into(),
            generated: false,
        }
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }
}

/// Description of the single relation the workflow may query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    relation: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(relation: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self, DomainError> {
        let relation = relation.into();

        if relation.trim().is_empty() {
            return Err(DomainError::configuration("Schema relation name cannot be empty"));
        }

        if fields.is_empty() {
            return Err(DomainError::configuration(format!(
                "Schema for '{}' has no fields",
                relation
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.to_lowercase()) {
                return Err(DomainError::configuration(format!(
                    "Duplicate field '{}' in schema for '{}'",
                    field.name, relation
                )));
            }
        }

        Ok(Self { relation, fields })
    }

    /// Parse a descriptor from TOML (`relation = "..."` plus `[[fields]]` tables)
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        let raw: SchemaDescriptor = toml::from_str(content)
            .map_err(|e| DomainError::configuration(format!("Invalid schema file: {}", e)))?;

        Self::new(raw.relation, raw.fields)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("Failed to read schema file {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Case-insensitive field lookup
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn is_relation(&self, name: &str) -> bool {
        self.relation.eq_ignore_ascii_case(name)
    }

    /// Fields the data producer supplies
    pub fn producer_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.generated)
    }

    /// Grounding text handed to the generation service
    pub fn render(&self) -> String {
        let mut out = format!("Table: {}\n\nColumns:\n", self.relation);

        for field in &self.fields {
            out.push_str(&format!(
                "- {}: {} ({})\n",
                field.name, field.field_type, field.description
            ));
        }

        out
    }

    /// Built-in descriptor for the scraped phone catalogue
    pub fn phones() -> Self {
        use FieldType::*;

        let f = FieldDescriptor::new;
        let fields = vec![
            f("id", Integer, "primary key").generated(),
            f("url", Text, "product page URL, unique per phone"),
            f("name", Varchar(255), "phone model name, e.g. 'Samsung Galaxy S25 Ultra'"),
            f("image_url", Text, "phone image URL"),
            f("launch_announced", Varchar(100), "announcement date, e.g. '2025, January 22'"),
            f("launch_status", Varchar(100), "availability status, e.g. 'Available. Released 2025, February 03'"),
            f("network_technology", Text, "network types, e.g. 'GSM / HSPA / LTE / 5G'"),
            f("network_2g_bands", Text, "2G band support"),
            f("network_3g_bands", Text, "3G band support"),
            f("network_4g_bands", Text, "4G/LTE bands"),
            f("network_5g_bands", Text, "5G band support, empty when the phone has no 5G"),
            f("network_speed", Varchar(100), "data speed, e.g. 'HSPA, LTE, 5G'"),
            f("body_dimensions", Varchar(100), "physical dimensions in mm"),
            f("body_weight", Varchar(100), "weight in grams, e.g. '218 g (7.69 oz)'"),
            f("body_build", Text, "materials of front, back and frame"),
            f("body_sim", Text, "SIM configuration"),
            f("display_type", Text, "screen technology and refresh rate"),
            f("display_size", Varchar(100), "screen size in inches"),
            f("display_resolution", Varchar(100), "screen resolution"),
            f("display_protection", Text, "screen protection glass"),
            f("platform_os", Text, "operating system and upgrades"),
            f("platform_chipset", Text, "processor chipset"),
            f("platform_cpu", Text, "CPU details"),
            f("platform_gpu", Text, "GPU details"),
            f("memory_card_slot", Text, "memory card slot support"),
            f("memory_internal", Text, "storage and RAM options"),
            f("main_camera", Text, "rear camera specs"),
            f("main_camera_features", Text, "rear camera features"),
            f("main_camera_video", Text, "rear camera video recording capabilities"),
            f("selfie_camera", Text, "front camera specs"),
            f("selfie_camera_features", Text, "front camera features"),
            f("selfie_camera_video", Text, "front camera video recording capabilities"),
            f("sound_loudspeaker", Varchar(50), "loudspeaker configuration"),
            f("sound_3_5mm_jack", Varchar(50), "3.5mm headphone jack, 'Yes' or 'No'"),
            f("comms_wlan", Text, "Wi-Fi standards"),
            f("comms_bluetooth", Text, "Bluetooth version and profiles"),
            f("comms_positioning", Text, "positioning systems (GPS, GLONASS, ...)"),
            f("comms_nfc", Varchar(50), "NFC support"),
            f("comms_radio", Varchar(50), "FM radio support"),
            f("comms_usb", Text, "USB connector and version"),
            f("features_sensors", Text, "sensors list"),
            f("battery_type", Text, "battery capacity, e.g. 'Li-Ion 5000 mAh'"),
            f("battery_charging", Text, "charging capabilities"),
            f("misc_colors", Text, "available colors"),
            f("misc_models", Text, "model numbers"),
            f("misc_sar", Varchar(100), "SAR value"),
            f("misc_sar_eu", Varchar(100), "SAR EU value"),
            f("misc_price", Text, "price information"),
            f("created_at", Timestamp, "row creation time").generated(),
            f("updated_at", Timestamp, "row update time").generated(),
        ];

        Self {
            relation: PHONES_RELATION.to_string(),
            fields,
        }
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::phones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_schema_lookup_is_case_insensitive() {
        let schema = SchemaDescriptor::phones();

        assert_eq!(schema.relation(), "samsung_phones");
        assert!(schema.has_field("network_5g_bands"));
        assert!(schema.has_field("NAME"));
        assert!(!schema.has_field("password"));
        assert!(schema.is_relation("Samsung_Phones"));
    }

    #[test]
    fn test_producer_fields_skip_generated_columns() {
        let schema = SchemaDescriptor::phones();
        let names: Vec<&str> = schema.producer_fields().map(|f| f.name.as_str()).collect();

        assert!(!names.contains(&"id"));
        assert!(!names.contains(&"created_at"));
        assert_eq!(names.first(), Some(&"url"));
        assert_eq!(names.len(), schema.fields().len() - 3);
    }

    #[test]
    fn test_render_lists_every_field() {
        let schema = SchemaDescriptor::phones();
        let rendered = schema.render();

        assert!(rendered.starts_with("Table: samsung_phones"));
        assert!(rendered.contains("- name: varchar (phone model name"));
        assert_eq!(rendered.matches("\n- ").count(), schema.fields().len());
    }

    #[test]
    fn test_from_toml() {
        let schema = SchemaDescriptor::from_toml_str(
            r#"
            relation = "phones"

            [[fields]]
            name = "name"
            type = "text"
            description = "model name"

            [[fields]]
            name = "has_5g"
            type = "boolean"
            description = "5G support"

            [[fields]]
            name = "model"
            type = { varchar = 64 }
            description = "model number"
            "#,
        )
        .unwrap();

        assert_eq!(schema.relation(), "phones");
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.field("has_5g").unwrap().field_type, FieldType::Boolean);
        assert_eq!(schema.field("model").unwrap().field_type.sql_type(), "VARCHAR(64)");
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let result = SchemaDescriptor::new(
            "phones",
            vec![
                FieldDescriptor::new("name", FieldType::Text, "a"),
                FieldDescriptor::new("Name", FieldType::Text, "b"),
            ],
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_schema() {
        assert!(SchemaDescriptor::new("phones", vec![]).is_err());
        assert!(SchemaDescriptor::new(" ", vec![FieldDescriptor::new("a", FieldType::Text, "")]).is_err());
    }
}
