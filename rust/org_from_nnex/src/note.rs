use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct Archive {
    #[serde(rename = "Note", default)]
    notes: Vec<Note>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Note {
    #[serde(rename = "Guid", default)]
    pub guid: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Content", default)]
    pub content: String,
    /// Epoch milliseconds, string-encoded.
    #[serde(rename = "Created", default)]
    pub created: String,
    #[serde(rename = "Tag", default)]
    pub tags: Vec<String>,
    #[serde(rename = "Attributes", default)]
    pub attributes: NoteAttributes,
    #[serde(rename = "NoteResource", default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteAttributes {
    #[serde(rename = "Author", default)]
    pub author: String,
    #[serde(rename = "Latitude", default, deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(rename = "Longitude", default, deserialize_with = "lenient_f64")]
    pub longitude: f64,
    #[serde(rename = "Source", default)]
    pub source: String,
    #[serde(rename = "SourceUrl", default)]
    pub source_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resource {
    #[serde(rename = "Mime", default)]
    pub mime: String,
    #[serde(rename = "Data", default)]
    pub data: ResourceData,
    #[serde(rename = "ResourceAttributes", default)]
    pub attributes: ResourceAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceData {
    /// Hex-encoded payload.
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "BodyHash", default)]
    pub hash: String,
    #[serde(rename = "@encoding", default)]
    pub encoding: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceAttributes {
    #[serde(rename = "FileName", default)]
    pub file_name: String,
}

fn single_component(name: &str) -> Option<&str> {
    Path::new(name).file_name().and_then(|n| n.to_str())
}

impl Resource {
    /// Name the attachment is written and linked under.
    ///
    /// Only the last path component of `FileName` is kept, so a name can never
    /// leave the note's media directory. Falls back to the hash when nothing
    /// usable is left, and to `""` when the hash is not usable either.
    pub fn display_name(&self) -> &str {
        single_component(&self.attributes.file_name)
            .or_else(|| single_component(&self.data.hash))
            .unwrap_or("")
    }

    pub fn decode_body(&self) -> Result<Vec<u8>> {
        // Exporters wrap long payloads across lines.
        let compact: String = self
            .data
            .body
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        hex::decode(compact).with_context(|| {
            format!(
                "decode {} payload of resource {}",
                self.mime,
                self.display_name()
            )
        })
    }
}

// Empty coordinate elements mean "unset".
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>().map_err(serde::de::Error::custom)
}

pub fn parse_archive(xml: &str) -> Result<Vec<Note>> {
    let archive: Archive = quick_xml::de::from_str(xml).context("parse note archive")?;
    Ok(archive.notes)
}
