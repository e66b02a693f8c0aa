use anyhow::{anyhow, Context, Result};
use chrono::DateTime;

use crate::note::Note;

fn format_created(created: &str) -> Result<String> {
    let millis: i64 = created
        .trim()
        .parse()
        .with_context(|| format!("invalid creation timestamp {created:?}"))?;
    let created_at = DateTime::from_timestamp(millis / 1000, 0)
        .ok_or_else(|| anyhow!("creation timestamp {created:?} is out of range"))?;
    Ok(created_at.format("%Y-%m-%d %H:%M:%S %z UTC").to_string())
}

/// Renders the `#+KEY: value` header block that precedes a note's body.
pub fn properties(note: &Note) -> Result<String> {
    let mut out = String::new();
    let attr = &note.attributes;

    out.push_str(&format!("#+TITLE: {}\n", note.title));
    out.push_str("#+STARTUP: showall\n");

    if !attr.author.is_empty() {
        out.push_str(&format!("#+AUTHOR: {}\n", attr.author));
    }
    if !note.tags.is_empty() {
        out.push_str(&format!("#+TAGS: {}\n", note.tags.join(" ")));
    }
    if !note.created.is_empty() {
        let created = format_created(&note.created)
            .with_context(|| format!("note {:?}", note.title))?;
        out.push_str(&format!("#+DATE: {created}\n"));
    }
    if attr.latitude > 0.0 {
        out.push_str(&format!("#+LAT: {:.6}\n", attr.latitude));
        out.push_str(&format!("#+LON: {:.6}\n", attr.longitude));
    }
    if !attr.source.is_empty() {
        out.push_str(&format!("#+SOURCE: {}\n", attr.source));
    }
    if !attr.source_url.is_empty() {
        out.push_str(&format!("#+DESCRIPTION: {}\n", attr.source_url));
    }
    if !note.guid.is_empty() {
        // Best effort: the query parameters are undocumented and the service
        // corrects `s` on its own. Archives carry no real share link.
        out.push_str(&format!(
            "#+EVERNOTE_URL: https://evernote.com/Home.action#n={}&s=s1&ses=4&sh=2\n",
            note.guid
        ));
    }

    Ok(out)
}
