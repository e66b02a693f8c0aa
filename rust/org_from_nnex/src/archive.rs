use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::attachments::AttachmentResolver;
use crate::note::{parse_archive, Note};
use crate::properties::properties;
use crate::sanitize::sanitize_title;
use crate::tokens::tokenize;
use crate::translate::translate;

pub const NOTE_EXTENSION: &str = "org";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub notes: usize,
    pub attachments: usize,
}

/// Sibling directory of the archive, named after its file stem.
pub fn output_dir_for(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    match input.parent() {
        Some(parent) => parent.join(stem),
        None => PathBuf::from(stem),
    }
}

/// Converts one note: writes its attachments (if any) and its `.org` file.
/// Returns the number of attachments written.
pub fn convert_note(note: &Note, out_dir: &Path) -> Result<usize> {
    let stem = sanitize_title(&note.title);
    let media_dir = out_dir.join(&stem);
    let tokens = tokenize(&note.content);
    let attachments = AttachmentResolver::from_resources(&note.resources);

    if !note.resources.is_empty() {
        fs::create_dir_all(&media_dir)
            .with_context(|| format!("create {}", media_dir.display()))?;
        for res in &note.resources {
            let bytes = res.decode_body()?;
            let name = res.display_name();
            if name.is_empty() {
                bail!("resource {:?} has no usable file name or hash", res.attributes.file_name);
            }
            let path = media_dir.join(name);
            fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        }
    }

    let mut doc = properties(note)?;
    doc.push_str(&translate(&tokens, &attachments, &media_dir));

    let note_path = out_dir.join(format!("{stem}.{NOTE_EXTENSION}"));
    fs::write(&note_path, doc).with_context(|| format!("write {}", note_path.display()))?;
    debug!(
        title = %note.title,
        path = %note_path.display(),
        attachments = note.resources.len(),
        "note written"
    );

    Ok(note.resources.len())
}

/// Converts every note of the archive at `input`.
///
/// Output goes to `out_dir`, or to [`output_dir_for`] when unset. The first
/// failure aborts the run; notes already written stay on disk.
pub fn convert_archive(input: &Path, out_dir: Option<&Path>) -> Result<Summary> {
    let xml = fs::read_to_string(input).with_context(|| format!("open {}", input.display()))?;

    let out_dir = out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir_for(input));
    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir.display()))?;

    let notes = parse_archive(&xml).with_context(|| format!("read {}", input.display()))?;
    info!(notes = notes.len(), out_dir = %out_dir.display(), "converting archive");

    let mut summary = Summary::default();
    for note in &notes {
        summary.attachments += convert_note(note, &out_dir)
            .with_context(|| format!("convert note {:?}", note.title))?;
        summary.notes += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Resource, ResourceAttributes, ResourceData};
    use tempfile::TempDir;

    fn note(title: &str, content: &str) -> Note {
        Note {
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn png(hash: &str, name: &str, body: &str) -> Resource {
        Resource {
            mime: "image/png".to_string(),
            data: ResourceData {
                body: body.to_string(),
                hash: hash.to_string(),
                encoding: "hex".to_string(),
            },
            attributes: ResourceAttributes {
                file_name: name.to_string(),
            },
        }
    }

    fn subdirs(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().is_dir())
            .count()
    }

    #[test]
    fn output_dir_is_sibling_named_after_stem() {
        assert_eq!(
            output_dir_for(Path::new("/data/exports/notes.nnex")),
            PathBuf::from("/data/exports/notes")
        );
        assert_eq!(output_dir_for(Path::new("notes.nnex")), PathBuf::from("notes"));
    }

    #[test]
    fn note_without_attachments_creates_no_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let written = convert_note(&note("Plain Note", "<p>hi</p>"), tmp.path()).unwrap();

        assert_eq!(written, 0);
        assert_eq!(subdirs(tmp.path()), 0);
        let doc = fs::read_to_string(tmp.path().join("plain-note.org")).unwrap();
        assert_eq!(doc, "#+TITLE: Plain Note\n#+STARTUP: showall\n\nhi");
    }

    #[test]
    fn attachments_are_decoded_and_linked() {
        let tmp = TempDir::new().unwrap();
        let mut n = note("Photo: Day 1", r#"<en-note><en-media hash="aa"/><en-media hash="bb"/></en-note>"#);
        n.resources = vec![png("aa", "one.png", "4869"), png("bb", "", "21")];

        let written = convert_note(&n, tmp.path()).unwrap();
        assert_eq!(written, 2);

        let media = tmp.path().join("photo-day-1");
        assert_eq!(fs::read(media.join("one.png")).unwrap(), b"Hi");
        assert_eq!(fs::read(media.join("bb")).unwrap(), b"!");

        let doc = fs::read_to_string(tmp.path().join("photo-day-1.org")).unwrap();
        assert!(doc.ends_with("\n[[./photo-day-1/one.png]]\n[[./photo-day-1/bb]]"));
    }

    #[test]
    fn attachment_names_cannot_leave_the_media_directory() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let absolute = elsewhere.path().join("escaped.bin");
        let mut n = note("Escape", r#"<en-media hash="aa"/><en-media hash="bb"/>"#);
        n.resources = vec![
            png("aa", absolute.to_str().unwrap(), "4869"),
            png("bb", "../../up.bin", "21"),
        ];

        assert_eq!(convert_note(&n, tmp.path()).unwrap(), 2);
        assert!(!absolute.exists());
        assert_eq!(fs::read_dir(elsewhere.path()).unwrap().count(), 0);
        assert!(!tmp.path().join("up.bin").exists());

        let media = tmp.path().join("escape");
        assert_eq!(fs::read(media.join("escaped.bin")).unwrap(), b"Hi");
        assert_eq!(fs::read(media.join("up.bin")).unwrap(), b"!");
        let doc = fs::read_to_string(tmp.path().join("escape.org")).unwrap();
        assert!(doc.ends_with("\n[[./escape/escaped.bin]]\n[[./escape/up.bin]]"));
    }

    #[test]
    fn resource_without_usable_name_aborts_note() {
        let tmp = TempDir::new().unwrap();
        let mut n = note("Nameless", "");
        n.resources = vec![png("..", "..", "4869")];
        assert!(convert_note(&n, tmp.path()).is_err());
        assert!(!tmp.path().join("nameless.org").exists());
    }

    #[test]
    fn bad_payload_aborts_note() {
        let tmp = TempDir::new().unwrap();
        let mut n = note("Broken", "");
        n.resources = vec![png("aa", "x.bin", "not hex")];
        assert!(convert_note(&n, tmp.path()).is_err());
        assert!(!tmp.path().join("broken.org").exists());
    }

    #[test]
    fn converts_archive_and_counts() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("export.nnex");
        fs::write(
            &input,
            r#"<export>
  <Note><Title>One</Title><Content><![CDATA[<h1>Head</h1>]]></Content></Note>
  <Note>
    <Title>Two</Title>
    <Content><![CDATA[<en-media hash="h"/>]]></Content>
    <NoteResource><Mime>text/plain</Mime><Data><Body>6f6b</Body><BodyHash>h</BodyHash></Data></NoteResource>
  </Note>
</export>"#,
        )
        .unwrap();

        let summary = convert_archive(&input, None).unwrap();
        assert_eq!(
            summary,
            Summary {
                notes: 2,
                attachments: 1
            }
        );

        let out = tmp.path().join("export");
        let one = fs::read_to_string(out.join("one.org")).unwrap();
        assert!(one.ends_with("\n** Head"));
        assert_eq!(fs::read(out.join("two").join("h")).unwrap(), b"ok");
        let two = fs::read_to_string(out.join("two.org")).unwrap();
        assert!(two.ends_with("\n[[./two/h]]"));
    }

    #[test]
    fn colliding_titles_overwrite() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("dup.xml");
        fs::write(
            &input,
            "<export><Note><Title>Same</Title><Content>first</Content></Note>\
             <Note><Title>same?</Title><Content>second</Content></Note></export>",
        )
        .unwrap();

        let out = tmp.path().join("custom");
        let summary = convert_archive(&input, Some(&out)).unwrap();
        assert_eq!(summary.notes, 2);
        let doc = fs::read_to_string(out.join("same.org")).unwrap();
        assert!(doc.ends_with("second"));
    }

    #[test]
    fn missing_archive_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = convert_archive(&tmp.path().join("nope.nnex"), None).unwrap_err();
        assert!(err.to_string().starts_with("open "));
    }

    #[test]
    fn malformed_timestamp_aborts_run() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("bad.nnex");
        fs::write(
            &input,
            "<export><Note><Title>T</Title><Created>yesterday</Created></Note></export>",
        )
        .unwrap();
        assert!(convert_archive(&input, None).is_err());
    }
}
