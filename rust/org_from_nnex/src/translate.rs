use std::path::Path;

use tracing::debug;

use crate::attachments::AttachmentResolver;
use crate::tokens::{TagName, Token};

const RULE: &str = "\n------------------------------------\n";
const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    /// Holds the number the next item will get.
    Ordered(usize),
}

struct TranslationState<'a> {
    output: String,
    // Not a real nesting depth: headings cannot nest. Non-zero means we are
    // inside a heading label, where links are not emitted.
    heading_depth: usize,
    // Tracked only; table markup comes from cells and rows.
    table_depth: usize,
    lists: Vec<ListKind>,
    in_verbatim: bool,
    attachments: &'a AttachmentResolver,
    media_dir_name: String,
}

impl<'a> TranslationState<'a> {
    fn new(attachments: &'a AttachmentResolver, media_dir: &Path) -> Self {
        let media_dir_name = media_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        TranslationState {
            output: String::new(),
            heading_depth: 0,
            table_depth: 0,
            lists: Vec::new(),
            in_verbatim: false,
            attachments,
            media_dir_name,
        }
    }

    fn media_link(&mut self, token: &Token) {
        // Unknown hashes still produce a link, just with an empty file name.
        let attachments = self.attachments;
        let file_name = token
            .attr("hash")
            .and_then(|h| attachments.resolve(h))
            .unwrap_or("");
        self.output
            .push_str(&format!("\n[[./{}/{}]]", self.media_dir_name, file_name));
    }

    fn inline_code(&mut self) {
        if !self.in_verbatim {
            self.output.push('~');
        }
    }

    fn self_closing(&mut self, name: &TagName, token: &Token) {
        match name {
            TagName::Media => self.media_link(token),
            TagName::Todo => match token.attr("checked") {
                Some("true") => self.output.push_str("\n- [X] "),
                Some("false") => self.output.push_str("\n- [ ] "),
                _ => {}
            },
            TagName::LineBreak => self.output.push('\n'),
            TagName::Rule => self.output.push_str(RULE),
            _ => {}
        }
    }

    fn start(&mut self, name: &TagName, token: &Token) {
        match name {
            TagName::Anchor => {
                if self.heading_depth == 0 {
                    let href = token.attr("href").unwrap_or("");
                    self.output.push_str(&format!("[[{href}]["));
                }
            }
            TagName::Paragraph => self.output.push('\n'),
            TagName::Underline => self.output.push('_'),
            TagName::Italic => self.output.push('/'),
            TagName::Bold => self.output.push('*'),
            TagName::Strike => self.output.push('+'),
            TagName::Heading(level) => {
                self.output.push('\n');
                for _ in 0..=*level {
                    self.output.push('*');
                }
                self.output.push(' ');
                self.heading_depth += 1;
            }
            TagName::Note | TagName::Ignored | TagName::LineBreak | TagName::TableRow => {}
            TagName::Rule => self.output.push_str(RULE),
            TagName::Media => self.media_link(token),
            TagName::Table => self.table_depth += 1,
            TagName::TableCell => self.output.push('|'),
            TagName::OrderedList => self.lists.push(ListKind::Ordered(1)),
            TagName::UnorderedList => self.lists.push(ListKind::Unordered),
            TagName::ListItem => self.list_item(),
            TagName::InlineCode => self.inline_code(),
            TagName::Preformatted => {
                self.output.push_str("\n#+BEGIN_SRC\n");
                self.in_verbatim = true;
            }
            TagName::Blockquote => self.output.push_str("\n#+BEGIN_QUOTE\n"),
            TagName::Todo => debug!(tag = "en-todo", "skip token"),
            TagName::Unrecognized(tag) => {
                debug!(tag = %tag, "skip token");
            }
        }
    }

    fn list_item(&mut self) {
        self.output.push('\n');
        // Indentation already counts the list this item belongs to.
        for _ in 0..=self.lists.len() {
            self.output.push_str(INDENT);
        }
        match self.lists.last_mut() {
            Some(ListKind::Unordered) => self.output.push_str("- "),
            Some(ListKind::Ordered(next)) => {
                self.output.push_str(&format!("{next}."));
                *next += 1;
            }
            None => {}
        }
    }

    fn end(&mut self, name: &TagName) {
        match name {
            TagName::Underline => self.output.push('_'),
            TagName::Italic => self.output.push('/'),
            TagName::Bold => self.output.push('*'),
            TagName::Strike => self.output.push('+'),
            TagName::Anchor => {
                if self.heading_depth == 0 {
                    self.output.push_str("]]");
                }
            }
            TagName::Heading(_) => self.heading_depth = self.heading_depth.saturating_sub(1),
            TagName::Table => self.table_depth = self.table_depth.saturating_sub(1),
            TagName::TableRow => self.output.push_str("|\n"),
            TagName::OrderedList | TagName::UnorderedList => {
                self.lists.pop();
            }
            TagName::InlineCode => self.inline_code(),
            TagName::Preformatted => {
                self.output.push_str("\n#+END_SRC\n");
                self.in_verbatim = false;
            }
            TagName::Blockquote => self.output.push_str("\n#+END_QUOTE\n"),
            _ => {}
        }
    }
}

/// Translates one note's token stream into Org markup.
///
/// `media_dir` is the note's attachment directory; only its last component
/// ends up in links, since notes are written next to that directory.
/// Malformed or unexpected input degrades the output and never fails.
pub fn translate(tokens: &[Token], attachments: &AttachmentResolver, media_dir: &Path) -> String {
    let mut state = TranslationState::new(attachments, media_dir);

    for token in tokens {
        match token {
            Token::SelfClosingTag { name, .. } => state.self_closing(name, token),
            Token::StartTag { name, .. } => state.start(name, token),
            Token::EndTag { name } => state.end(name),
            Token::Text(text) => state.output.push_str(text),
            Token::EndOfStream => break,
        }
    }

    state.output
}
