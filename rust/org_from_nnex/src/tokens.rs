use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token as RawToken, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts,
};
use std::cell::RefCell;
use tracing::trace;

/// Tag kinds the translator knows how to handle.
///
/// Names are resolved once here so the translator matches over a closed set
/// instead of comparing strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagName {
    Note,
    Media,
    Todo,
    LineBreak,
    Rule,
    Anchor,
    Paragraph,
    Underline,
    Italic,
    Bold,
    Strike,
    Heading(u8),
    Table,
    TableRow,
    TableCell,
    OrderedList,
    UnorderedList,
    ListItem,
    InlineCode,
    Preformatted,
    Blockquote,
    /// Known tags that carry no markup of their own.
    Ignored,
    Unrecognized(String),
}

impl TagName {
    pub fn from_name(name: &str) -> TagName {
        match name {
            "en-note" => TagName::Note,
            "en-media" => TagName::Media,
            "en-todo" => TagName::Todo,
            "br" => TagName::LineBreak,
            "hr" => TagName::Rule,
            "a" => TagName::Anchor,
            "p" | "div" => TagName::Paragraph,
            "u" => TagName::Underline,
            "i" => TagName::Italic,
            "b" | "strong" | "em" => TagName::Bold,
            "del" => TagName::Strike,
            "h1" => TagName::Heading(1),
            "h2" => TagName::Heading(2),
            "h3" => TagName::Heading(3),
            "h4" => TagName::Heading(4),
            "h5" => TagName::Heading(5),
            "h6" => TagName::Heading(6),
            "table" => TagName::Table,
            "tr" => TagName::TableRow,
            "td" => TagName::TableCell,
            "ol" => TagName::OrderedList,
            "ul" => TagName::UnorderedList,
            "li" => TagName::ListItem,
            "code" | "tt" | "kbd" => TagName::InlineCode,
            "pre" => TagName::Preformatted,
            "blockquote" => TagName::Blockquote,
            "span" | "tbody" | "abbr" | "th" | "thead" | "ins" | "img" | "sup" | "sub"
            | "small" | "dl" | "dd" | "dt" | "font" | "colgroup" | "cite" | "address" | "s"
            | "map" | "area" | "center" | "q" => TagName::Ignored,
            other => TagName::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: TagName,
        attrs: Vec<(String, String)>,
    },
    EndTag {
        name: TagName,
    },
    SelfClosingTag {
        name: TagName,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    EndOfStream,
}

impl Token {
    /// First attribute named `key`, if this is a tag that carries attributes.
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Token::StartTag { attrs, .. } | Token::SelfClosingTag { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

// Without a tree builder the tokenizer never leaves the data state on its
// own, so the sink switches it for elements whose content is not markup.
fn content_mode(name: &str) -> TokenSinkResult<()> {
    match name {
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

#[derive(Default)]
struct Collector {
    tokens: RefCell<Vec<Token>>,
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&self, token: RawToken, line_number: u64) -> TokenSinkResult<()> {
        let mut tokens = self.tokens.borrow_mut();
        let mut result = TokenSinkResult::Continue;
        match token {
            RawToken::TagToken(tag) => {
                if tag.kind == TagKind::StartTag && !tag.self_closing {
                    result = content_mode(&tag.name);
                }
                let name = TagName::from_name(&tag.name);
                let attrs: Vec<(String, String)> = tag
                    .attrs
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                tokens.push(match (tag.kind, tag.self_closing) {
                    (TagKind::EndTag, _) => Token::EndTag { name },
                    (TagKind::StartTag, true) => Token::SelfClosingTag { name, attrs },
                    (TagKind::StartTag, false) => Token::StartTag { name, attrs },
                });
            }
            RawToken::CharacterTokens(text) => {
                // The tokenizer splits text around character references.
                if let Some(Token::Text(prev)) = tokens.last_mut() {
                    prev.push_str(&text);
                } else {
                    tokens.push(Token::Text(text.to_string()));
                }
            }
            RawToken::ParseError(err) => {
                trace!(line = line_number, error = %err, "markup parse error");
            }
            RawToken::DoctypeToken(_)
            | RawToken::CommentToken(_)
            | RawToken::NullCharacterToken
            | RawToken::EOFToken => {}
        }
        result
    }
}

/// Tokenizes note markup into a finite sequence ending in `EndOfStream`.
pub fn tokenize(markup: &str) -> Vec<Token> {
    let tokenizer = Tokenizer::new(Collector::default(), TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(markup));
    // The sink never asks for a script pause, so one feed consumes everything.
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    let mut tokens = tokenizer.sink.tokens.take();
    tokens.push(Token::EndOfStream);
    tokens
}
