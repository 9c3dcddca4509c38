//! Decoding of CGI replies.
//!
//! A reply is a small XML document:
//!
//! ```text
//! <CGI_Result>
//!     <result>0</result>
//!     <isDHCP>1</isDHCP>
//!     <ip>192.168.1.20</ip>
//! </CGI_Result>
//! ```
//!
//! The `result` element supplies the code, every other element becomes a
//! field in document order with its text percent-decoded.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

use super::code::ResultCode;
use super::map::Fields;

/// Tag of the element carrying the status code.
pub const RESULT_TAG: &str = "result";

/// Tag of the envelope wrapping every reply.
pub const ENVELOPE_TAG: &str = "CGI_Result";

/// Why a reply body could not be decoded.
///
/// Reported to callers as `ResultCode::Unavailable`; kept distinct for logging.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty document")]
    Empty,

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("document truncated inside <{0}>")]
    Truncated(String),

    #[error("content after the root element")]
    TrailingContent,

    #[error("non-numeric result code '{0}'")]
    BadCode(String),
}

/// Payload carried by a [`CommandResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Decoded reply fields.
    Fields(Fields),
    /// Untouched body of a raw-mode command.
    Raw(Vec<u8>),
    /// Nothing usable came back.
    None,
}

/// Decoded outcome of one command.
///
/// Always check [`CommandResult::code`] before trusting the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub code: ResultCode,
    pub payload: Payload,
}

impl CommandResult {
    pub fn new(code: ResultCode, fields: Fields) -> Self {
        Self {
            code,
            payload: Payload::Fields(fields),
        }
    }

    pub fn raw(bytes: Vec<u8>) -> Self {
        Self {
            code: ResultCode::Success,
            payload: Payload::Raw(bytes),
        }
    }

    /// Result for any transport or decode failure.
    pub fn unavailable() -> Self {
        Self {
            code: ResultCode::Unavailable,
            payload: Payload::None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    pub fn fields(&self) -> Option<&Fields> {
        match &self.payload {
            Payload::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_fields(self) -> Option<Fields> {
        match self.payload {
            Payload::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn into_raw_bytes(self) -> Option<Vec<u8>> {
        match self.payload {
            Payload::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Decode a reply body. Never fails: errors collapse to `Unavailable`.
pub fn decode(body: &[u8], raw: bool) -> CommandResult {
    if raw {
        return CommandResult::raw(body.to_vec());
    }
    match parse_reply(body) {
        Ok((code, fields)) => CommandResult::new(code, fields),
        Err(e) => {
            tracing::warn!("Failed to decode CGI reply: {e}");
            CommandResult::unavailable()
        }
    }
}

/// Element being read. Text is recorded only until the first child starts.
struct Open {
    tag: String,
    /// Position in `fields`, or `None` for the root and `result`.
    slot: Option<String>,
    is_result: bool,
    text: Option<String>,
    saw_child: bool,
}

/// Parse a reply into its code and ordered fields.
pub fn parse_reply(body: &[u8]) -> Result<(ResultCode, Fields), DecodeError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut fields = Fields::new();
    let mut code = ResultCode::Unknown;
    let mut root_closed = false;
    let mut saw_root = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| DecodeError::Xml(e.to_string()))?
        {
            Event::Start(e) => {
                let tag = tag_name(e.name().as_ref());
                if root_closed {
                    return Err(DecodeError::TrailingContent);
                }
                open_element(&mut stack, &mut fields, tag, &mut saw_root);
            }
            Event::Empty(e) => {
                let tag = tag_name(e.name().as_ref());
                if root_closed {
                    return Err(DecodeError::TrailingContent);
                }
                open_element(&mut stack, &mut fields, tag, &mut saw_root);
                close_element(&mut stack, &mut fields, &mut code)?;
                root_closed = stack.is_empty();
            }
            Event::End(_) => {
                close_element(&mut stack, &mut fields, &mut code)?;
                root_closed = stack.is_empty();
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|err| DecodeError::Xml(err.to_string()))?;
                push_text(&mut stack, text, root_closed)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                push_text(&mut stack, Cow::Owned(text), root_closed)?;
            }
            Event::Eof => break,
            // Declarations, comments and processing instructions carry no data.
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::Truncated(open.tag.clone()));
    }
    if !saw_root {
        return Err(DecodeError::Empty);
    }

    Ok((code, fields))
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn open_element(stack: &mut Vec<Open>, fields: &mut Fields, tag: String, saw_root: &mut bool) {
    if let Some(parent) = stack.last_mut() {
        parent.saw_child = true;
    }

    let is_root = stack.is_empty();
    *saw_root = true;
    let is_result = tag == RESULT_TAG;
    let slot = if is_root || is_result || tag == ENVELOPE_TAG {
        None
    } else {
        // Reserve the position now so document order wins over close order.
        fields.insert(tag.clone(), None);
        Some(tag.clone())
    };

    stack.push(Open {
        tag,
        slot,
        is_result,
        text: None,
        saw_child: false,
    });
}

fn close_element(stack: &mut Vec<Open>, fields: &mut Fields, code: &mut ResultCode) -> Result<(), DecodeError> {
    let Some(open) = stack.pop() else {
        return Err(DecodeError::Xml("unexpected closing tag".to_string()));
    };

    if open.is_result {
        let text = open.text.unwrap_or_default();
        let value = text
            .trim()
            .parse::<i32>()
            .map_err(|_| DecodeError::BadCode(text.clone()))?;
        *code = ResultCode::from_i32(value);
    } else if let Some(key) = open.slot {
        let value = open.text.map(|text| percent_decode(&text));
        fields.insert(key, value);
    }
    Ok(())
}

fn push_text(stack: &mut [Open], text: Cow<'_, str>, root_closed: bool) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(open) if !open.saw_child => {
            open.text.get_or_insert_with(String::new).push_str(&text);
            Ok(())
        }
        Some(_) => Ok(()),
        None if text.trim().is_empty() => Ok(()),
        None if root_closed => Err(DecodeError::TrailingContent),
        None => Err(DecodeError::Xml("text outside the root element".to_string())),
    }
}

/// Percent-decode a field value. `+` is left alone and invalid UTF-8 is replaced.
fn percent_decode(text: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(text.as_bytes())).into_owned()
}
