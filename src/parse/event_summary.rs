use quick_xml::events::Event;

use std::fmt;

/// owned description of an xml event, kept around for error messages after
/// the read buffer has been reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EventSummary {
    name: Option<String>,
    e_type: &'static str,
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "element {name} with type {}", self.e_type),
            None => write!(f, "unnamed element with type {}", self.e_type),
        }
    }
}

impl EventSummary {
    pub(crate) fn new(name: Option<&str>, e_type: &'static str) -> Self {
        Self {
            name: name.map(str::to_string),
            e_type,
        }
    }

    pub(crate) fn eof() -> Self {
        Self::new(None, "eof")
    }
}

pub(crate) fn event_type(event: &Event) -> &'static str {
    match event {
        Event::Start(_) => "start",
        Event::End(_) => "end",
        Event::Empty(_) => "empty",
        Event::Text(_) => "text",
        Event::Comment(_) => "comment",
        Event::CData(_) => "cdata",
        Event::Decl(_) => "decl",
        Event::PI(_) => "pi",
        Event::DocType(_) => "doctype",
        Event::Eof => "eof",
    }
}
