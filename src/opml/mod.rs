//! OPML subscription lists, used once to seed an empty cache.
//!
//! An `outline` without `xmlUrl` opens a page; outlines carrying `xmlUrl`
//! inside it become that page's feeds.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::app::{EddyError, Result};
use crate::domain::{Feed, Page};

/// Subscription list shipped with the application.
pub const BUNDLED_OPML: &str = include_str!("../../resources/sample-opml.xml");

enum Open {
    Page(usize),
    Other,
}

pub fn parse_opml(content: &str) -> Result<Vec<Page>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<Page> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"outline" => {
                let open = handle_outline(&e, &mut pages, &stack)?;
                stack.push(open);
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"outline" => {
                handle_outline(&e, &mut pages, &stack)?;
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"outline" => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(EddyError::OpmlParse(format!("XML parse error: {}", e))),
            _ => {}
        }
    }

    Ok(pages)
}

fn handle_outline(element: &BytesStart, pages: &mut Vec<Page>, stack: &[Open]) -> Result<Open> {
    let title = attribute(element, "title")?.or(attribute(element, "text")?);

    match attribute(element, "xmlUrl")? {
        None => {
            pages.push(Page::new(title.unwrap_or_default()));
            Ok(Open::Page(pages.len() - 1))
        }
        Some(url) => {
            // Feeds outside any page have nowhere to go.
            let owner = stack.iter().rev().find_map(|open| match open {
                Open::Page(index) => Some(*index),
                Open::Other => None,
            });
            match owner {
                Some(index) => {
                    let title = title.unwrap_or_else(|| url.clone());
                    pages[index].feeds.push(Feed::new(url, title));
                }
                None => tracing::debug!("Skipping top-level feed outline {}", url),
            }
            Ok(Open::Other)
        }
    }
}

fn attribute(element: &BytesStart, name: &str) -> Result<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| EddyError::OpmlParse(format!("Invalid attribute: {}", e)))?;

    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| EddyError::OpmlParse(format!("Invalid attribute value: {}", e)))
    })
    .transpose()
}
