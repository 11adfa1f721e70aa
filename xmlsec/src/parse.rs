/*
 * Copyright (c) 2021 gematik GmbH
 * 
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * 
 *    http://www.apache.org/licenses/LICENSE-2.0
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

use std::borrow::Cow;
use std::str::{from_utf8, FromStr};

use quick_xml::{
    escape::unescape,
    events::{BytesStart, Event},
    Error as XmlError, Reader,
};

use crate::{Attribute, Element, Error, Namespace};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parses a document into its root element.
///
/// Comments, processing instructions and the XML declaration are dropped,
/// everything else (including whitespace between elements) is kept.
///
/// Line breaks are normalized to `\n` and attribute values are normalized
/// as required by XML 1.0 (2.11 and 3.3.3) before they are unescaped.
pub fn parse(xml: &str) -> Result<Element, Error> {
    let xml = normalize_line_endings(xml);
    let mut reader = Reader::from_str(&xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let element = open(&start, &stack)?;

                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open(&start, &stack)?;

                close(element, &mut stack, &mut root)?;
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    Error::UnexpectedClosingTag(String::from_utf8_lossy(end.name().as_ref()).into())
                })?;

                close(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(from_utf8(&data)?);
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }

    if !stack.is_empty() {
        return Err(Error::UnexpectedEndOfDocument);
    }

    root.ok_or(Error::NoRootElement)
}

impl FromStr for Element {
    type Err = Error;

    fn from_str(xml: &str) -> Result<Self, Self::Err> {
        parse(xml)
    }
}

fn open(start: &BytesStart, stack: &[Element]) -> Result<Element, Error> {
    let qname = from_utf8(start.name().as_ref())?.to_owned();

    let mut namespaces = Vec::new();
    let mut plain = Vec::new();
    for attrib in start.attributes() {
        let attrib = attrib.map_err(XmlError::from)?;
        let key = from_utf8(attrib.key.as_ref())?.to_owned();
        let value = normalize_attribute_value(from_utf8(&attrib.value)?)?;

        if key == "xmlns" {
            namespaces.push(Namespace::default_ns(&value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            namespaces.push(Namespace::new(prefix, &value));
        } else {
            plain.push((key, value));
        }
    }

    let (prefix, name) = split(&qname);
    let href = resolve(prefix, &namespaces, stack)?;

    let mut attributes = Vec::with_capacity(plain.len());
    for (key, value) in plain {
        let (attrib_prefix, attrib_name) = split(&key);
        let attrib_href = match attrib_prefix {
            Some(p) => resolve(Some(p), &namespaces, stack)?,
            None => None,
        };

        attributes.push(Attribute {
            prefix: attrib_prefix.map(Into::into),
            href: attrib_href,
            name: attrib_name.into(),
            value,
        });
    }

    Ok(Element {
        prefix: prefix.map(Into::into),
        href,
        name: name.into(),
        namespaces,
        attributes,
        children: Vec::new(),
    })
}

fn normalize_line_endings(xml: &str) -> Cow<'_, str> {
    if !xml.contains('\r') {
        return Cow::Borrowed(xml);
    }

    Cow::Owned(xml.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Literal whitespace is replaced on the raw value, so character references
/// like `&#9;` still produce the referenced character.
fn normalize_attribute_value(raw: &str) -> Result<String, Error> {
    let raw = raw.replace(['\t', '\n', '\r'], " ");
    let value = unescape(&raw).map_err(XmlError::from)?;

    Ok(value.into_owned())
}

fn close(element: Element, stack: &mut Vec<Element>, root: &mut Option<Element>) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::MultipleRootElements),
    }

    Ok(())
}

fn split(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

fn resolve(
    prefix: Option<&str>,
    own: &[Namespace],
    stack: &[Element],
) -> Result<Option<String>, Error> {
    if prefix == Some("xml") {
        return Ok(Some(XML_NAMESPACE.into()));
    }

    let found = own
        .iter()
        .chain(stack.iter().rev().flat_map(|e| e.namespaces.iter()))
        .find(|ns| ns.prefix.as_deref() == prefix);

    match (found, prefix) {
        (Some(ns), _) if ns.href.is_empty() => Ok(None),
        (Some(ns), _) => Ok(Some(ns.href.clone())),
        (None, None) => Ok(None),
        (None, Some(prefix)) => Err(Error::UnboundPrefix(prefix.into())),
    }
}
