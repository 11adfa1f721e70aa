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

use crate::{Element, Error, Node};

/* C14nMethod */

#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum C14nMethod {
    C14n_Exclusive_1_0,
}

impl C14nMethod {
    pub fn uri(&self) -> &'static str {
        match self {
            C14nMethod::C14n_Exclusive_1_0 => "http://www.w3.org/2001/10/xml-exc-c14n#",
        }
    }

    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        match uri {
            "http://www.w3.org/2001/10/xml-exc-c14n#" => Ok(C14nMethod::C14n_Exclusive_1_0),
            uri => Err(Error::UnknownCanonizationMethod(uri.into())),
        }
    }
}

/* Rendered */

/// Namespace bindings already written by the output ancestors.
#[derive(Default, Clone)]
struct Rendered(Vec<(Option<String>, String)>);

impl Rendered {
    fn get(&self, prefix: Option<&str>) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, href)| href.as_str())
    }

    fn set(&mut self, prefix: Option<&str>, href: &str) {
        self.0.push((prefix.map(Into::into), href.into()));
    }
}

impl Element {
    /// Canonical form of this element and its descendants.
    pub fn canonicalize(&self, method: C14nMethod) -> Vec<u8> {
        let mut out = String::new();

        match method {
            C14nMethod::C14n_Exclusive_1_0 => exclusive(self, &Rendered::default(), &mut out),
        }

        out.into_bytes()
    }

    /// Serializes the element with the namespace declarations it carries.
    ///
    /// Text and attribute values are escaped the same way as in the canonical
    /// form, so a document written by this function canonicalizes back to the
    /// bytes that were hashed while building it.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        plain(self, &mut out);

        out
    }

    pub fn to_document(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>{}",
            self.to_xml()
        )
    }
}

fn exclusive(element: &Element, rendered: &Rendered, out: &mut String) {
    let mut rendered = rendered.clone();
    let mut decls: Vec<(Option<&str>, &str)> = Vec::new();

    // Element name utilizes its prefix (or the default namespace)
    let prefix = element.prefix.as_deref();
    let href = element.href.as_deref().unwrap_or("");
    match rendered.get(prefix) {
        Some(v) if v == href => (),
        None if prefix.is_none() && href.is_empty() => (),
        _ => decls.push((prefix, href)),
    }

    // Prefixed attributes utilize their prefix
    for attrib in &element.attributes {
        let prefix = match attrib.prefix.as_deref() {
            Some("xml") | None => continue,
            Some(prefix) => prefix,
        };
        let href = attrib.href.as_deref().unwrap_or("");

        if rendered.get(Some(prefix)) == Some(href) {
            continue;
        }

        if !decls.iter().any(|(p, _)| *p == Some(prefix)) {
            decls.push((Some(prefix), href));
        }
    }

    decls.sort_by(|a, b| a.0.unwrap_or("").cmp(b.0.unwrap_or("")));
    for (prefix, href) in &decls {
        rendered.set(*prefix, href);
    }

    let mut attribs = element.attributes.iter().collect::<Vec<_>>();
    attribs.sort_by(|a, b| {
        let a = (a.href.as_deref().unwrap_or(""), a.name.as_str());
        let b = (b.href.as_deref().unwrap_or(""), b.name.as_str());

        a.cmp(&b)
    });

    let name = element.qualified_name();

    out.push('<');
    out.push_str(&name);
    for (prefix, href) in decls {
        out.push_str(" xmlns");
        if let Some(prefix) = prefix {
            out.push(':');
            out.push_str(prefix);
        }
        out.push_str("=\"");
        escape_attrib(href, out);
        out.push('"');
    }
    for attrib in attribs {
        out.push(' ');
        out.push_str(&attrib.qualified_name());
        out.push_str("=\"");
        escape_attrib(&attrib.value, out);
        out.push('"');
    }
    out.push('>');

    for child in &element.children {
        match child {
            Node::Element(child) => exclusive(child, &rendered, out),
            Node::Text(text) => escape_text(text, out),
        }
    }

    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

fn plain(element: &Element, out: &mut String) {
    let name = element.qualified_name();

    out.push('<');
    out.push_str(&name);
    for ns in &element.namespaces {
        out.push_str(" xmlns");
        if let Some(prefix) = &ns.prefix {
            out.push(':');
            out.push_str(prefix);
        }
        out.push_str("=\"");
        escape_attrib(&ns.href, out);
        out.push('"');
    }
    for attrib in &element.attributes {
        out.push(' ');
        out.push_str(&attrib.qualified_name());
        out.push_str("=\"");
        escape_attrib(&attrib.value, out);
        out.push('"');
    }
    out.push('>');

    for child in &element.children {
        match child {
            Node::Element(child) => plain(child, out),
            Node::Text(text) => escape_text(text, out),
        }
    }

    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn escape_attrib(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}
