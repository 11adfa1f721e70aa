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

use std::fmt::{Display, Formatter, Result as FmtResult};

/* Namespace */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub href: String,
}

impl Namespace {
    pub fn new(prefix: &str, href: &str) -> Self {
        Self {
            prefix: Some(prefix.into()),
            href: href.into(),
        }
    }

    pub fn default_ns(href: &str) -> Self {
        Self {
            prefix: None,
            href: href.into(),
        }
    }
}

/* Attribute */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub href: Option<String>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.name)
    }
}

/* Node */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/* Element */

/// An XML element whose own namespace and the namespaces of its attributes
/// are resolved at construction time.
///
/// Keeping the resolved namespace next to the prefix lets the exclusive
/// canonicalization work on any sub tree without access to the ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) prefix: Option<String>,
    pub(crate) href: Option<String>,
    pub(crate) name: String,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<Node>,
}

impl Element {
    pub fn new(ns: &Namespace, name: &str) -> Self {
        Self {
            prefix: ns.prefix.clone(),
            href: Some(ns.href.clone()),
            name: name.into(),
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn new_local(name: &str) -> Self {
        Self {
            prefix: None,
            href: None,
            name: name.into(),
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn declare(mut self, ns: &Namespace) -> Self {
        self.namespaces.push(ns.clone());

        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);

        self
    }

    pub fn ns_attr(mut self, ns: &Namespace, name: &str, value: &str) -> Self {
        self.attributes.push(Attribute {
            prefix: ns.prefix.clone(),
            href: Some(ns.href.clone()),
            name: name.into(),
            value: value.into(),
        });

        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));

        self
    }

    pub fn text<T: Into<String>>(mut self, text: T) -> Self {
        self.set_text(text);

        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.name)
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is(&self, href: &str, name: &str) -> bool {
        self.name == name && self.href.as_deref() == Some(href)
    }

    /// Value of the unqualified attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.href.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.href.is_none() && a.name == name)
        {
            Some(attrib) => attrib.value = value.into(),
            None => self.attributes.push(Attribute {
                prefix: None,
                href: None,
                name: name.into(),
                value: value.into(),
            }),
        }
    }

    /// Concatenated content of all direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Replaces all children with a single text node.
    pub fn set_text<T: Into<String>>(&mut self, text: T) {
        self.children.clear();
        self.children.push(Node::Text(text.into()));
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.into()));
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First direct child element with the given namespace and local name.
    pub fn get(&self, href: &str, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(href, name))
    }

    pub fn get_mut(&mut self, href: &str, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(href, name))
    }

    pub fn get_all<'a>(&'a self, href: &'a str, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is(href, name))
    }

    /// Depth first search including `self`.
    pub fn find(&self, href: &str, name: &str) -> Option<&Element> {
        if self.is(href, name) {
            return Some(self);
        }

        self.elements().find_map(|e| e.find(href, name))
    }

    pub fn find_mut(&mut self, href: &str, name: &str) -> Option<&mut Element> {
        if self.is(href, name) {
            return Some(self);
        }

        self.elements_mut().find_map(|e| e.find_mut(href, name))
    }

    /// Depth first search for all elements (including `self`) that match.
    pub fn find_all<'a>(&'a self, href: &str, name: &str) -> Vec<&'a Element> {
        let mut ret = Vec::new();
        self.collect(href, name, &mut ret);

        ret
    }

    pub fn remove_all(&mut self, href: &str, name: &str) {
        self.children.retain(|node| match node {
            Node::Element(e) => !e.is(href, name),
            Node::Text(_) => true,
        });
    }

    fn collect<'a>(&'a self, href: &str, name: &str, ret: &mut Vec<&'a Element>) {
        if self.is(href, name) {
            ret.push(self);
        }

        for e in self.elements() {
            e.collect(href, name, ret);
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_xml())
    }
}

pub(crate) fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, name),
        None => name.to_owned(),
    }
}
