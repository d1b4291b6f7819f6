// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`MediaTree`] over the live DOM.
//!
//! Only open shadow roots are reachable; closed ones are invisible to page
//! scripts and content scripts alike.

use speedctl_core::locate::MediaTree;
use wasm_bindgen::JsCast as _;
use web_sys::{Document, Element, HtmlMediaElement, Node, NodeList, ShadowRoot};

use crate::media::DomMedia;

const MEDIA_SELECTOR: &str = "video, audio";

/// A queryable subtree root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// The whole document.
    Document(Document),
    /// An open shadow root.
    Shadow(ShadowRoot),
}

impl Scope {
    fn query_all(&self, selectors: &str) -> Option<NodeList> {
        let list = match self {
            Self::Document(document) => document.query_selector_all(selectors),
            Self::Shadow(root) => root.query_selector_all(selectors),
        };
        list.ok()
    }
}

fn nodes(list: Option<NodeList>) -> impl Iterator<Item = Node> {
    list.into_iter()
        .flat_map(|list| (0..list.length()).filter_map(move |i| list.item(i)))
}

/// The document's element tree, including open shadow roots.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomTree;

impl MediaTree for DomTree {
    type Scope = Scope;
    type Media = DomMedia;

    fn media_in(&self, scope: &Scope) -> Vec<DomMedia> {
        nodes(scope.query_all(MEDIA_SELECTOR))
            .filter_map(|node| node.dyn_into::<HtmlMediaElement>().ok())
            .map(DomMedia::new)
            .collect()
    }

    fn shadow_roots_in(&self, scope: &Scope) -> Vec<Scope> {
        nodes(scope.query_all("*"))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .filter_map(|element| element.shadow_root())
            .map(Scope::Shadow)
            .collect()
    }
}
