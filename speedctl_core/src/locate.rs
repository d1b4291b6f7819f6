// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deep media discovery across shadow-root boundaries.
//!
//! `querySelectorAll("video, audio")` stops at shadow boundaries, so players
//! built from web components hide their media from a plain query.
//! [`locate_media`] walks every shadow root reachable from the starting scope
//! and unions the results.

use alloc::vec::Vec;

/// Maximum nesting of shadow roots that [`locate_media`] will enter.
///
/// Shadow trees are acyclic, but a hostile page can still nest them deeply
/// enough to blow the stack.
pub const MAX_SHADOW_DEPTH: usize = 32;

/// A queryable document tree.
///
/// A *scope* is something that can be queried for descendants: a document,
/// an element, or a shadow root.
pub trait MediaTree {
    /// A queryable subtree root.
    type Scope;
    /// A media element handle.
    type Media: PartialEq;

    /// Media elements that are ordinary (light-DOM) descendants of `scope`.
    fn media_in(&self, scope: &Self::Scope) -> Vec<Self::Media>;

    /// Shadow roots attached to descendants of `scope`, not including roots
    /// nested inside those shadow roots.
    fn shadow_roots_in(&self, scope: &Self::Scope) -> Vec<Self::Scope>;
}

/// Returns every media element under `root`, including inside shadow roots,
/// each exactly once, in first-seen order.
///
/// Cheap to call again at any time; never fails. Shadow roots nested more
/// than [`MAX_SHADOW_DEPTH`] levels deep are skipped.
pub fn locate_media<T: MediaTree>(tree: &T, root: &T::Scope) -> Vec<T::Media> {
    let mut found = Vec::new();
    collect(tree, root, 0, &mut found);
    found
}

fn collect<T: MediaTree>(tree: &T, scope: &T::Scope, depth: usize, found: &mut Vec<T::Media>) {
    for media in tree.media_in(scope) {
        if !found.contains(&media) {
            found.push(media);
        }
    }
    if depth >= MAX_SHADOW_DEPTH {
        return;
    }
    for shadow in tree.shadow_roots_in(scope) {
        collect(tree, &shadow, depth + 1, found);
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Arena-backed tree for tests.

    use alloc::vec::Vec;

    use super::MediaTree;

    #[derive(Debug, Default)]
    pub(crate) struct Scope {
        pub(crate) media: Vec<u32>,
        pub(crate) shadows: Vec<usize>,
    }

    /// Scopes are arena indices; media are plain ids.
    #[derive(Debug, Default)]
    pub(crate) struct FakeTree {
        pub(crate) scopes: Vec<Scope>,
    }

    impl FakeTree {
        pub(crate) fn scope(&mut self) -> usize {
            self.scopes.push(Scope::default());
            self.scopes.len() - 1
        }

        pub(crate) fn add_media(&mut self, scope: usize, id: u32) {
            self.scopes[scope].media.push(id);
        }

        pub(crate) fn attach_shadow(&mut self, scope: usize, shadow: usize) {
            self.scopes[scope].shadows.push(shadow);
        }
    }

    impl MediaTree for FakeTree {
        type Scope = usize;
        type Media = u32;

        fn media_in(&self, scope: &usize) -> Vec<u32> {
            self.scopes[*scope].media.clone()
        }

        fn shadow_roots_in(&self, scope: &usize) -> Vec<usize> {
            self.scopes[*scope].shadows.clone()
        }
    }
}
