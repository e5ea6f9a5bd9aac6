use core::mem;

use crate::{Element, KnuthSequence};

/// Read access to elements for a break optimizer.
///
/// `resolve` may materialise content that is not available yet, but whatever
/// it returns must match every later `element` call at the same index.
pub trait ElementSource {
    /// Number of elements available without further resolution.
    fn available(&self) -> usize;

    fn element(&self, index: usize) -> Option<&Element>;

    fn resolve(&mut self, index: usize) -> Option<&Element> {
        self.element(index)
    }
}

impl ElementSource for KnuthSequence {
    fn available(&self) -> usize {
        self.len()
    }

    fn element(&self, index: usize) -> Option<&Element> {
        self.get(index)
    }
}

impl ElementSource for Vec<Element> {
    fn available(&self) -> usize {
        self.len()
    }

    fn element(&self, index: usize) -> Option<&Element> {
        self.get(index)
    }
}

/// Produces the content of a [`DeferredSequence`] one chunk at a time.
pub trait ChunkSource {
    type Error;

    /// `Ok(None)` once the content is exhausted.
    fn next_chunk(&mut self) -> Result<Option<Vec<Element>>, Self::Error>;
}

/// A sequence whose tail has not been produced yet.
///
/// Chunks are pulled from the source only when an index past the resolved
/// prefix is requested. A failing source stops resolution; the error is kept
/// for the caller to collect with [`DeferredSequence::take_error`].
pub struct DeferredSequence<S: ChunkSource> {
    resolved: Vec<Element>,
    source: S,
    exhausted: bool,
    error: Option<S::Error>,
}

impl<S: ChunkSource> DeferredSequence<S> {
    pub fn new(source: S) -> Self {
        Self {
            resolved: Vec::new(),
            source,
            exhausted: false,
            error: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// No further chunk can be pulled.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted || self.error.is_some()
    }

    pub fn resolved(&self) -> &[Element] {
        &self.resolved
    }

    pub fn take_error(&mut self) -> Option<S::Error> {
        self.error.take()
    }

    /// Pull one more chunk. Returns `false` when nothing was added.
    pub fn pull(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        match self.source.next_chunk() {
            Ok(Some(chunk)) => {
                self.resolved.extend(chunk);
                true
            }
            Ok(None) => {
                self.exhausted = true;
                false
            }
            Err(error) => {
                self.error = Some(error);
                false
            }
        }
    }

    /// Remove and return the first `count` resolved elements. Indices of the
    /// remaining elements shift down accordingly.
    pub fn take_front(&mut self, count: usize) -> Vec<Element> {
        let count = count.min(self.resolved.len());
        let rest = self.resolved.split_off(count);
        mem::replace(&mut self.resolved, rest)
    }

    /// Forget resolved elements from `len` on, e.g. after the producer was
    /// rewound to regenerate them. Also reopens an exhausted source.
    pub fn truncate(&mut self, len: usize) {
        self.resolved.truncate(len);
        self.exhausted = false;
    }
}

impl<S: ChunkSource> ElementSource for DeferredSequence<S> {
    fn available(&self) -> usize {
        self.resolved.len()
    }

    fn element(&self, index: usize) -> Option<&Element> {
        self.resolved.get(index)
    }

    fn resolve(&mut self, index: usize) -> Option<&Element> {
        while self.resolved.len() <= index {
            if !self.pull() {
                break;
            }
        }
        self.resolved.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Chunks(Vec<Vec<Element>>);

    impl ChunkSource for Chunks {
        type Error = &'static str;

        fn next_chunk(&mut self) -> Result<Option<Vec<Element>>, Self::Error> {
            if self.0.is_empty() {
                return Ok(None);
            }
            Ok(Some(self.0.remove(0)))
        }
    }

    #[test]
    fn resolve_pulls_only_as_far_as_needed() {
        let mut deferred = DeferredSequence::new(Chunks(vec![
            vec![Element::new_box(1, 0), Element::new_box(2, 0)],
            vec![Element::new_box(3, 0)],
        ]));
        assert_eq!(deferred.available(), 0);
        assert_eq!(deferred.resolve(1).map(Element::width), Some(2));
        assert_eq!(deferred.available(), 2);
        assert_eq!(deferred.element(1).map(Element::width), Some(2));
        assert_eq!(deferred.resolve(5), None);
        assert!(deferred.is_exhausted());
        assert_eq!(deferred.available(), 3);
    }

    #[test]
    fn take_front_shifts_indices() {
        let mut deferred = DeferredSequence::new(Chunks(vec![vec![
            Element::new_box(1, 0),
            Element::new_box(2, 0),
            Element::new_box(3, 0),
        ]]));
        deferred.resolve(0);
        let placed = deferred.take_front(2);
        assert_eq!(placed.len(), 2);
        assert_eq!(deferred.element(0).map(Element::width), Some(3));
    }
}
