//! Wire types exchanged between ranks

/// Which collective a message belongs to
///
/// Receivers match on `(source, tag)`, so messages for a later collective that
/// arrive early are held back until the matching receive is posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Broadcast,
    Scatter,
    Gather,
    /// Arrival at a barrier (rank -> root)
    Barrier,
    /// Barrier release (root -> rank)
    Release,
}

/// A single point-to-point message
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Rank that sent the message
    pub source: usize,
    pub tag: Tag,
    /// JSON-encoded payload
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn new(source: usize, tag: Tag, body: Vec<u8>) -> Self {
        Self { source, tag, body }
    }

    /// Whether this envelope satisfies a receive posted for `(source, tag)`
    pub fn matches(&self, source: usize, tag: Tag) -> bool {
        self.source == source && self.tag == tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_matches_source_and_tag() {
        let env = Envelope::new(2, Tag::Gather, vec![]);
        assert!(env.matches(2, Tag::Gather));
        assert!(!env.matches(1, Tag::Gather));
        assert!(!env.matches(2, Tag::Barrier));
    }
}
