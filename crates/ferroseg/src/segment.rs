use core::{fmt, ops::Range};

/// A contiguous half-open range `[start, end)` reserved for one caller.
///
/// Segments are produced by [`OffsetAllocator::reserve`]: the backend counter
/// is advanced by `delta` in one atomic step and the caller owns every value
/// between the old and new counter values. Two segments reserved for the same
/// key never overlap unless an administrative reset intervened.
///
/// # Example
///
/// ```
/// use ferroseg::Segment;
///
/// let segment = Segment::ending_at(2000, 1000);
/// assert_eq!(segment.start(), 1000);
/// assert_eq!(segment.len(), 1000);
/// assert!(segment.contains(1999));
/// assert!(!segment.contains(2000));
/// ```
///
/// [`OffsetAllocator::reserve`]: crate::OffsetAllocator::reserve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
    start: u64,
    end: u64,
}

impl Segment {
    /// Creates the segment `[start, end)`. An inverted range is empty.
    pub const fn new(start: u64, end: u64) -> Self {
        if end < start {
            Self { start, end: start }
        } else {
            Self { start, end }
        }
    }

    /// The segment of size `delta` that ends at the post-increment counter
    /// value `high`.
    pub const fn ending_at(high: u64, delta: u64) -> Self {
        Self::new(high.saturating_sub(delta), high)
    }

    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Exclusive upper bound.
    pub const fn end(&self) -> u64 {
        self.end
    }

    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub const fn contains(&self, value: u64) -> bool {
        self.start <= value && value < self.end
    }

    /// Whether the two segments share any value.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub const fn as_range(&self) -> Range<u64> {
        self.start..self.end
    }
}

impl IntoIterator for Segment {
    type Item = u64;
    type IntoIter = Range<u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_range()
    }
}

impl From<Segment> for Range<u64> {
    fn from(segment: Segment) -> Self {
        segment.as_range()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ending_at_derives_lower_bound() {
        assert_eq!(Segment::ending_at(1000, 1000), Segment::new(0, 1000));
        assert_eq!(Segment::ending_at(5, 10), Segment::new(0, 5));
    }

    #[test]
    fn adjacent_segments_do_not_overlap() {
        let a = Segment::new(0, 1000);
        let b = Segment::new(1000, 2000);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Segment::new(999, 1001)));
    }

    #[test]
    fn inverted_range_is_empty() {
        let segment = Segment::new(10, 3);
        assert!(segment.is_empty());
        assert_eq!(segment.into_iter().count(), 0);
    }

    #[test]
    fn iterates_every_value_once() {
        let values: Vec<u64> = Segment::new(3, 6).into_iter().collect();
        assert_eq!(values, vec![3, 4, 5]);
        assert_eq!(Segment::new(3, 6).to_string(), "[3, 6)");
    }
}
