/// a span is a location in the source, from the beginning (lo) to the
/// end (hi), both represented as (line, col). Tokens carry one, and the
/// parser smears them over AST nodes so diagnostics can point somewhere
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Span {
    pub lo: (usize, usize),
    pub hi: (usize, usize),
}
impl Span {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn at(line: usize, col: usize) -> Self {
        Span { lo: (line, col), hi: (line, col) }
    }
    /// This is set as in "a set of berries": given a list of spans, find
    /// the span covering ALL of them, so one on line 1 and one on line 3
    /// produce a set from line 1 to 3
    pub fn set(mut spans: Vec<Span>) -> Span {
        let first = spans.pop().expect("cannot form set of less than one span");
        let mut lo = first.lo;
        let mut hi = first.hi;
        for span in spans {
            if span.lo.0 < lo.0 || (span.lo.0 == lo.0 && span.lo.1 < lo.1) {
                lo = span.lo;
            }
            if span.hi.0 > hi.0 || (span.hi.0 == hi.0 && span.hi.1 > hi.1) {
                hi = span.hi;
            }
        }
        Span { lo, hi }
    }
}
impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if *self == Span::new() {
            write!(f, "internal")
        } else {
            write!(f, "{}:{}", self.lo.0, self.lo.1)
        }
    }
}

#[cfg(test)]
mod test {
    use super::Span;
    #[test]
    fn test_span_set() {
        let set = Span::set(vec![
            Span { lo: (4, 4), hi: (5, 5) },
            Span { lo: (4, 2), hi: (4, 10) },
        ]);
        assert_eq!(set, Span { lo: (4, 2), hi: (5, 5) });
    }
}
