use geo::LineString;

/// Vertices `start..=end` of `line`, walking forward and wrapping around
/// rings. The closing vertex of a ring is not part of the walk, so a range
/// ending before `start` continues from vertex 0.
///
/// The full range `(0, n - 1)` returns the line unchanged.
pub fn sub_string((start, end): (usize, usize), line: &LineString<f64>) -> LineString<f64> {
    let n = line.0.len();
    if n == 0 || (start == 0 && end == n - 1) { return line.clone() }

    let effective = if line.is_closed() && n > 1 { n - 1 } else { n };
    debug_assert!(start < effective && end < effective, "range ({start}, {end}) out of bounds");
    let stop = if end + 1 >= effective { 0 } else { end + 1 };

    let mut coords = Vec::new();
    let mut i = start % effective;
    loop {
        coords.push(line.0[i]);
        i = (i + 1) % effective;
        if i == stop { break }
    }
    LineString(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn square() -> LineString<f64> {
        line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)]
    }

    #[test]
    fn full_range_is_identity() {
        let ring = square();
        assert_eq!(sub_string((0, 4), &ring), ring);
    }

    #[test]
    fn wraps_past_the_seam() {
        assert_eq!(
            sub_string((1, 0), &square()),
            line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)]
        );
        assert_eq!(
            sub_string((3, 1), &square()),
            line_string![(x: 0.0, y: 10.0), (x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]
        );
    }

    #[test]
    fn inner_range_of_an_open_line() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 3.0, y: 0.0)];
        assert_eq!(sub_string((1, 2), &line), line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]);
        assert_eq!(sub_string((2, 3), &line), line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 0.0)]);
    }

    #[test]
    fn gaps_and_contacts_reassemble_the_ring() {
        let ring = square();
        let gap = sub_string((1, 0), &ring);
        let contact = sub_string((0, 1), &ring);
        let mut rebuilt = contact.0.clone();
        rebuilt.extend(gap.0.iter().skip(1).copied());
        assert_eq!(LineString(rebuilt), ring);
    }
}
