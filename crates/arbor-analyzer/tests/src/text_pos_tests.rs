use super::*;

fn span(
    sl: u32,
    sc: u32,
    el: u32,
    ec: u32,
) -> Span {
    Span::new(Point::new(sl, sc), Point::new(el, ec))
}

#[test]
fn editor_ranges_round_trip() {
    let ranges = [
        Range::new(Position::new(0, 0), Position::new(0, 0)),
        Range::new(Position::new(2, 4), Position::new(2, 42)),
        Range::new(Position::new(10, 1), Position::new(14, 0)),
    ];
    for range in ranges {
        assert_eq!(to_editor_range(to_internal_span(range)), range);
    }
}

#[test]
fn conversion_shifts_lines_only() {
    let point = to_internal_point(Position::new(2, 7));
    assert_eq!(point, Point::new(3, 7));
    assert_eq!(to_editor_position(Point::new(3, 7)), Position::new(2, 7));
}

#[test]
fn malformed_internal_line_saturates_at_zero() {
    assert_eq!(to_editor_position(Point::new(0, 5)), Position::new(0, 5));
}

#[test]
fn containment_is_inclusive_on_both_ends() {
    let outer = span(3, 0, 3, 42);
    assert!(outer.contains_point(Point::new(3, 0)));
    assert!(outer.contains_point(Point::new(3, 42)));
    assert!(!outer.contains_point(Point::new(3, 43)));
    assert!(!outer.contains_point(Point::new(2, 10)));

    assert!(outer.contains_span(&span(3, 4, 3, 10)));
    assert!(outer.contains_span(&outer));
    assert!(!outer.contains_span(&span(3, 4, 4, 0)));
}

#[test]
fn overlapping_spans() {
    assert!(span(1, 0, 2, 5).overlaps(&span(2, 5, 3, 0)));
    assert!(!span(1, 0, 2, 5).overlaps(&span(2, 6, 3, 0)));
}

#[test]
fn multi_line_spans_outrank_single_line_spans() {
    let wide_line = span(5, 0, 5, 400);
    let two_lines = span(5, 10, 6, 0);
    assert!(wide_line.size() < two_lines.size());
    assert_eq!(two_lines.size(), LINE_WEIGHT - 10);
}

#[test]
fn lines_wider_than_the_weight_misrank() {
    let very_wide = span(1, 0, 1, LINE_WEIGHT as u32 + 1);
    let two_lines = span(1, 0, 2, 0);
    assert!(very_wide.size() > two_lines.size());
}

#[test]
fn byte_offsets_use_utf16_columns() {
    let source = "let a = 1;\nlet é = \"😀\";\n";
    let offset = source.find('=').expect("first equals");
    assert_eq!(point_from_byte_offset(source, offset), Point::new(1, 6));

    let emoji = source.find('😀').expect("emoji");
    let after = emoji + '😀'.len_utf8();
    assert_eq!(point_from_byte_offset(source, emoji), Point::new(2, 9));
    assert_eq!(point_from_byte_offset(source, after), Point::new(2, 11));
    assert_eq!(byte_offset_from_point(source, Point::new(2, 11)), Some(after));
}

#[test]
fn byte_offset_past_end_clamps() {
    let source = "abc";
    assert_eq!(point_from_byte_offset(source, 99), Point::new(1, 3));
}

#[test]
fn byte_offset_of_missing_line_is_none() {
    assert_eq!(byte_offset_from_point("one\ntwo", Point::new(5, 0)), None);
    assert_eq!(byte_offset_from_point("one\ntwo", Point::new(0, 0)), None);
}

#[test]
fn slice_span_returns_covered_text() {
    let source = "def alpha\nuse alpha\n";
    let covered = span_from_byte_range(source, 14..19);
    assert_eq!(covered, span(2, 4, 2, 9));
    assert_eq!(slice_span(source, covered), Some("alpha"));
}

#[test]
fn display_formats() {
    assert_eq!(span(1, 2, 3, 4).to_string(), "1:2-3:4");
}
