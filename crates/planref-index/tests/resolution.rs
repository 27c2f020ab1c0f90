use std::sync::Arc;
use std::thread;

use planref_core::types::DetailRef;
use planref_core::{BBox, Error, TextBox};
use planref_index::{GraphicRegistrations, PlanIndex, PlanSnapshot};

const REGION: BBox = BBox::new(1000, 1000, 1400, 1200);
const TAG: BBox = BBox::new(40, 40, 100, 80);

fn tb(l: i32, t: i32, r: i32, b: i32, text: &str) -> TextBox { TextBox::new(BBox::new(l, t, r, b), text) }

/// `A101.png` holds two details (12 and 7); `B3.png` holds tags pointing at them.
fn plan() -> PlanIndex {
    PlanIndex::build(
        vec![
            (
                "A101.png",
                vec![
                    tb(1010, 1010, 1200, 1100, "A1O1"),
                    tb(100, 100, 120, 110, "12"),
                    tb(300, 100, 320, 110, "7"),
                    tb(500, 100, 520, 110, "3"),
                    tb(540, 100, 560, 110, "4"),
                ],
            ),
            (
                "B3.png",
                vec![
                    tb(1010, 1010, 1100, 1060, "B 3"),
                    // detail number physically left of the page reference
                    tb(45, 50, 60, 60, "12"),
                    tb(65, 50, 95, 60, "A101"),
                    // a second tag, reading "A101" then "7", top to bottom
                    tb(205, 45, 240, 55, "A101"),
                    tb(210, 60, 220, 70, "7"),
                ],
            ),
        ],
        REGION,
    )
}

fn graphic_12() -> BBox { BBox::new(0, 120, 200, 400) }
fn graphic_7() -> BBox { BBox::new(250, 120, 450, 400) }

fn register_both(plan: &PlanIndex) {
    plan.register_graphic("A101.png", graphic_12(), BBox::new(90, 90, 130, 115)).unwrap();
    plan.register_graphic("A101.png", graphic_7(), BBox::new(290, 90, 330, 115)).unwrap();
}

#[test]
fn text_in_bbox_is_strict_containment() {
    let plan = plan();
    let found = plan.text_in_bbox("A101.png", &BBox::new(100, 100, 120, 110)).unwrap();
    assert_eq!(found.len(), 1, "a box equal to the target is contained");
    assert_eq!(found[0].text, "12");

    let overlap = plan.text_in_bbox("A101.png", &BBox::new(0, 0, 110, 105)).unwrap();
    assert!(overlap.is_empty(), "overlap is not containment");

    let err = plan.text_in_bbox("missing.png", &TAG).unwrap_err();
    assert!(matches!(err, Error::UnknownFile(_)));
}

#[test]
fn resolve_tag_ignores_fragment_order() {
    let plan = plan();
    let left_to_right = plan.resolve_tag("B3.png", &TAG).unwrap();
    assert_eq!(left_to_right, DetailRef { page_num: "A101".into(), detail_num: "12".into() });

    let top_to_bottom = plan.resolve_tag("B3.png", &BBox::new(200, 40, 250, 75)).unwrap();
    assert_eq!(top_to_bottom, DetailRef { page_num: "A101".into(), detail_num: "7".into() });
}

#[test]
fn resolve_tag_needs_exactly_two_fragments() {
    let plan = plan();
    let one = plan.resolve_tag("B3.png", &BBox::new(40, 40, 62, 80)).unwrap_err();
    assert!(matches!(one, Error::MalformedTag { found: 1 }));

    let three = plan.resolve_tag("B3.png", &BBox::new(40, 40, 245, 62)).unwrap_err();
    assert!(matches!(three, Error::MalformedTag { found: 3 }));

    let none = plan.resolve_tag("B3.png", &BBox::new(600, 600, 700, 700)).unwrap_err();
    assert!(matches!(none, Error::MalformedTag { found: 0 }));
}

#[test]
fn resolve_tag_without_a_known_page_number_is_indeterminate() {
    let plan = plan();
    // "3" and "4" on A101.png: neither is a page number
    let err = plan.resolve_tag("A101.png", &BBox::new(490, 90, 570, 120)).unwrap_err();
    assert_eq!(err.kind(), "indeterminate_tag_roles");
}

#[test]
fn resolve_tag_with_two_known_page_numbers_is_indeterminate() {
    let plan = PlanIndex::build(
        vec![
            ("A101.png", vec![tb(1010, 1010, 1200, 1100, "A101"), tb(45, 50, 60, 60, "B3"), tb(65, 50, 95, 60, "A101")]),
            ("B3.png", vec![tb(1010, 1010, 1100, 1060, "B3")]),
        ],
        REGION,
    );
    let err = plan.resolve_tag("A101.png", &TAG).unwrap_err();
    assert!(
        matches!(&err, Error::IndeterminateTagRoles { first, second } if first == "B3" && second == "A101"),
        "got {err:?}"
    );
}

#[test]
fn graphic_for_tag_returns_registered_graphic() {
    let plan = plan();
    register_both(&plan);

    let loc = plan.locate_graphic_for_tag("B3.png", &TAG).unwrap();
    assert_eq!(loc.filename, "A101.png");
    assert_eq!(loc.bbox, graphic_12());

    let loc = plan.locate_graphic_for_tag("B3.png", &BBox::new(200, 40, 250, 75)).unwrap();
    assert_eq!(loc.bbox, graphic_7());
}

#[test]
fn first_registration_wins_on_duplicate_numbers() {
    let plan = plan();
    let first = BBox::new(0, 0, 10, 10);
    let second = BBox::new(20, 20, 30, 30);
    plan.register_graphic("A101.png", first, BBox::new(95, 95, 125, 112)).unwrap();
    plan.register_graphic("A101.png", second, BBox::new(90, 90, 130, 115)).unwrap();

    let detail = DetailRef { page_num: "A101".into(), detail_num: "12".into() };
    assert_eq!(plan.graphic_bbox(&detail).unwrap().bbox, first);
}

#[test]
fn corrected_page_key_finds_same_page() {
    let plan = plan();
    register_both(&plan);
    let detail = DetailRef { page_num: "A1O1".into(), detail_num: "7".into() };
    assert_eq!(plan.graphic_bbox(&detail).unwrap().bbox, graphic_7());
}

#[test]
fn graphic_lookup_failures_are_distinct() {
    let plan = plan();
    let detail = DetailRef { page_num: "A101".into(), detail_num: "99".into() };

    assert!(matches!(plan.graphic_bbox(&detail).unwrap_err(), Error::NoRegistry(f) if f == "A101.png"));

    register_both(&plan);
    assert!(matches!(plan.graphic_bbox(&detail).unwrap_err(), Error::GraphicNotFound { .. }));

    let unknown = DetailRef { page_num: "Q1".into(), detail_num: "12".into() };
    assert!(matches!(plan.graphic_bbox(&unknown).unwrap_err(), Error::UnknownPage(_)));
}

#[test]
fn number_region_with_two_fragments_is_ambiguous() {
    let plan = plan();
    plan.register_graphic("A101.png", graphic_12(), BBox::new(490, 90, 570, 120)).unwrap();
    let detail = DetailRef { page_num: "A101".into(), detail_num: "3".into() };
    let err = plan.graphic_bbox(&detail).unwrap_err();
    assert!(matches!(err, Error::AmbiguousNumber { found: 2, .. }));
}

#[test]
fn registering_on_unknown_page_fails() {
    let plan = plan();
    let err = plan.register_graphic("nope.png", graphic_12(), graphic_7()).unwrap_err();
    assert_eq!(err.kind(), "unknown_file");
}

#[test]
fn registrations_survive_a_round_trip_in_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("graphics.json");

    let plan = plan();
    register_both(&plan);
    plan.registrations().save(&path).unwrap();

    let reloaded = PlanIndex::from_snapshot(&plan.to_snapshot(), REGION);
    reloaded.apply_registrations(&GraphicRegistrations::load_or_default(&path).unwrap()).unwrap();
    assert_eq!(reloaded.graphics_on("A101.png").unwrap(), plan.graphics_on("A101.png").unwrap());
    assert!(reloaded.graphics_on("B3.png").unwrap().is_empty());
}

#[test]
fn snapshot_file_rebuilds_the_same_index() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("ocr.json");

    let plan = plan();
    plan.to_snapshot().save(&path).unwrap();
    let snapshot = PlanSnapshot::load(&path).unwrap();
    assert!(snapshot.contains("B3.png"));

    let reloaded = PlanIndex::from_snapshot(&snapshot, REGION);
    assert_eq!(reloaded.resolve_tag("B3.png", &TAG).unwrap().page_num, "A101");

    let missing = PlanSnapshot::load_or_default(&tmp.path().join("absent.json")).unwrap();
    assert!(missing.pages.is_empty());
}

#[test]
fn registration_and_lookup_across_threads() {
    let plan = Arc::new(plan());
    register_both(&plan);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let plan = Arc::clone(&plan);
            thread::spawn(move || {
                if i % 2 == 0 {
                    plan.register_graphic("B3.png", BBox::new(0, 0, 1, 1), BBox::new(2, 2, 3, 3)).unwrap();
                } else {
                    let loc = plan.locate_graphic_for_tag("B3.png", &TAG).unwrap();
                    assert_eq!(loc.bbox, graphic_12());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(plan.graphics_on("B3.png").unwrap().len(), 2);
}
