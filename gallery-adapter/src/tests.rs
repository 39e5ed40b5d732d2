use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::Mutex;

use gallery::{Easing, Gallery, GalleryEvent, GalleryOptions, ItemKey, NodeId, Point, Size};

fn controller(options: GalleryOptions, counts: &[usize]) -> (Controller, Vec<NodeId>) {
    let mut g = Gallery::new(options);
    g.set_client_size(Size::new(300, 200));
    let mut groups = Vec::new();
    for (i, &count) in counts.iter().enumerate() {
        let id = g.add_group(i as ItemKey * 1000).unwrap();
        assert!(g.set_child_count(id, count));
        groups.push(id);
    }
    (Controller::from_gallery(g), groups)
}

fn event_log(options: GalleryOptions) -> (GalleryOptions, Arc<Mutex<Vec<GalleryEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let options = options.with_on_event(Some({
        let events = Arc::clone(&events);
        move |_: &Gallery, e: &GalleryEvent| {
            events.lock().unwrap().push(e.clone());
        }
    }));
    (options, events)
}

/// Centre of item `index` of the first group, with 4 items per line and nothing scrolled.
fn at(index: usize) -> Point {
    Point::new(38 + 74 * (index % 4) as i64, 50 + 58 * (index / 4) as i64)
}

fn click(c: &mut Controller, point: Point, modifiers: Modifiers) {
    c.on_mouse_down(point, MouseButton::Primary, modifiers);
    c.on_mouse_up(point, MouseButton::Primary, modifiers);
}

fn item(c: &mut Controller, group: NodeId, index: usize) -> NodeId {
    c.gallery_mut().child(group, index).unwrap()
}

fn selection_changes(events: &Mutex<Vec<GalleryEvent>>) -> usize {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, GalleryEvent::SelectionChanged { activated: false, .. }))
        .count()
}

#[test]
fn zoom_increment_depends_on_modifiers() {
    assert_eq!(zoom_increment(Modifiers::NONE), 5);
    assert_eq!(zoom_increment(Modifiers::SHIFT), 1);
    assert_eq!(zoom_increment(Modifiers::CTRL), 10);
    assert_eq!(zoom_increment(Modifiers::new(true, true)), 50);
    assert_eq!(Key::Enter.nav_command(), None);
    assert_eq!(Key::PageDown.nav_command(), Some(gallery::NavCommand::PageDown));
}

#[test]
fn click_replaces_selection_and_ctrl_click_toggles() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut c, groups) = controller(options, &[10]);
    let (a, b) = (item(&mut c, groups[0], 0), item(&mut c, groups[0], 1));

    click(&mut c, at(0), Modifiers::NONE);
    assert_eq!(c.gallery().selection(), &[a]);
    assert_eq!(c.gallery().focus(), Some(a));

    click(&mut c, at(1), Modifiers::CTRL);
    assert_eq!(c.gallery().selection(), &[a, b]);
    assert_eq!(c.last_click(), Some(b));

    click(&mut c, at(0), Modifiers::CTRL);
    assert_eq!(c.gallery().selection(), &[b]);

    click(&mut c, at(0), Modifiers::NONE);
    assert_eq!(c.gallery().selection(), &[a]);
}

#[test]
fn shift_click_selects_range_from_last_click() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut c, groups) = controller(options, &[10]);

    click(&mut c, at(6), Modifiers::NONE);
    click(&mut c, at(1), Modifiers::SHIFT);

    assert_eq!(c.gallery().selection().len(), 6);
    for i in 0..10 {
        let id = item(&mut c, groups[0], i);
        assert_eq!(c.gallery().is_selected(id), (1..=6).contains(&i), "item {i}");
    }
    // The anchor stays put, so another shift-click re-spans from it.
    click(&mut c, at(8), Modifiers::SHIFT);
    assert_eq!(c.gallery().selection().len(), 3);
}

#[test]
fn shift_click_without_anchor_does_nothing() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut c, _) = controller(options, &[10]);
    click(&mut c, at(3), Modifiers::SHIFT);
    assert!(c.gallery().selection().is_empty());
}

#[test]
fn repeated_click_on_selected_item_is_not_reported() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (options, events) = event_log(options);
    let (mut c, groups) = controller(options, &[10]);
    let b = item(&mut c, groups[0], 1);

    click(&mut c, at(0), Modifiers::NONE);
    click(&mut c, at(1), Modifiers::CTRL);
    assert_eq!(selection_changes(&events), 2);

    // Narrowing {0, 1} down to the item clicked last stays silent.
    click(&mut c, at(1), Modifiers::NONE);
    assert_eq!(c.gallery().selection(), &[b]);
    assert_eq!(selection_changes(&events), 2);

    click(&mut c, at(2), Modifiers::NONE);
    assert_eq!(selection_changes(&events), 3);
}

#[test]
fn click_on_empty_space_deselects_all() {
    let (options, events) = event_log(GalleryOptions::new());
    let (mut c, _) = controller(options, &[10]);

    click(&mut c, at(2), Modifiers::NONE);
    click(&mut c, Point::new(1, 30), Modifiers::NONE);

    assert!(c.gallery().selection().is_empty());
    assert_eq!(c.last_click(), None);
    let last = events.lock().unwrap().last().cloned();
    assert_eq!(
        last,
        Some(GalleryEvent::SelectionChanged {
            node: None,
            activated: false
        })
    );
}

#[test]
fn right_click_selects_unselected_item_only() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut c, groups) = controller(options, &[10]);
    let (a, b) = (item(&mut c, groups[0], 0), item(&mut c, groups[0], 1));

    click(&mut c, at(0), Modifiers::NONE);
    click(&mut c, at(1), Modifiers::CTRL);
    c.on_mouse_down(at(1), MouseButton::Secondary, Modifiers::NONE);
    c.on_mouse_up(at(1), MouseButton::Secondary, Modifiers::NONE);
    assert_eq!(c.gallery().selection(), &[a, b]);

    let d = item(&mut c, groups[0], 3);
    c.on_mouse_down(at(3), MouseButton::Secondary, Modifiers::NONE);
    assert_eq!(c.gallery().selection(), &[d]);
}

#[test]
fn header_toggles_group_and_title_selects_children() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut c, groups) = controller(options, &[10]);
    let group = groups[0];

    click(&mut c, at(0), Modifiers::NONE);
    click(&mut c, Point::new(5, 5), Modifiers::NONE);
    assert!(!c.gallery().node(group).unwrap().is_expanded());
    assert!(c.gallery().selection().is_empty());

    // A collapsed group's title selects nothing.
    click(&mut c, Point::new(100, 5), Modifiers::NONE);
    assert!(c.gallery().selection().is_empty());

    click(&mut c, Point::new(5, 5), Modifiers::NONE);
    assert!(c.gallery().node(group).unwrap().is_expanded());
    click(&mut c, Point::new(100, 5), Modifiers::NONE);
    assert_eq!(c.gallery().selection().len(), 10);
    assert!(!c.is_panning());
}

#[test]
fn header_title_keeps_selection_with_ctrl() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut c, groups) = controller(options, &[10, 3]);
    let first = item(&mut c, groups[0], 0);
    c.on_resize(Size::new(300, 400));

    click(&mut c, at(0), Modifiers::NONE);
    // Group 1 starts below the 3 lines of group 0.
    let second_header = c.gallery().group_rect(groups[1]).unwrap();
    let title = Point::new(100, second_header.y + 5);
    click(&mut c, title, Modifiers::CTRL);
    assert_eq!(c.gallery().selection().len(), 4);
    assert!(c.gallery().is_selected(first));

    click(&mut c, title, Modifiers::NONE);
    assert_eq!(c.gallery().selection().len(), 3);
    assert!(!c.gallery().is_selected(first));
}

#[test]
fn drag_pans_along_main_axis() {
    let (mut c, _) = controller(GalleryOptions::new(), &[100]);

    c.on_mouse_down(at(0), MouseButton::Primary, Modifiers::NONE);
    assert!(c.is_panning());
    assert!(c.on_mouse_move(Point::new(38, 20)));
    assert_eq!(c.gallery().scroll_offset(), 30);
    // Dragging back towards the start stops at zero.
    assert!(c.on_mouse_move(Point::new(38, 200)));
    assert_eq!(c.gallery().scroll_offset(), 0);

    c.on_mouse_up(Point::new(38, 200), MouseButton::Primary, Modifiers::NONE);
    assert!(!c.is_panning());
    assert!(!c.on_mouse_move(Point::new(38, 0)));
    assert_eq!(c.gallery().scroll_offset(), 0);
}

#[test]
fn wheel_scrolls_by_lines_and_zooms_with_modifiers() {
    let options = GalleryOptions::new().with_zoom(40, 200, 2.0);
    let (mut c, _) = controller(options, &[100]);

    assert!(c.on_wheel(-2, Modifiers::NONE, 1));
    assert_eq!(c.gallery().scroll_offset(), 2 * 58);
    assert!(c.on_wheel(1, Modifiers::NONE, 2));
    assert_eq!(c.gallery().scroll_offset(), 58);

    assert!(c.on_wheel(1, Modifiers::CTRL, 10));
    assert_eq!(c.gallery().item_size(), Size::new(82, 41));
    // The same event delivered twice zooms once.
    assert!(!c.on_wheel(1, Modifiers::CTRL, 10));
    assert_eq!(c.gallery().item_size().width, 82);

    assert!(c.on_wheel(-1, Modifiers::SHIFT, 11));
    assert_eq!(c.gallery().item_size().width, 81);
    assert!(c.on_wheel(1, Modifiers::new(true, true), 12));
    assert_eq!(c.gallery().item_size().width, 131);
}

#[test]
fn keys_navigate_and_enter_activates() {
    let (options, events) = event_log(GalleryOptions::new());
    let (mut c, groups) = controller(options, &[10]);
    let second = item(&mut c, groups[0], 1);
    let sixth = item(&mut c, groups[0], 5);

    click(&mut c, at(0), Modifiers::NONE);
    assert_eq!(c.on_key(Key::Right, Modifiers::NONE), Some(second));
    assert_eq!(c.on_key(Key::Down, Modifiers::NONE), Some(sixth));
    assert_eq!(c.gallery().selection(), &[sixth]);
    assert_eq!(c.last_click(), Some(sixth));

    assert_eq!(c.on_key(Key::Enter, Modifiers::NONE), Some(sixth));
    let last = events.lock().unwrap().last().cloned();
    assert_eq!(
        last,
        Some(GalleryEvent::SelectionChanged {
            node: Some(sixth),
            activated: true
        })
    );
}

#[test]
fn enter_without_selection_does_nothing() {
    let (mut c, _) = controller(GalleryOptions::new(), &[10]);
    assert_eq!(c.on_key(Key::Enter, Modifiers::NONE), None);
}

#[test]
fn double_click_activates_item_under_pointer() {
    let (options, events) = event_log(GalleryOptions::new());
    let (mut c, groups) = controller(options, &[10]);
    let third = item(&mut c, groups[0], 2);

    c.on_mouse_down(at(2), MouseButton::Primary, Modifiers::NONE);
    assert_eq!(c.on_double_click(at(2)), Some(third));
    c.on_mouse_up(at(2), MouseButton::Primary, Modifiers::NONE);

    let activations = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, GalleryEvent::SelectionChanged { activated: true, .. }))
        .count();
    assert_eq!(activations, 1);
    assert_eq!(c.on_double_click(Point::new(1, 30)), None);
}

#[test]
fn reveal_tween_scrolls_monotonically_to_target() {
    let (mut c, groups) = controller(GalleryOptions::new(), &[100]);
    let target = item(&mut c, groups[0], 40);
    let expected = c.gallery().reveal_offset(target).unwrap();
    assert!(expected > 0);

    let to = c
        .start_reveal_tween(target, 0, 100, Easing::SmoothStep)
        .unwrap();
    assert_eq!(to, expected);

    let mut last = 0u64;
    for now_ms in [0u64, 10, 20, 40, 80, 100, 120] {
        if let Some(off) = c.tick(now_ms) {
            assert!(off >= last);
            last = off;
        }
    }
    assert!(!c.is_animating());
    assert_eq!(c.gallery().scroll_offset(), to);
}

#[test]
fn user_scroll_cancels_tween() {
    let (mut c, _) = controller(GalleryOptions::new(), &[100]);
    let max = c.gallery().max_scroll_offset();
    assert_eq!(c.start_tween_to_offset(u64::MAX, 0, 200, Easing::Linear), max);
    assert!(c.tick(50).is_some());

    assert_eq!(c.on_scroll(10), 10);
    assert!(!c.is_animating());
    assert_eq!(c.tick(100), None);
    assert_eq!(c.gallery().scroll_offset(), 10);
}

#[test]
fn tick_drives_expand_animation() {
    let options = GalleryOptions::new().with_animation(Some(100));
    let (mut c, groups) = controller(options, &[10]);
    let full = c.gallery().group_extent(0);

    click(&mut c, Point::new(5, 5), Modifiers::NONE);
    assert!(c.is_animating());
    assert_eq!(c.tick(50), None);
    let half = c.gallery().group_extent(0);
    assert!(half < full);

    c.tick(150);
    assert!(!c.is_animating());
    assert!(c.gallery().group_extent(0) < half);
    assert_eq!(c.gallery().node(groups[0]).unwrap().expand_ratio(), 0.0);
}

#[test]
fn tween_samples_endpoints_and_retargets() {
    let mut t = Tween::new(100, 0, 10, 0, Easing::Linear);
    assert_eq!(t.duration_ms, 1);
    assert_eq!(t.sample(0), 100);
    assert_eq!(t.sample(11), 0);

    t = Tween::new(0, 100, 0, 100, Easing::Linear);
    assert_eq!(t.sample(50), 50);
    t.retarget(50, 300, 100);
    assert_eq!(t.from, 50);
    assert_eq!(t.sample(150), 300);
}
