use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }

    fn gen_range_u32(&mut self, start: u32, end_exclusive: u32) -> u32 {
        self.gen_range_u64(start as u64, end_exclusive as u64) as u32
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

#[derive(Default)]
struct Recorder {
    groups: Vec<DrawGroup>,
    items: Vec<DrawItem>,
}

impl DrawDelegate for Recorder {
    fn draw_group(&mut self, group: &DrawGroup) {
        self.groups.push(*group);
    }

    fn draw_item(&mut self, item: &DrawItem) {
        self.items.push(*item);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reply {
    Count(usize),
    Pending,
    Fail,
}

struct TestSource {
    reply: Reply,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
}

impl TestSource {
    fn new(reply: Reply) -> (Self, Arc<Mutex<Vec<FetchRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                reply,
                requests: Arc::clone(&requests),
            },
            requests,
        )
    }
}

impl ContentSource for TestSource {
    fn describe_group(&mut self, index: usize) -> ItemDescriptor {
        ItemDescriptor::new(index as ItemKey * 1000)
    }

    fn describe_item(&mut self, group: ItemKey, index: usize) -> ItemDescriptor {
        ItemDescriptor::new(group + index as ItemKey + 1)
    }

    fn fetch_children(&mut self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        self.requests.lock().unwrap().push(*request);
        match self.reply {
            Reply::Count(n) => Ok(FetchOutcome::Count(n)),
            Reply::Pending => Ok(FetchOutcome::Pending),
            Reply::Fail => Err(FetchError::failed(request.group, "offline")),
        }
    }
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

/// A gallery with plain (non-placeholder) groups of the given sizes.
fn grouped(options: GalleryOptions, client: Size, counts: &[usize]) -> (Gallery, Vec<NodeId>) {
    let mut g = Gallery::new(options);
    g.set_client_size(client);
    let mut groups = Vec::new();
    for (i, &count) in counts.iter().enumerate() {
        let id = g.add_group(i as ItemKey * 1000).expect("group");
        assert!(g.set_child_count(id, count));
        groups.push(id);
    }
    (g, groups)
}

fn placeholder_gallery(reply: Reply, groups: usize) -> (Gallery, Arc<Mutex<Vec<FetchRequest>>>) {
    let (source, requests) = TestSource::new(reply);
    let options = GalleryOptions::new().with_virtual_groups(10);
    let mut g = Gallery::with_source(options, source);
    g.set_client_size(Size::new(300, 200));
    g.set_group_count(groups);
    (g, requests)
}

fn paint(g: &mut Gallery) -> Recorder {
    let mut rec = Recorder::default();
    let client = g.client_size();
    g.paint(Rect::new(0, 0, client.width, client.height), &mut rec);
    rec
}

struct MockGrid {
    counts: Vec<usize>,
    per_line: usize,
    collapsed: Vec<usize>,
    expanded: Vec<usize>,
}

impl MockGrid {
    fn new(counts: &[usize], per_line: usize) -> Self {
        Self {
            counts: counts.to_vec(),
            per_line,
            collapsed: Vec::new(),
            expanded: Vec::new(),
        }
    }
}

impl NavigationGrid for MockGrid {
    fn group_count(&self) -> usize {
        self.counts.len()
    }

    fn item_count(&mut self, group: usize) -> usize {
        self.counts.get(group).copied().unwrap_or(0)
    }

    fn is_navigable(&self, group: usize) -> bool {
        !self.collapsed.contains(&group)
    }

    fn line_len(&self, _group: usize) -> usize {
        self.per_line
    }

    fn expand(&mut self, group: usize) {
        self.collapsed.retain(|&g| g != group);
        self.expanded.push(group);
    }
}

#[test]
fn grid_lines_cover_every_item() {
    let mut rng = Lcg::new(0x5eed);
    for _ in 0..2_000 {
        let min_margin = rng.gen_range_u32(0, 10);
        let spec = GridSpec {
            item: Size::new(rng.gen_range_u32(1, 200), rng.gen_range_u32(1, 200)),
            min_margin,
            auto_margin: rng.gen_bool(),
            orientation: if rng.gen_bool() {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            },
        };
        let available = rng.gen_range_u32(min_margin + 1, 2_000);
        let count = rng.gen_range_usize(0, 500);
        let grid = GridMetrics::compute(&spec, available, count);

        if count == 0 {
            assert_eq!(grid.lines, 0);
            continue;
        }
        assert!(grid.per_line >= 1);
        assert_eq!(grid.lines, count.div_ceil(grid.per_line));

        let fits = (available - min_margin) / (spec.item_cross() + min_margin).max(1) > 0;
        if fits {
            let last_in_line = grid.per_line.min(count) - 1;
            let (_, cross) = grid.item_offset(last_in_line);
            assert!(
                cross + spec.item_cross() as u64 + min_margin as u64 <= available as u64,
                "line overflows: {grid:?} in {available}"
            );
        }
    }
}

#[test]
fn example_scenario_one_group_of_hundred() {
    let options = GalleryOptions::new()
        .with_header_size(None)
        .with_virtual_items(true);
    let (mut g, groups) = grouped(options, Size::new(300, 112), &[100]);

    let grid = *g.node(groups[0]).unwrap().grid();
    assert_eq!(grid.per_line, 4);
    assert_eq!(grid.lines, 25);
    assert_eq!(grid.columns(), 4);
    assert_eq!(grid.rows(), 25);

    let rec = paint(&mut g);
    let indexes: Vec<usize> = rec.items.iter().map(|i| i.index).collect();
    assert_eq!(indexes, (0..8).collect::<Vec<_>>());
    assert_eq!(rec.items[0].rect, Rect::new(2, 2, 72, 56));
    assert_eq!(rec.items[4].rect, Rect::new(2, 60, 72, 56));
    assert_eq!(rec.items[1].rect.x, 76);

    // Only drawn items exist.
    assert_eq!(g.tree().len(), 1 + 8);
}

#[test]
fn selection_flags_match_selection_order() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut g, groups) = grouped(options, Size::new(300, 400), &[50, 50, 50]);
    let items: Vec<NodeId> = groups
        .iter()
        .flat_map(|&group| {
            let node = g.node(group).unwrap();
            node.children().iter().flatten().copied().collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(items.len(), 150);

    let mut rng = Lcg::new(7);
    for _ in 0..1_000 {
        let id = items[rng.gen_range_usize(0, items.len())];
        if rng.gen_bool() {
            g.select(id);
            let snapshot = g.selection().to_vec();
            assert!(!g.select(id), "select is idempotent");
            assert_eq!(g.selection(), snapshot.as_slice());
        } else {
            g.deselect(id);
        }
        for &n in &items {
            assert_eq!(g.is_selected(n), g.selection().contains(&n));
        }
    }
}

#[test]
fn deselect_all_clears_every_flag() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (opts, events) = event_log(options);
    let (mut g, groups) = grouped(opts, Size::new(300, 400), &[40, 40]);
    let mut rng = Lcg::new(99);
    for _ in 0..60 {
        let group = groups[rng.gen_range_usize(0, 2)];
        let item = g.child(group, rng.gen_range_usize(0, 40)).unwrap();
        g.select(item);
    }
    g.select(groups[1]);
    assert!(!g.selection().is_empty());

    assert!(g.deselect_all());
    assert!(g.selection().is_empty());
    for &group in &groups {
        assert!(!g.is_selected(group));
        for i in 0..40 {
            let item = g.child(group, i).unwrap();
            assert!(!g.is_selected(item));
        }
    }
    let last = events.lock().unwrap().last().cloned();
    assert_eq!(
        last,
        Some(GalleryEvent::SelectionChanged {
            node: None,
            activated: false
        })
    );
    assert!(!g.deselect_all());
}

#[test]
fn deselect_all_drops_only_tracked_group_lists() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let counts = [4; 50];
    let (mut g, groups) = grouped(options, Size::new(300, 400), &counts);
    for &group in groups.iter().step_by(5) {
        let item = g.child(group, 1).unwrap();
        assert!(g.select(item));
    }
    assert_eq!(g.selection.group_lists(), 10);

    // Emptying a group's list forgets it.
    let item = g.child(groups[0], 1).unwrap();
    assert!(g.deselect(item));
    assert!(!g.deselect(item));
    assert_eq!(g.selection.group_lists(), 9);

    // Deselecting in a group that never held a selection records nothing.
    let untouched = g.child(groups[1], 0).unwrap();
    assert!(!g.deselect(untouched));
    assert_eq!(g.selection.group_lists(), 9);

    assert!(g.deselect_all());
    assert_eq!(g.selection.group_lists(), 0);
    for &group in &groups {
        for i in 0..4 {
            let item = g.child(group, i).unwrap();
            assert!(!g.is_selected(item));
        }
    }

    let again = g.child(groups[7], 3).unwrap();
    assert!(g.select(again));
    assert_eq!(g.selection(), &[again]);
    assert_eq!(g.selection.group_lists(), 1);
}

#[test]
fn single_selection_replaces_previous() {
    let (mut g, groups) = grouped(GalleryOptions::new(), Size::new(300, 400), &[5, 5]);
    let a = g.child(groups[0], 1).unwrap();
    let b = g.child(groups[1], 3).unwrap();
    assert!(g.select(a));
    assert!(g.select(b));
    assert_eq!(g.selection(), &[b]);
    assert!(!g.is_selected(a));

    // A range collapses to its end without multi-selection.
    assert!(!g.select_range(a, b));
    assert_eq!(g.selection(), &[b]);
    assert!(!g.select_all());
}

#[test]
fn select_range_spans_groups_in_tree_order() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut g, groups) = grouped(options, Size::new(300, 400), &[4, 4, 4]);
    let from = g.child(groups[0], 2).unwrap();
    let to = g.child(groups[2], 1).unwrap();
    assert!(g.select_range(to, from));

    let expected = [(0, 2), (0, 3), (1, 0), (1, 1), (1, 2), (1, 3), (2, 0), (2, 1)];
    assert_eq!(g.selection().len(), expected.len());
    for (group, index) in expected {
        let id = g.child(groups[group], index).unwrap();
        assert!(g.is_selected(id), "({group}, {index})");
    }
    assert!(!g.is_selected(groups[1]));

    // Two group ends select the groups too.
    g.deselect_all();
    assert!(g.select_range(groups[0], groups[1]));
    assert_eq!(g.selection().len(), 2 + 8);
    assert!(g.is_selected(groups[0]) && g.is_selected(groups[1]));
}

#[test]
fn removal_keeps_selection_aligned_with_positions() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut g, groups) = grouped(options, Size::new(300, 400), &[5]);
    let third = g.child(groups[0], 3).unwrap();
    let first = g.child(groups[0], 1).unwrap();
    g.select(third);

    assert!(g.remove(first));
    assert_eq!(g.node(third).unwrap().index(), 2);
    assert!(g.is_selected(third));
    for i in [0, 1, 3] {
        let id = g.child(groups[0], i).unwrap();
        assert!(!g.is_selected(id));
    }

    let inserted = g.insert_item(groups[0], Some(0), ItemDescriptor::new(77)).unwrap();
    assert!(!g.is_selected(inserted));
    assert!(g.is_selected(third));
    assert_eq!(g.node(third).unwrap().index(), 3);
}

#[test]
fn shrinking_group_count_drops_selection_of_removed_groups() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut g, groups) = grouped(options, Size::new(300, 400), &[3, 3, 3]);
    let kept = g.child(groups[0], 0).unwrap();
    let dropped = g.child(groups[2], 0).unwrap();
    g.select(kept);
    g.select(dropped);

    g.set_group_count(2);
    assert_eq!(g.group_count(), 2);
    assert_eq!(g.selection(), &[kept]);
    assert!(g.node(dropped).is_none());
}

#[test]
fn viewport_preserves_relative_location() {
    let mut v = ViewportModel::new(Orientation::Vertical);
    v.set_client(Size::new(100, 500));
    v.set_extent(10_000);
    assert_eq!(v.set_offset(3_000), 3_000);

    let location = v.capture_location().unwrap();
    v.set_extent(20_000);
    v.restore_location(location);
    assert_eq!(v.offset(), 6_250);

    let before = (3_000.0 + 250.0) / 10_000.0;
    let after = (v.offset() as f64 + 250.0) / 20_000.0;
    assert!((before - after).abs() < 1.0 / 20_000.0);
}

#[test]
fn viewport_clamps_offset() {
    let mut v = ViewportModel::new(Orientation::Horizontal);
    v.set_client(Size::new(400, 50));
    v.set_extent(1_000);
    assert_eq!(v.set_offset(5_000), 600);
    v.set_extent(300);
    assert_eq!(v.offset(), 0);
    assert!(!v.scroll_by(-10));
    assert_eq!(v.scroll_range(), ScrollRange { offset: 0, extent: 300, window: 400 });
}

#[test]
fn resize_keeps_relative_location() {
    let (mut g, _) = grouped(GalleryOptions::new(), Size::new(300, 200), &[200, 200]);
    g.set_scroll_offset(4_000);
    let before = g.viewport().capture_location().unwrap();

    g.set_client_size(Size::new(600, 200));
    let after = g.viewport().capture_location().unwrap();
    assert!((before - after).abs() < 0.001, "{before} vs {after}");
    assert!(g.scroll_offset() < 4_000);
}

#[test]
fn navigation_wraps_between_groups() {
    let (mut g, groups) = grouped(GalleryOptions::new(), Size::new(230, 400), &[3, 3]);
    assert_eq!(g.node(groups[0]).unwrap().grid().per_line, 3);

    let resolver = NavigationResolver::new(Orientation::Vertical, 4);
    assert_eq!(
        resolver.resolve(&mut g, Some(GridPosition::new(0, 2)), NavCommand::Right),
        Some(GridPosition::new(1, 0))
    );
    assert_eq!(
        resolver.resolve(&mut g, Some(GridPosition::new(1, 0)), NavCommand::Left),
        Some(GridPosition::new(0, 2))
    );
    assert_eq!(
        resolver.resolve(&mut g, Some(GridPosition::new(1, 2)), NavCommand::Right),
        None
    );

    let last = g.child(groups[0], 2).unwrap();
    g.select(last);
    let next = g.navigate(NavCommand::Right).unwrap();
    assert_eq!(g.position_of(next), Some((1, 0)));
    assert_eq!(g.selection(), &[next]);
    assert_eq!(g.focus(), Some(next));
}

#[test]
fn focused_group_navigates_from_its_first_item() {
    let (mut g, groups) = grouped(GalleryOptions::new(), Size::new(230, 400), &[3, 3]);
    g.set_focus(Some(groups[1]));
    let target = g.resolve_navigation(NavCommand::Right).unwrap();
    assert_eq!(g.position_of(target), Some((1, 1)));
    let target = g.resolve_navigation(NavCommand::Left).unwrap();
    assert_eq!(g.position_of(target), Some((0, 2)));
    // Resolving moves nothing.
    assert_eq!(g.focus(), Some(groups[1]));
}

#[test]
fn navigation_without_focus_lands_on_first_item() {
    let mut grid = MockGrid::new(&[0, 4, 4], 2);
    grid.collapsed.push(1);
    let resolver = NavigationResolver::new(Orientation::Vertical, 3);
    assert_eq!(
        resolver.resolve(&mut grid, None, NavCommand::End),
        Some(GridPosition::new(2, 0))
    );
    // Collapsed groups are skipped.
    assert_eq!(
        resolver.resolve(&mut grid, Some(GridPosition::new(2, 0)), NavCommand::Left),
        None
    );
}

#[test]
fn vertical_move_clamps_to_last_item_of_target_line() {
    let mut grid = MockGrid::new(&[7, 2], 3);
    let resolver = NavigationResolver::new(Orientation::Vertical, 3);
    // Column 1 of the last line of group 0 is empty (line holds only index 6).
    assert_eq!(
        resolver.resolve(&mut grid, Some(GridPosition::new(1, 1)), NavCommand::Up),
        Some(GridPosition::new(0, 6))
    );
    assert_eq!(
        resolver.resolve(&mut grid, Some(GridPosition::new(0, 5)), NavCommand::Down),
        Some(GridPosition::new(1, 1))
    );
    // Horizontal galleries step lines with left/right.
    let horizontal = NavigationResolver::new(Orientation::Horizontal, 3);
    assert_eq!(
        horizontal.resolve(&mut grid, Some(GridPosition::new(0, 1)), NavCommand::Right),
        Some(GridPosition::new(0, 4))
    );
    assert_eq!(
        horizontal.resolve(&mut grid, Some(GridPosition::new(0, 1)), NavCommand::Down),
        Some(GridPosition::new(0, 2))
    );
}

#[test]
fn page_moves_chain_lines_across_groups() {
    let mut grid = MockGrid::new(&[6, 6], 3);
    let resolver = NavigationResolver::new(Orientation::Vertical, 3);
    assert_eq!(resolver.page_lines(), 2);
    assert_eq!(
        resolver.resolve(&mut grid, Some(GridPosition::new(0, 1)), NavCommand::PageDown),
        Some(GridPosition::new(1, 1))
    );
    // Stops at the last reachable line.
    assert_eq!(
        resolver.resolve(&mut grid, Some(GridPosition::new(1, 1)), NavCommand::PageDown),
        Some(GridPosition::new(1, 4))
    );
    assert_eq!(NavigationResolver::new(Orientation::Vertical, 0).page_lines(), 1);
}

#[test]
fn home_and_end_expand_their_group() {
    let mut grid = MockGrid::new(&[3, 5], 2);
    grid.collapsed.push(1);
    let resolver = NavigationResolver::new(Orientation::Vertical, 3);
    assert_eq!(
        resolver.resolve(&mut grid, Some(GridPosition::new(0, 1)), NavCommand::End),
        Some(GridPosition::new(1, 4))
    );
    assert_eq!(grid.expanded, [1]);
    assert_eq!(
        resolver.resolve(&mut grid, Some(GridPosition::new(1, 4)), NavCommand::Home),
        Some(GridPosition::new(0, 0))
    );
}

#[test]
fn navigate_reveals_target() {
    let (mut g, _) = grouped(GalleryOptions::new(), Size::new(300, 100), &[40]);
    assert_eq!(g.content_extent(), 22 + 10 * 58);

    let first = g.navigate(NavCommand::Right).unwrap();
    assert_eq!(g.position_of(first), Some((0, 0)));
    let last = g.navigate(NavCommand::End).unwrap();
    assert_eq!(g.position_of(last), Some((0, 39)));
    assert_eq!(g.scroll_offset(), 500);
    assert_eq!(g.selection(), &[last]);
}

#[test]
fn placeholder_above_viewport_shifts_offset_by_delta() {
    let (mut g, requests) = placeholder_gallery(Reply::Count(40), 20);
    assert_eq!(g.group_extent(0), 22 + 3 * 58);
    assert_eq!(g.content_extent(), 20 * 196);

    g.set_scroll_offset(1_000);
    paint(&mut g);

    // Group 5 started above the offset and grew from 196 to 602.
    assert_eq!(g.group_extent(5), 22 + 10 * 58);
    assert_eq!(g.scroll_offset(), 1_000 + 406);
    let group5 = g.tree().root(5).unwrap();
    assert!(!g.node(group5).unwrap().is_placeholder());
    assert_eq!(g.node(group5).unwrap().child_count(), 40);

    // Group 6 became visible after the shift but started below the offset.
    let group6 = g.tree().root(6).unwrap();
    assert!(!g.node(group6).unwrap().is_placeholder());
    // Groups that were never on screen were never created.
    assert!((0..5).all(|i| g.tree().root(i).is_none()));
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[test]
fn placeholder_shrinking_at_end_shifts_offset_once() {
    let (mut g, _) = placeholder_gallery(Reply::Count(1), 20);
    let max = g.set_scroll_offset(u64::MAX);
    assert_eq!(max, 20 * 196 - 200);

    // Group 18 starts above the offset and shrinks from 196 to 80, which also lowers the
    // maximum offset by the same amount.
    let group18 = g.group(18).unwrap();
    assert!(g.child(group18, 0).is_some());
    assert_eq!(g.group_extent(18), 22 + 58);
    assert_eq!(g.scroll_offset(), max - 116);
    assert_eq!(g.scroll_offset(), g.max_scroll_offset());
}

#[test]
fn placeholder_below_offset_does_not_move_viewport() {
    let (mut g, requests) = placeholder_gallery(Reply::Count(40), 5);
    let rec = paint(&mut g);
    assert_eq!(g.scroll_offset(), 0);
    assert_eq!(requests.lock().unwrap().len(), 1);
    assert_eq!(rec.groups.len(), 1);
    assert!(!rec.groups[0].placeholder);
    // Four lines intersect the window below the header.
    assert_eq!(rec.items.len(), 4 * 4);
    assert_eq!(rec.items[0].key, 1);
}

#[test]
fn keep_position_restores_location_instead_of_shifting() {
    let (mut g, _) = placeholder_gallery(Reply::Count(40), 20);
    g.set_scroll_offset(1_000);
    g.keep_position();
    paint(&mut g);

    // (1000 + 100) / 3920 of the new 4326 extent, minus half a window.
    let expected = 4_326.0 * (1_100.0 / 3_920.0) - 100.0;
    assert!((g.scroll_offset() as f64 - expected).abs() <= 1.0);
}

#[test]
fn compatibility_mode_materializes_preceding_groups() {
    let (source, requests) = TestSource::new(Reply::Count(2));
    let options = GalleryOptions::new()
        .with_virtual_groups(10)
        .with_compatibility_mode(true);
    let mut g = Gallery::with_source(options, source);
    g.set_client_size(Size::new(300, 200));
    g.set_group_count(10);
    g.set_scroll_offset(196 * 6);
    paint(&mut g);

    let fetched: Vec<usize> = requests.lock().unwrap().iter().map(|r| r.index).collect();
    assert_eq!(&fetched[..7], &[0, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn late_fetch_result_is_discarded() {
    let (mut g, requests) = placeholder_gallery(Reply::Pending, 3);
    paint(&mut g);
    let tickets: Vec<FetchTicket> = requests.lock().unwrap().iter().map(|r| r.ticket).collect();
    assert_eq!(tickets.len(), 2);
    let group0 = g.tree().root(0).unwrap();
    assert_eq!(g.node(group0).unwrap().fetch_state(), FetchState::Pending);

    assert!(g.clear(0, false));
    assert!(!g.complete_fetch(tickets[0], Ok(FetchOutcome::Count(5))));
    assert!(g.node(group0).unwrap().is_placeholder());

    assert!(g.complete_fetch(tickets[1], Ok(FetchOutcome::Count(5))));
    let group1 = g.tree().root(1).unwrap();
    assert_eq!(g.node(group1).unwrap().child_count(), 5);
    assert!(!g.complete_fetch(tickets[1], Ok(FetchOutcome::Count(6))));

    paint(&mut g);
    let retry = requests.lock().unwrap().last().unwrap().ticket;
    assert_eq!(retry.node, group0);
    assert_eq!(retry.version, tickets[0].version + 1);
    assert!(g.complete_fetch(retry, Ok(FetchOutcome::Ready(Vec::new()))));
    // An empty group keeps only its header.
    assert_eq!(g.group_extent(0), 22);
}

#[test]
fn fetch_failure_keeps_placeholder_and_reports() {
    let (source, requests) = TestSource::new(Reply::Fail);
    let (options, events) = event_log(GalleryOptions::new().with_virtual_groups(10));
    let mut g = Gallery::with_source(options, source);
    g.set_client_size(Size::new(300, 200));
    g.set_group_count(3);
    paint(&mut g);

    let group0 = g.tree().root(0).unwrap();
    let node = g.node(group0).unwrap();
    assert!(node.is_placeholder());
    assert_eq!(node.fetch_state(), FetchState::Failed);
    assert_eq!(node.child_count(), 10);
    let failures = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, GalleryEvent::FetchFailed { .. }))
        .count();
    assert_eq!(failures, 2);

    // No automatic retry.
    paint(&mut g);
    assert_eq!(requests.lock().unwrap().len(), 2);
    assert!(matches!(g.refresh_group(0), Materialized::Failed(_)));
    assert_eq!(requests.lock().unwrap().len(), 3);
}

#[test]
fn refresh_of_plain_group_reports_fetch_and_keeps_view() {
    let count = Arc::new(AtomicUsize::new(40));
    let source = {
        let count = Arc::clone(&count);
        move |_: &FetchRequest| -> Result<FetchOutcome, FetchError> {
            Ok(FetchOutcome::Count(count.load(Ordering::Relaxed)))
        }
    };
    let mut g = Gallery::with_source(GalleryOptions::new(), source);
    g.set_client_size(Size::new(300, 200));
    g.set_group_count(3);
    assert_eq!(g.group_extent(0), 22 + 10 * 58);
    g.set_scroll_offset(700);

    count.store(80, Ordering::Relaxed);
    assert!(matches!(
        g.refresh_group(0),
        Materialized::Ready { count: 80, .. }
    ));
    assert_eq!(g.group_extent(0), 22 + 20 * 58);
    assert_eq!(g.scroll_offset(), 700 + 10 * 58);

    // Clearing fetches again right away and compensates the shrink the same way.
    count.store(40, Ordering::Relaxed);
    assert!(g.clear(0, false));
    assert_eq!(g.group_extent(0), 22 + 10 * 58);
    assert_eq!(g.scroll_offset(), 700);
}

#[test]
fn missing_source_reports_unavailable_for_placeholders() {
    let (options, events) = event_log(GalleryOptions::new().with_virtual_groups(4));
    let mut g = Gallery::new(options);
    g.set_client_size(Size::new(300, 200));
    g.set_group_count(1);
    paint(&mut g);
    let group = g.tree().root(0).unwrap();
    assert_eq!(
        events.lock().unwrap().last().cloned(),
        Some(GalleryEvent::FetchFailed {
            group,
            error: FetchError::Unavailable { group: 0 },
        })
    );
}

#[test]
fn expand_animation_reverses_from_current_ratio() {
    let mut g = Gallery::new(GalleryOptions::new());
    let group = g.add_group(ItemDescriptor::new(1)).unwrap();
    let mut animator = ExpandAnimator::new();

    animator.start(group, false, 1.0, 0, 100, Easing::Linear);
    assert!((animator.ratio(group, 50).unwrap() - 0.5).abs() < 1e-6);

    animator.start(group, true, 0.0, 50, 100, Easing::Linear);
    assert!((animator.ratio(group, 50).unwrap() - 0.5).abs() < 1e-6);
    assert!((animator.ratio(group, 100).unwrap() - 0.75).abs() < 1e-6);

    let frame = animator.tick(150, |_| true);
    assert_eq!(frame.updated, [(group, 1.0)]);
    assert_eq!(frame.finished, [group]);
    assert!(animator.is_empty());
}

#[test]
fn animation_on_dead_group_stops_silently() {
    let mut g = Gallery::new(GalleryOptions::new());
    let group = g.add_group(ItemDescriptor::new(1)).unwrap();
    let mut animator = ExpandAnimator::new();
    animator.start(group, true, 0.0, 0, 100, Easing::SmoothStep);
    let frame = animator.tick(10, |_| false);
    assert!(frame.is_empty());
    assert!(animator.is_empty());
}

#[test]
fn easing_curves_hit_their_bounds() {
    for easing in [
        Easing::Linear,
        Easing::SmoothStep,
        Easing::EaseInOutCubic,
        Easing::EaseOutCubic,
    ] {
        assert_eq!(easing.sample(0.0), 0.0);
        assert!((easing.sample(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(easing.sample(2.0), easing.sample(1.0));
    }
}

#[test]
fn animated_collapse_scales_group_body() {
    let options = GalleryOptions::new()
        .with_animation(Some(100))
        .with_animation_easing(Easing::Linear, Easing::Linear);
    let (options, events) = event_log(options);
    let (mut g, groups) = grouped(options, Size::new(300, 400), &[8, 1]);
    assert_eq!(g.group_extent(0), 22 + 2 * 58);

    g.set_now(0);
    assert!(g.set_expanded(groups[0], false));
    assert_eq!(g.group_extent(0), 138);
    assert!(g.is_animating());

    assert!(g.tick(50));
    assert_eq!(g.group_extent(0), 22 + 58);
    assert_eq!(g.group_start(1), 80);

    assert!(!g.tick(100));
    assert_eq!(g.group_extent(0), 22);
    assert_eq!(
        events.lock().unwrap().first().cloned(),
        Some(GalleryEvent::ExpandChanged {
            group: groups[0],
            expanded: false
        })
    );

    // Reopening mid-way starts from the current ratio.
    assert!(g.toggle_expanded(groups[0]));
    assert!(g.tick(150));
    assert_eq!(g.group_extent(0), 22 + 58);
    assert!(g.remove(groups[0]));
    assert!(!g.tick(160));
}

#[test]
fn collapse_deselects_items_and_hides_them() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut g, groups) = grouped(options, Size::new(300, 400), &[6, 2]);
    let item = g.child(groups[0], 1).unwrap();
    let other = g.child(groups[1], 0).unwrap();
    g.select(item);
    g.select(other);

    assert!(g.set_expanded(groups[0], false));
    assert!(!g.is_selected(item));
    assert!(g.is_selected(other));
    assert_eq!(g.item_rect(item), None);
    assert_eq!(g.group_extent(0), 22);

    let rec = paint(&mut g);
    assert!(rec.items.iter().all(|i| i.group != groups[0]));
    assert!(!g.set_expanded(groups[0], false));
}

#[test]
fn always_expanded_ignores_collapse() {
    let options = GalleryOptions::new().with_always_expanded(true);
    let (mut g, groups) = grouped(options, Size::new(300, 400), &[6]);
    assert!(!g.toggle_expanded(groups[0]));
    assert!(g.node(groups[0]).unwrap().is_expanded());
    assert_eq!(
        g.hit_test(Point::new(5, 5)),
        Hit::Header {
            group: groups[0],
            toggle: false
        }
    );
}

#[test]
fn hit_test_maps_points_to_nodes() {
    let (mut g, groups) = grouped(GalleryOptions::new(), Size::new(300, 400), &[10]);
    let group = groups[0];

    assert_eq!(g.hit_test(Point::new(5, 5)), Hit::Header { group, toggle: true });
    assert_eq!(g.hit_test(Point::new(100, 5)), Hit::Header { group, toggle: false });

    let first = g.child(group, 0).unwrap();
    assert_eq!(g.hit_test(Point::new(3, 23)), Hit::Item { group, item: first });
    let sixth = g.child(group, 5).unwrap();
    assert_eq!(g.hit_test(Point::new(80, 85)).item(), Some(sixth));

    // Margins and space below the grid belong to the group.
    assert_eq!(g.hit_test(Point::new(1, 30)), Hit::Group(group));
    assert_eq!(g.hit_test(Point::new(3, 21)), Hit::Group(group));
    assert_eq!(g.hit_test(Point::new(3, 10_000)), Hit::None);
    assert_eq!(g.hit_test(Point::new(-1, 30)), Hit::None);
}

#[test]
fn horizontal_orientation_transposes_layout() {
    let options = GalleryOptions::new()
        .with_orientation(Orientation::Horizontal)
        .with_header_size(None);
    let (g, groups) = grouped(options, Size::new(300, 300), &[10]);
    let grid = *g.node(groups[0]).unwrap().grid();
    assert_eq!(grid.per_line, 5);
    assert_eq!(grid.columns(), 2);
    assert_eq!(grid.rows(), 5);

    let item = |i| g.node(groups[0]).unwrap().child(i).unwrap();
    assert_eq!(g.item_rect(item(0)), Some(Rect::new(2, 3, 72, 56)));
    assert_eq!(g.item_rect(item(1)), Some(Rect::new(2, 62, 72, 56)));
    assert_eq!(g.item_rect(item(5)), Some(Rect::new(76, 3, 72, 56)));
    assert_eq!(g.content_extent(), 2 + 2 * 74);
}

#[test]
fn zoom_clamps_width_and_keeps_ratio() {
    let options = GalleryOptions::new()
        .with_item_size(72, 36)
        .with_zoom(40, 100, 2.0);
    let (options, events) = event_log(options);
    let (mut g, _) = grouped(options, Size::new(300, 300), &[20]);

    assert_eq!(g.zoom(true, 50), Some(Size::new(100, 50)));
    assert_eq!(g.item_size(), Size::new(100, 50));
    assert_eq!(g.zoom(true, 1), None);
    assert_eq!(g.zoom(false, 100), Some(Size::new(40, 20)));
    assert_eq!(g.zoom(false, 1), None);

    let zooms = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, GalleryEvent::Zoomed { .. }))
        .count();
    assert_eq!(zooms, 2);

    let mut fixed = Gallery::new(GalleryOptions::new());
    assert_eq!(fixed.zoom(true, 10), None);
}

#[test]
fn activation_is_reported_separately_from_selection() {
    let (options, events) = event_log(GalleryOptions::new());
    let (mut g, groups) = grouped(options, Size::new(300, 300), &[3]);
    let item = g.child(groups[0], 2).unwrap();
    g.select(item);
    assert_eq!(g.activate_current(), Some(item));
    let log = events.lock().unwrap().clone();
    assert_eq!(
        log,
        [
            GalleryEvent::SelectionChanged {
                node: Some(item),
                activated: false
            },
            GalleryEvent::SelectionChanged {
                node: Some(item),
                activated: true
            },
        ]
    );
}

#[test]
fn batch_update_coalesces_on_change() {
    let calls: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    let options = GalleryOptions::new().with_on_change(Some({
        let calls = Arc::clone(&calls);
        move |_: &Gallery| {
            calls.fetch_add(1, Ordering::Relaxed);
        }
    }));
    let mut g = Gallery::new(options);

    g.batch_update(|g| {
        g.set_client_size(Size::new(300, 300));
        g.set_group_count(4);
        g.batch_update(|g| {
            g.set_scroll_offset(10);
            g.set_item_size(Size::new(60, 40));
        });
    });

    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn no_op_setters_do_not_notify() {
    let calls: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    let options = GalleryOptions::new().with_on_change(Some({
        let calls = Arc::clone(&calls);
        move |_: &Gallery| {
            calls.fetch_add(1, Ordering::Relaxed);
        }
    }));
    let (mut g, _) = grouped(options, Size::new(300, 100), &[40]);
    let base = calls.load(Ordering::Relaxed);

    g.set_client_size(Size::new(300, 100));
    g.set_item_size(Size::new(72, 56));
    g.set_orientation(Orientation::Vertical);
    g.set_scroll_offset(0);
    assert_eq!(calls.load(Ordering::Relaxed), base);

    g.set_scroll_offset(50);
    assert_eq!(calls.load(Ordering::Relaxed), base + 1);
}

#[test]
fn clear_all_with_redescribe_rekeys_groups() {
    let (mut g, _) = placeholder_gallery(Reply::Count(3), 2);
    paint(&mut g);
    let group0 = g.tree().root(0).unwrap();
    assert_eq!(g.find(0), Some(group0));

    g.clear_all(true);
    assert!(g.node(group0).unwrap().is_placeholder());
    assert_eq!(g.node(group0).unwrap().child_count(), 10);
    assert_eq!(g.find(1000), g.tree().root(1));
}

#[test]
fn view_state_restores_position() {
    let (mut g, _) = grouped(GalleryOptions::new(), Size::new(300, 200), &[100, 100]);
    g.set_scroll_offset(1_234);
    let state = g.view_state();

    let (mut other, _) = grouped(GalleryOptions::new(), Size::new(300, 200), &[100, 100]);
    other.restore_view_state(&state);
    assert!((other.scroll_offset() as i64 - 1_234).abs() <= 1);
    assert_eq!(other.scroll_range().extent, g.scroll_range().extent);
}

#[test]
fn set_options_switches_selection_mode() {
    let options = GalleryOptions::new().with_multi_selection(true);
    let (mut g, groups) = grouped(options, Size::new(300, 300), &[4]);
    let a = g.child(groups[0], 0).unwrap();
    let b = g.child(groups[0], 1).unwrap();
    g.select(a);
    g.select(b);
    assert_eq!(g.selection().len(), 2);

    g.update_options(|o| o.multi_selection = false);
    assert_eq!(g.selection(), &[a]);
    assert!(!g.is_selected(b));
}

#[test]
fn selection_bits_track_touched_blocks() {
    let mut bits = SelectionBits::new();
    assert!(bits.insert(3));
    assert!(bits.insert(70));
    assert!(!bits.insert(70));
    assert_eq!(bits.positions(), [3, 70]);

    bits.remove_at(10);
    assert_eq!(bits.positions(), [3, 69]);
    bits.insert_at(0);
    assert_eq!(bits.positions(), [4, 70]);

    bits.clear();
    assert!(bits.is_empty());
    assert!(!bits.contains(4));
}
