// Example: a plain gallery of eagerly created groups, painted into a text sink.
use gallery::{DrawDelegate, DrawGroup, DrawItem, Gallery, GalleryOptions, Rect, Size};

struct Printer;

impl DrawDelegate for Printer {
    fn draw_group(&mut self, group: &DrawGroup) {
        println!(
            "group #{} key={} rect={:?} items={}",
            group.index, group.key, group.rect, group.child_count
        );
    }

    fn draw_item(&mut self, item: &DrawItem) {
        println!("  item #{} rect={:?}", item.index, item.rect);
    }
}

fn main() {
    let mut g = Gallery::new(GalleryOptions::new().with_multi_selection(true));
    g.set_client_size(Size::new(300, 240));

    for (i, count) in [7usize, 12, 3].into_iter().enumerate() {
        if let Some(group) = g.add_group(i as u64) {
            g.set_child_count(group, count);
        }
    }
    println!("content_extent={}", g.content_extent());

    g.paint(Rect::new(0, 0, 300, 240), &mut Printer);

    if let Some(group) = g.group(1) {
        g.select_children(group);
        println!("selected={}", g.selection().len());
        g.set_expanded(group, false);
        println!("collapsed: content_extent={}", g.content_extent());
    }
}
