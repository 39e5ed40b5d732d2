// Example: placeholder groups fetched on first paint, with scroll compensation.
use gallery::{
    DrawDelegate, DrawItem, FetchError, FetchOutcome, FetchRequest, Gallery, GalleryOptions,
    Rect, Size,
};

struct Count(usize);

impl DrawDelegate for Count {
    fn draw_item(&mut self, _item: &DrawItem) {
        self.0 += 1;
    }
}

fn main() {
    let source = |req: &FetchRequest| -> Result<FetchOutcome, FetchError> {
        // Real sizes vary per group; placeholders assume 10 items.
        Ok(FetchOutcome::Count(20 + req.index % 7 * 15))
    };
    let mut g = Gallery::with_source(GalleryOptions::new().with_virtual_groups(10), source);
    g.set_client_size(Size::new(400, 300));
    g.set_group_count(100_000);
    println!("estimated extent={}", g.content_extent());

    g.set_scroll_offset(g.max_scroll_offset() / 2);
    let before = g.scroll_offset();
    let mut drawn = Count(0);
    g.paint(Rect::new(0, 0, 400, 300), &mut drawn);
    println!(
        "offset {before} -> {} after materializing, drawn={} nodes={}",
        g.scroll_offset(),
        drawn.0,
        g.tree().len()
    );
}
