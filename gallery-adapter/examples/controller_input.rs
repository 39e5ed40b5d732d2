use gallery::{Easing, GalleryOptions, Point, Size};
use gallery_adapter::{Controller, Key, Modifiers, MouseButton};

fn main() {
    // Example: feeding raw pointer/keyboard/wheel events through the controller without holding
    // any UI objects.
    //
    // An adapter would:
    // - forward toolkit events to the matching `on_*` method
    // - call tick(now_ms) in a frame loop / timer while is_animating()
    // - apply the returned offset to the real scrollbar (if any) and repaint
    let options = GalleryOptions::new()
        .with_multi_selection(true)
        .with_zoom(40, 200, 72.0 / 56.0)
        .with_animation(Some(200));
    let mut c = Controller::new(options);
    c.on_resize(Size::new(300, 240));

    let g = c.gallery_mut();
    for i in 0..20u64 {
        if let Some(group) = g.add_group(i * 1000) {
            g.set_child_count(group, 30);
        }
    }

    let at = Point::new(40, 50);
    c.on_mouse_down(at, MouseButton::Primary, Modifiers::NONE);
    c.on_mouse_up(at, MouseButton::Primary, Modifiers::NONE);
    for _ in 0..5 {
        c.on_key(Key::Down, Modifiers::NONE);
    }
    println!(
        "focus={:?} offset={}",
        c.gallery().focus(),
        c.gallery().scroll_offset()
    );

    c.on_wheel(1, Modifiers::CTRL, 1);
    println!("zoomed item_size={:?}", c.gallery().item_size());

    let last = c.gallery_mut().group(19);
    if let Some(target) = last.and_then(|g| c.gallery_mut().child(g, 0)) {
        let to = c.start_reveal_tween(target, 0, 240, Easing::SmoothStep);
        println!("reveal target_offset={to:?}");
    }

    let mut now_ms = 0u64;
    while c.is_animating() {
        now_ms += 16;
        if let Some(off) = c.tick(now_ms) {
            if now_ms % 80 == 0 {
                println!("t={now_ms} off={off}");
            }
        }
    }
    println!("done: off={}", c.gallery().scroll_offset());
}
