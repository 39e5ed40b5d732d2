use gallery::{Easing, Gallery, GalleryOptions, Hit, NodeId, Point, Size};

use crate::{Key, Modifiers, MouseButton, Tween, zoom_increment};

/// A framework-neutral controller that wraps a [`Gallery`] and turns raw input into gallery
/// operations: click selection, header toggles, drag panning, wheel scrolling and zooming,
/// keyboard navigation and tween-driven smooth reveals.
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_mouse_down` / `on_mouse_up` / `on_mouse_move` / `on_double_click` for pointer events
/// - `on_wheel` and `on_key` for wheel and keyboard events
/// - `on_resize` / `on_scroll` when the host widget changes size or its scrollbar moves
/// - `tick(now_ms)` each frame/timer tick (expand/collapse animations and tween scrolling)
///
/// Points are in viewport coordinates.
#[derive(Debug)]
pub struct Controller {
    g: Gallery,
    tween: Option<Tween>,
    /// Anchor of shift-click ranges; also the gallery focus.
    last_click: Option<NodeId>,
    /// Set when mouse-down already acted, so the matching mouse-up does nothing.
    click_handled: bool,
    pan_from: Option<Point>,
    last_zoom_time: Option<u64>,
}

impl Controller {
    pub fn new(options: GalleryOptions) -> Self {
        Self::from_gallery(Gallery::new(options))
    }

    pub fn from_gallery(g: Gallery) -> Self {
        Self {
            g,
            tween: None,
            last_click: None,
            click_handled: false,
            pan_from: None,
            last_zoom_time: None,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.g
    }

    pub fn gallery_mut(&mut self) -> &mut Gallery {
        &mut self.g
    }

    pub fn into_gallery(self) -> Gallery {
        self.g
    }

    /// The item last clicked or navigated to.
    pub fn last_click(&self) -> Option<NodeId> {
        self.last_click.filter(|&id| self.g.tree().contains(id))
    }

    pub fn is_panning(&self) -> bool {
        self.pan_from.is_some()
    }

    /// Whether a scroll tween or an expand/collapse animation is running.
    pub fn is_animating(&self) -> bool {
        self.tween.is_some() || self.g.is_animating()
    }

    pub fn cancel_animation(&mut self) {
        self.tween = None;
    }

    fn set_last_click(&mut self, item: Option<NodeId>) {
        self.last_click = item;
        self.g.set_focus(item);
    }

    // --- pointer ---

    pub fn on_mouse_down(&mut self, point: Point, button: MouseButton, modifiers: Modifiers) {
        self.click_handled = false;
        let hit = self.g.hit_test(point);

        if let Hit::Header { group, toggle } = hit {
            self.click_handled = true;
            if button == MouseButton::Primary {
                if toggle {
                    self.g.toggle_expanded(group);
                } else {
                    self.select_group(group, modifiers);
                }
            }
            return;
        }

        match button {
            MouseButton::Primary => {
                match hit.item() {
                    None => {
                        self.g.deselect_all();
                        self.set_last_click(None);
                        self.click_handled = true;
                    }
                    Some(item) => {
                        if !modifiers.any() && !self.g.is_selected(item) {
                            self.g.select_only(item);
                            self.set_last_click(Some(item));
                            self.click_handled = true;
                        }
                    }
                }
                self.pan_from = Some(point);
            }
            MouseButton::Secondary => {
                if let Some(item) = hit.item() {
                    if !self.g.is_selected(item) {
                        self.g.select_only(item);
                        self.click_handled = true;
                    }
                }
            }
            MouseButton::Middle => {}
        }
    }

    /// Header click: selects every item of an expanded group (multi-selection only), replacing
    /// the selection unless ctrl is held.
    fn select_group(&mut self, group: NodeId, modifiers: Modifiers) {
        let expanded = self.g.options().always_expanded
            || self.g.node(group).is_some_and(|n| n.is_expanded());
        if !expanded || !self.g.options().multi_selection {
            return;
        }
        self.g.batch_update(|g| {
            if !modifiers.ctrl {
                g.clear_selection();
            }
            g.select_children(group);
        });
    }

    pub fn on_mouse_up(&mut self, point: Point, button: MouseButton, modifiers: Modifiers) {
        self.pan_from = None;
        if self.click_handled || button != MouseButton::Primary {
            return;
        }
        let Some(item) = self.g.hit_test(point).item() else {
            return;
        };

        if modifiers.ctrl {
            self.g.toggle_selected(item);
            self.set_last_click(Some(item));
        } else if modifiers.shift {
            let Some(anchor) = self.last_click() else {
                return;
            };
            self.g.batch_update(|g| {
                g.clear_selection();
                g.select_range(anchor, item);
            });
        } else {
            // Reported only when the click moved to another item.
            if self.last_click() == Some(item) {
                self.g.select_only_silent(item);
            } else {
                self.g.select_only(item);
            }
            self.set_last_click(Some(item));
        }
    }

    /// Pans along the main axis while the primary button is held. Returns whether the gallery
    /// scrolled.
    pub fn on_mouse_move(&mut self, point: Point) -> bool {
        let Some(from) = self.pan_from else {
            return false;
        };
        self.pan_from = Some(point);
        let orientation = self.g.options().orientation;
        let delta = orientation.main_pos(from) - orientation.main_pos(point);
        if delta == 0 {
            return false;
        }
        self.cancel_animation();
        self.g.scroll_by(delta)
    }

    /// Activates the item under `point`. Returns it, if any.
    pub fn on_double_click(&mut self, point: Point) -> Option<NodeId> {
        self.click_handled = true;
        let item = self.g.hit_test(point).item()?;
        self.g.activate(item).then_some(item)
    }

    /// A wheel turn of `lines` notches (positive towards the start).
    ///
    /// With shift or ctrl held this zooms instead of scrolling; hosts may deliver the same
    /// zoom event more than once, so a repeated `event_time_ms` is ignored. Returns whether
    /// anything changed.
    pub fn on_wheel(&mut self, lines: i32, modifiers: Modifiers, event_time_ms: u64) -> bool {
        if lines == 0 {
            return false;
        }
        if modifiers.any() {
            if self.last_zoom_time == Some(event_time_ms) {
                return false;
            }
            self.last_zoom_time = Some(event_time_ms);
            return self.g.zoom(lines > 0, zoom_increment(modifiers)).is_some();
        }

        self.cancel_animation();
        let options = self.g.options();
        let line = options.orientation.main(options.item_size) as i64 + options.min_margin as i64;
        self.g.scroll_by(-(lines as i64) * line)
    }

    // --- keyboard ---

    /// Navigation keys move focus and selection; Enter activates the first selected item.
    /// Returns the item acted on.
    pub fn on_key(&mut self, key: Key, _modifiers: Modifiers) -> Option<NodeId> {
        match key.nav_command() {
            Some(command) => {
                self.cancel_animation();
                let target = self.g.navigate(command)?;
                self.set_last_click(Some(target));
                Some(target)
            }
            None => {
                let first = self.g.selection().first().copied()?;
                self.g.activate(first).then_some(first)
            }
        }
    }

    // --- viewport ---

    pub fn on_resize(&mut self, client: Size) {
        self.g.set_client_size(client);
        if let Some(tween) = &mut self.tween {
            tween.to = tween.to.min(self.g.max_scroll_offset());
        }
    }

    /// Call this when the host scrollbar moves. This cancels any active tween.
    ///
    /// Returns the applied (clamped) offset.
    pub fn on_scroll(&mut self, offset: u64) -> u64 {
        self.cancel_animation();
        self.g.set_scroll_offset(offset)
    }

    /// Advances expand/collapse animations and the scroll tween.
    ///
    /// Returns the new scroll offset while a tween is active, `None` otherwise.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        self.g.tick(now_ms);

        let tween = self.tween?;
        let off = tween.sample(now_ms);
        self.g.set_scroll_offset(off);
        if tween.is_done(now_ms) {
            self.tween = None;
        }
        Some(self.g.scroll_offset())
    }

    /// Applies a scroll offset immediately (no animation).
    ///
    /// Returns the applied (clamped) offset.
    pub fn scroll_to_offset(&mut self, offset: u64) -> u64 {
        self.cancel_animation();
        self.g.set_scroll_offset(offset)
    }

    /// Starts a tween to an offset. Returns the clamped target offset.
    pub fn start_tween_to_offset(
        &mut self,
        offset: u64,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> u64 {
        let to = offset.min(self.g.max_scroll_offset());
        let from = self.g.scroll_offset();
        self.tween = Some(Tween::new(from, to, now_ms, duration_ms, easing));
        to
    }

    /// Starts a tween that makes `id` fully visible with minimal movement.
    ///
    /// Returns the target offset, or `None` if `id` has no visible bounds.
    pub fn start_reveal_tween(
        &mut self,
        id: NodeId,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> Option<u64> {
        let to = self.g.reveal_offset(id)?;
        Some(self.start_tween_to_offset(to, now_ms, duration_ms, easing))
    }
}
