use crate::Orientation;

/// Keyboard navigation commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavCommand {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// An item addressed by group position and position within the group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPosition {
    pub group: usize,
    pub index: usize,
}

impl GridPosition {
    pub const fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

/// The view of a gallery that navigation needs.
pub trait NavigationGrid {
    fn group_count(&self) -> usize;

    /// Real number of items in `group`. May materialize a placeholder group.
    fn item_count(&mut self, group: usize) -> usize;

    /// Whether items of `group` can be moved into (the group is expanded).
    fn is_navigable(&self, group: usize) -> bool;

    /// Items per line of `group` along the cross axis.
    fn line_len(&self, group: usize) -> usize;

    fn expand(&mut self, group: usize);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Back,
    Forward,
    LinesBack(usize),
    LinesForward(usize),
}

/// Maps a focused item and a [`NavCommand`] to the next item to focus.
///
/// Moves cross group boundaries into the previous or next navigable, non-empty group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationResolver {
    pub orientation: Orientation,
    /// Whole lines that fit in the viewport along the main axis.
    pub visible_lines: usize,
}

impl NavigationResolver {
    pub fn new(orientation: Orientation, visible_lines: usize) -> Self {
        Self {
            orientation,
            visible_lines,
        }
    }

    /// Lines moved by a page command.
    pub fn page_lines(&self) -> usize {
        self.visible_lines.saturating_sub(1).max(1)
    }

    fn step(&self, command: NavCommand) -> Option<Step> {
        use NavCommand::*;
        use Orientation::*;
        let step = match (self.orientation, command) {
            (Vertical, Left) | (Horizontal, Up) => Step::Back,
            (Vertical, Right) | (Horizontal, Down) => Step::Forward,
            (Vertical, Up) | (Horizontal, Left) => Step::LinesBack(1),
            (Vertical, Down) | (Horizontal, Right) => Step::LinesForward(1),
            (_, PageUp) => Step::LinesBack(self.page_lines()),
            (_, PageDown) => Step::LinesForward(self.page_lines()),
            (_, Home) | (_, End) => return None,
        };
        Some(step)
    }

    /// Resolves `command` from `current`.
    ///
    /// With no current item, any command lands on the first item of the first non-empty,
    /// navigable group. `None` means there is nowhere to go.
    pub fn resolve<G: NavigationGrid + ?Sized>(
        &self,
        grid: &mut G,
        current: Option<GridPosition>,
        command: NavCommand,
    ) -> Option<GridPosition> {
        let groups = grid.group_count();
        if groups == 0 {
            return None;
        }
        let Some(current) = current else {
            return self.first_item(grid);
        };

        match command {
            NavCommand::Home => {
                grid.expand(0);
                return (grid.item_count(0) > 0).then_some(GridPosition::new(0, 0));
            }
            NavCommand::End => {
                let last = groups - 1;
                grid.expand(last);
                let count = grid.item_count(last);
                return (count > 0).then(|| GridPosition::new(last, count - 1));
            }
            _ => {}
        }

        if current.group >= groups || current.index >= grid.item_count(current.group) {
            gwarn!(
                group = current.group,
                index = current.index,
                "navigation from an item that no longer exists"
            );
            return None;
        }

        match self.step(command)? {
            Step::Back => back(grid, current),
            Step::Forward => forward(grid, current),
            Step::LinesBack(lines) => chain(grid, current, lines, line_back),
            Step::LinesForward(lines) => chain(grid, current, lines, line_forward),
        }
    }

    fn first_item<G: NavigationGrid + ?Sized>(&self, grid: &mut G) -> Option<GridPosition> {
        (0..grid.group_count())
            .find(|&g| grid.is_navigable(g) && grid.item_count(g) > 0)
            .map(|g| GridPosition::new(g, 0))
    }
}

/// Repeats a single-line move `lines` times, stopping early at the last reachable item.
fn chain<G: NavigationGrid + ?Sized>(
    grid: &mut G,
    from: GridPosition,
    lines: usize,
    step: fn(&mut G, GridPosition) -> Option<GridPosition>,
) -> Option<GridPosition> {
    let mut cur = step(grid, from)?;
    for _ in 1..lines {
        match step(grid, cur) {
            Some(next) if next != cur => cur = next,
            _ => break,
        }
    }
    Some(cur)
}

fn back<G: NavigationGrid + ?Sized>(grid: &mut G, pos: GridPosition) -> Option<GridPosition> {
    if pos.index > 0 {
        return Some(GridPosition::new(pos.group, pos.index - 1));
    }
    for g in (0..pos.group).rev() {
        if !grid.is_navigable(g) {
            continue;
        }
        let count = grid.item_count(g);
        if count > 0 {
            return Some(GridPosition::new(g, count - 1));
        }
    }
    None
}

fn forward<G: NavigationGrid + ?Sized>(grid: &mut G, pos: GridPosition) -> Option<GridPosition> {
    if pos.index + 1 < grid.item_count(pos.group) {
        return Some(GridPosition::new(pos.group, pos.index + 1));
    }
    for g in pos.group + 1..grid.group_count() {
        if grid.is_navigable(g) && grid.item_count(g) > 0 {
            return Some(GridPosition::new(g, 0));
        }
    }
    None
}

fn line_back<G: NavigationGrid + ?Sized>(grid: &mut G, pos: GridPosition) -> Option<GridPosition> {
    let per_line = grid.line_len(pos.group).max(1);
    if pos.index >= per_line {
        return Some(GridPosition::new(pos.group, pos.index - per_line));
    }
    let column = pos.index % per_line;
    for g in (0..pos.group).rev() {
        if !grid.is_navigable(g) {
            continue;
        }
        let count = grid.item_count(g);
        if count == 0 {
            continue;
        }
        // Same column in the last line, or the last item when that line is shorter.
        let per_line = grid.line_len(g).max(1);
        let last_line_start = (count - 1) / per_line * per_line;
        let index = (last_line_start + column).min(count - 1);
        return Some(GridPosition::new(g, index));
    }
    None
}

fn line_forward<G: NavigationGrid + ?Sized>(
    grid: &mut G,
    pos: GridPosition,
) -> Option<GridPosition> {
    let per_line = grid.line_len(pos.group).max(1);
    if pos.index + per_line < grid.item_count(pos.group) {
        return Some(GridPosition::new(pos.group, pos.index + per_line));
    }
    let column = pos.index % per_line;
    for g in pos.group + 1..grid.group_count() {
        if !grid.is_navigable(g) {
            continue;
        }
        let count = grid.item_count(g);
        if count > 0 {
            return Some(GridPosition::new(g, column.min(count - 1)));
        }
    }
    None
}
