use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::common::config::Settings;
use crate::layout_engine::error::{LayoutError, LayoutResult};
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::graph::{Direction, SplitAxis};
use crate::layout_engine::schemes::SchemeChoice;
use crate::layout_engine::workspace::{CommandOutcome, Workspace};
use crate::model::window::WindowId;

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    Tile(Option<WindowId>),
    Split {
        axis: SplitAxis,
        #[serde(default)]
        window: Option<WindowId>,
    },
    Untile,
    Rotate,
    MoveFocus(Direction),
    Swap(Direction),
    StepSplit(i32),
    Resplit(f64),
    ChangeScheme(SchemeChoice),
    SwitchToWorkspace(usize),
    FocusDisplay(Direction),
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutEvent {
    WindowFocused(WindowId),
    WindowDestroyed(WindowId),
}

/// What the host should do to bring the screen in line with the tree.
#[must_use]
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub frames: Vec<(WindowId, Rect)>,
    pub focus: Option<WindowId>,
    pub hide: Vec<WindowId>,
    pub show: Vec<WindowId>,
    pub rejected: Option<LayoutError>,
}

#[derive(Serialize, Deserialize, Debug)]
struct DisplayState {
    rect: Rect,
    workspaces: Vec<Workspace>,
    active: usize,
}

impl DisplayState {
    fn active(&self) -> &Workspace { &self.workspaces[self.active] }

    fn active_mut(&mut self) -> &mut Workspace { &mut self.workspaces[self.active] }
}

/// Every display's workspaces plus which display has focus.
#[derive(Serialize, Deserialize, Debug)]
pub struct LayoutEngine {
    displays: Vec<DisplayState>,
    active_display: usize,
    settings: Settings,
}

static_assertions::assert_impl_all!(LayoutEngine: Send);

impl LayoutEngine {
    pub fn new(display_rects: &[Rect], settings: &Settings) -> Self {
        let displays = display_rects
            .iter()
            .map(|&rect| {
                let base = workspace_base(rect, settings);
                DisplayState {
                    rect,
                    workspaces: (0..settings.workspaces.count.max(1))
                        .map(|_| Workspace::new(base, &settings.tiling))
                        .collect(),
                    active: 0,
                }
            })
            .collect();
        Self {
            displays,
            active_display: 0,
            settings: settings.clone(),
        }
    }

    pub fn display_count(&self) -> usize { self.displays.len() }

    pub fn active_display(&self) -> usize { self.active_display }

    pub fn active_workspace_index(&self) -> Option<usize> {
        self.displays.get(self.active_display).map(|d| d.active)
    }

    pub fn active_workspace(&self) -> Option<&Workspace> {
        self.displays.get(self.active_display).map(DisplayState::active)
    }

    /// Nearest other display whose facing edge lies in `direction`.
    pub fn display_in_direction(&self, from: usize, direction: Direction) -> Option<usize> {
        let d = self.displays.get(from)?.rect;
        self.displays
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != from)
            .filter_map(|(i, other)| {
                let o = other.rect;
                let gap = match direction {
                    Direction::Up => d.y - o.bottom(),
                    Direction::Down => o.y - d.bottom(),
                    Direction::Left => d.x - o.right(),
                    Direction::Right => o.x - d.right(),
                };
                (gap >= 0).then_some((gap, i))
            })
            .min()
            .map(|(_, i)| i)
    }

    /// Moves a display and reflows all of its workspaces.
    pub fn set_display_rect(&mut self, index: usize, rect: Rect) -> EventResponse {
        let base = workspace_base(rect, &self.settings);
        let Some(state) = self.displays.get_mut(index) else {
            return EventResponse::default();
        };
        state.rect = rect;
        let mut response = EventResponse::default();
        for (i, ws) in state.workspaces.iter_mut().enumerate() {
            let outcome = ws.set_base_dims(base);
            if i == state.active {
                response.frames = frames_for(ws, &outcome, &self.settings);
            }
        }
        response
    }

    #[instrument(level = "debug", skip(self))]
    pub fn handle_command(&mut self, command: LayoutCommand) -> EventResponse {
        match command {
            LayoutCommand::SwitchToWorkspace(index) => return self.switch_to_workspace(index),
            LayoutCommand::FocusDisplay(direction) => return self.focus_display(direction),
            LayoutCommand::Tile(Some(window)) if self.contains_window(window) => {
                return rejected(LayoutError::AlreadyTiled(window));
            }
            LayoutCommand::Split { window: Some(window), .. } if self.contains_window(window) => {
                return rejected(LayoutError::AlreadyTiled(window));
            }
            _ => {}
        }

        let Self { displays, active_display, settings } = self;
        let split_ratio = settings.tiling.split_ratio;
        let Some(ws) = displays.get_mut(*active_display).map(DisplayState::active_mut) else {
            return EventResponse::default();
        };
        let result: LayoutResult<CommandOutcome> = match command {
            LayoutCommand::Tile(window) => ws.tile(window),
            LayoutCommand::Split { axis, window } => ws.split(axis, split_ratio, window),
            LayoutCommand::Untile => ws.untile(None),
            LayoutCommand::Rotate => ws.rotate(None),
            LayoutCommand::MoveFocus(direction) => ws.move_focus(direction),
            LayoutCommand::Swap(direction) => ws.swap(direction),
            LayoutCommand::StepSplit(delta) => ws
                .resizable_ancestor()
                .ok_or(LayoutError::NotSplit)
                .and_then(|node| ws.step_split(node, delta)),
            LayoutCommand::Resplit(ratio) => ws
                .resizable_ancestor()
                .ok_or(LayoutError::NotSplit)
                .and_then(|node| ws.resplit(node, ratio)),
            LayoutCommand::ChangeScheme(choice) => {
                let current = ws.current();
                let group = ws.tree().parent(current).unwrap_or(current);
                ws.change_scheme(group, choice)
            }
            LayoutCommand::SwitchToWorkspace(_) | LayoutCommand::FocusDisplay(_) => {
                return EventResponse::default();
            }
        };

        match result {
            Ok(outcome) => {
                let mut response = EventResponse::default();
                response.frames = frames_for(ws, &outcome, settings);
                response.focus = ws.tree().window(outcome.current);
                response
            }
            Err(e) => {
                debug!(error = %e, "command rejected");
                rejected(e)
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn handle_event(&mut self, event: LayoutEvent) -> EventResponse {
        match event {
            LayoutEvent::WindowFocused(window) => {
                for (d, state) in self.displays.iter_mut().enumerate() {
                    if state.active_mut().select_window(window).is_some() {
                        self.active_display = d;
                        break;
                    }
                }
                EventResponse::default()
            }
            LayoutEvent::WindowDestroyed(window) => {
                let settings = &self.settings;
                for (d, state) in self.displays.iter_mut().enumerate() {
                    let visible = state.active;
                    for (i, ws) in state.workspaces.iter_mut().enumerate() {
                        let Some(leaf) = ws.leaf_of_window(window) else {
                            continue;
                        };
                        return match ws.untile(Some(leaf)) {
                            Ok(outcome) if i == visible => {
                                let mut response = EventResponse::default();
                                response.frames = frames_for(ws, &outcome, settings);
                                if d == self.active_display {
                                    response.focus = ws.tree().window(outcome.current);
                                }
                                response
                            }
                            Ok(_) => EventResponse::default(),
                            // The last window in a workspace sits in the
                            // root; just empty it.
                            Err(LayoutError::NoParent) => {
                                ws.tree_mut().take_window(leaf);
                                EventResponse::default()
                            }
                            Err(e) => rejected(e),
                        };
                    }
                }
                EventResponse::default()
            }
        }
    }

    fn contains_window(&self, window: WindowId) -> bool {
        self.displays
            .iter()
            .flat_map(|d| &d.workspaces)
            .any(|ws| ws.leaf_of_window(window).is_some())
    }

    fn switch_to_workspace(&mut self, index: usize) -> EventResponse {
        let inner = self.settings.gaps.inner.clone();
        let Some(state) = self.displays.get_mut(self.active_display) else {
            return EventResponse::default();
        };
        if index >= state.workspaces.len() {
            warn!(index, count = state.workspaces.len(), "no such workspace");
            return EventResponse::default();
        }
        if index == state.active {
            return EventResponse::default();
        }
        let hide = state.active().windows().collect();
        state.active = index;
        let ws = state.active();
        debug!(index, "switched workspace");
        EventResponse {
            frames: ws.window_frames(&inner),
            focus: ws.tree().window(ws.current()),
            hide,
            show: ws.windows().collect(),
            rejected: None,
        }
    }

    fn focus_display(&mut self, direction: Direction) -> EventResponse {
        let Some(target) = self.display_in_direction(self.active_display, direction) else {
            return rejected(LayoutError::NoNeighbor);
        };
        self.active_display = target;
        let ws = self.displays[target].active();
        debug!(target, "focused display");
        EventResponse {
            focus: ws.tree().window(ws.current()),
            ..EventResponse::default()
        }
    }

    /// Every display's active workspace, rendered as a tree.
    pub fn draw_tree(&self) -> String {
        self.displays
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let marker = if i == self.active_display { " (active)" } else { "" };
                format!(
                    "display {i} {}{marker}, workspace {}\n{}",
                    d.rect,
                    d.active,
                    d.active().draw_tree()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn workspace_base(display: Rect, settings: &Settings) -> Rect {
    let outer = &settings.gaps.outer;
    display.inset(outer.left, outer.top, outer.right, outer.bottom)
}

fn frames_for(
    ws: &Workspace,
    outcome: &CommandOutcome,
    settings: &Settings,
) -> Vec<(WindowId, Rect)> {
    let gaps = &settings.gaps.inner;
    outcome
        .changed
        .iter()
        .filter_map(|leaf| {
            let window = leaf.window?;
            // A leaf may have been folded away later in the same command.
            ws.leaf_of_window(window)?;
            Some((
                window,
                leaf.dims.inset(gaps.horizontal, gaps.vertical, gaps.horizontal, gaps.vertical),
            ))
        })
        .collect()
}

fn rejected(error: LayoutError) -> EventResponse {
    EventResponse {
        rejected: Some(error),
        ..EventResponse::default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::workspace::LeafLayout;
    use crate::model::tree::NodeId;

    fn w(raw: u64) -> WindowId { WindowId::new(raw) }

    fn engine(displays: &[Rect]) -> LayoutEngine { LayoutEngine::new(displays, &Settings::default()) }

    #[test]
    fn workspaces_are_inset_by_outer_gaps() {
        let engine = engine(&[Rect::new(0, 0, 450, 275)]);
        let ws = engine.active_workspace().unwrap();
        assert_eq!(ws.base_dims(), Rect::new(25, 30, 400, 225));
        assert_eq!(engine.active_workspace_index(), Some(0));
    }

    #[test]
    fn tiling_reports_frames_and_focus() {
        let mut engine = engine(&[Rect::new(0, 0, 450, 275)]);
        let response = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        assert_eq!(response.frames, vec![(w(1), Rect::new(35, 40, 380, 205))]);
        assert_eq!(response.focus, Some(w(1)));

        let response = engine.handle_command(LayoutCommand::Tile(Some(w(2))));
        assert_eq!(response.frames, vec![
            (w(1), Rect::new(35, 40, 248, 205)),
            (w(2), Rect::new(303, 40, 112, 205)),
        ]);
        assert_eq!(response.focus, Some(w(2)));

        let response = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        assert_eq!(response.rejected, Some(LayoutError::AlreadyTiled(w(1))));
    }

    /// Everything a rejected command could disturb.
    fn snapshot(engine: &LayoutEngine) -> (Vec<LeafLayout>, NodeId, String, String) {
        let ws = engine.active_workspace().unwrap();
        (
            ws.leaf_layouts(),
            ws.current(),
            engine.draw_tree(),
            serde_json::to_string(engine).unwrap(),
        )
    }

    #[track_caller]
    fn assert_rejected(engine: &mut LayoutEngine, command: LayoutCommand, error: LayoutError) {
        let before = snapshot(engine);
        let response = engine.handle_command(command.clone());
        assert_eq!(response, rejected(error), "{command:?}");
        assert_eq!(snapshot(engine), before, "{command:?} changed the layout");
    }

    #[test]
    fn rejected_commands_leave_layout_alone() {
        let mut engine = engine(&[Rect::new(0, 0, 450, 275)]);
        assert_rejected(&mut engine, LayoutCommand::Untile, LayoutError::NoParent);
        assert_rejected(
            &mut engine,
            LayoutCommand::MoveFocus(Direction::Left),
            LayoutError::NoNeighbor,
        );
        assert_rejected(&mut engine, LayoutCommand::Swap(Direction::Up), LayoutError::NoNeighbor);
        assert_rejected(&mut engine, LayoutCommand::Resplit(0.5), LayoutError::NotSplit);
        assert_rejected(&mut engine, LayoutCommand::StepSplit(1), LayoutError::NotSplit);
        assert_rejected(&mut engine, LayoutCommand::Rotate, LayoutError::NoParent);

        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        assert_rejected(
            &mut engine,
            LayoutCommand::Tile(Some(w(1))),
            LayoutError::AlreadyTiled(w(1)),
        );
        assert_rejected(
            &mut engine,
            LayoutCommand::Split { axis: SplitAxis::Vertical, window: Some(w(1)) },
            LayoutError::AlreadyTiled(w(1)),
        );

        // A hand split leaves the cursor on the frozen leaf holding w1.
        let response =
            engine.handle_command(LayoutCommand::Split { axis: SplitAxis::Vertical, window: None });
        assert_eq!(response.rejected, None);
        assert_rejected(
            &mut engine,
            LayoutCommand::Tile(Some(w(2))),
            LayoutError::AlreadyOccupied,
        );
        assert_rejected(&mut engine, LayoutCommand::Resplit(1.5), LayoutError::InvalidRatio(1.5));
        assert_rejected(&mut engine, LayoutCommand::Resplit(0.0), LayoutError::InvalidRatio(0.0));

        let before = snapshot(&engine);
        let response = engine.handle_command(LayoutCommand::Resplit(f64::NAN));
        assert!(matches!(response.rejected, Some(LayoutError::InvalidRatio(r)) if r.is_nan()));
        assert!(response.frames.is_empty());
        assert_eq!(snapshot(&engine), before);

        let _ = engine.handle_command(LayoutCommand::SwitchToWorkspace(1));
        let response =
            engine.handle_command(LayoutCommand::Split { axis: SplitAxis::None, window: None });
        assert_eq!(response.rejected, None);
        assert_rejected(
            &mut engine,
            LayoutCommand::Split { axis: SplitAxis::Horizontal, window: None },
            LayoutError::Stacked,
        );
        assert_rejected(&mut engine, LayoutCommand::Rotate, LayoutError::Stacked);
        assert_rejected(&mut engine, LayoutCommand::Tile(None), LayoutError::Stacked);
    }

    #[test]
    fn switching_workspaces_hides_and_shows() {
        let mut engine = engine(&[Rect::new(0, 0, 450, 275)]);
        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        let response = engine.handle_command(LayoutCommand::SwitchToWorkspace(1));
        assert_eq!(response.hide, vec![w(1)]);
        assert!(response.show.is_empty());

        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(2))));
        let response = engine.handle_command(LayoutCommand::SwitchToWorkspace(0));
        assert_eq!(response.hide, vec![w(2)]);
        assert_eq!(response.show, vec![w(1)]);
        assert_eq!(response.focus, Some(w(1)));

        let response = engine.handle_command(LayoutCommand::SwitchToWorkspace(9));
        assert_eq!(response, EventResponse::default());
        assert_eq!(engine.active_workspace_index(), Some(0));
    }

    #[test]
    fn window_destroyed_untiles_anywhere() {
        let mut engine = engine(&[Rect::new(0, 0, 450, 275)]);
        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(2))));
        let response = engine.handle_event(LayoutEvent::WindowDestroyed(w(2)));
        assert_eq!(response.frames, vec![(w(1), Rect::new(35, 40, 380, 205))]);
        assert_eq!(response.focus, Some(w(1)));

        let _ = engine.handle_event(LayoutEvent::WindowDestroyed(w(1)));
        let ws = engine.active_workspace().unwrap();
        assert_eq!(ws.windows().count(), 0);
        let response = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        assert_eq!(response.rejected, None);
    }

    #[test]
    fn focus_event_moves_cursor() {
        let mut engine = engine(&[Rect::new(0, 0, 450, 275)]);
        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(2))));
        let _ = engine.handle_event(LayoutEvent::WindowFocused(w(1)));
        let ws = engine.active_workspace().unwrap();
        assert_eq!(ws.tree().window(ws.current()), Some(w(1)));
    }

    #[test]
    fn displays_are_found_by_facing_edge() {
        let mut engine = engine(&[
            Rect::new(0, 0, 1920, 1080),
            Rect::new(1920, 0, 1280, 1024),
            Rect::new(-1280, 0, 1280, 1024),
            Rect::new(0, 1080, 1920, 1080),
        ]);
        assert_eq!(engine.display_in_direction(0, Direction::Right), Some(1));
        assert_eq!(engine.display_in_direction(0, Direction::Left), Some(2));
        assert_eq!(engine.display_in_direction(0, Direction::Down), Some(3));
        assert_eq!(engine.display_in_direction(0, Direction::Up), None);

        let response = engine.handle_command(LayoutCommand::FocusDisplay(Direction::Right));
        assert_eq!(response.rejected, None);
        assert_eq!(engine.active_display(), 1);
        let response = engine.handle_command(LayoutCommand::FocusDisplay(Direction::Right));
        assert_eq!(response.rejected, Some(LayoutError::NoNeighbor));
    }

    #[test]
    fn resized_display_reflows_frames() {
        let mut engine = engine(&[Rect::new(0, 0, 450, 275)]);
        let _ = engine.handle_command(LayoutCommand::Tile(Some(w(1))));
        let response = engine.set_display_rect(0, Rect::new(0, 0, 850, 500));
        assert_eq!(response.frames, vec![(w(1), Rect::new(35, 40, 780, 430))]);
    }

    #[test]
    fn commands_parse_from_json() {
        let cmd: LayoutCommand = serde_json::from_str(r#"{"move_focus":"left"}"#).unwrap();
        assert_eq!(cmd, LayoutCommand::MoveFocus(Direction::Left));
        let cmd: LayoutCommand = serde_json::from_str(r#"{"split":{"axis":"none"}}"#).unwrap();
        assert_eq!(cmd, LayoutCommand::Split { axis: SplitAxis::None, window: None });
        let cmd: LayoutCommand = serde_json::from_str(r#""untile""#).unwrap();
        assert_eq!(cmd, LayoutCommand::Untile);
    }
}
