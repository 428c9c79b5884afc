//! The draggable "AI" button on the home screen.
//!
//! A press that is released without moving the button activates it; a press
//! followed by movement drags it around inside its bounds.

use ratatui::layout::Rect;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherEvent {
    Activated,
}

/// Inclusive limits for the button's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: u16,
    pub max_x: u16,
    pub min_y: u16,
    pub max_y: u16,
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Starting column; centred when `None`.
    pub x: Option<u16>,
    /// Starting row; centred when `None`.
    pub y: Option<u16>,
    pub render_text: String,
    pub render_color: Color,
    /// Width in cells. Height is half of it, terminal cells being tall.
    pub render_size: u16,
    pub is_circle: bool,
    /// Extra limits on top of the drawing area.
    pub bounds: Option<Bounds>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            render_text: "AI".to_string(),
            render_color: Color::Rgb(0xC2, 0xF2, 0xE4),
            render_size: 8,
            is_circle: true,
            bounds: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    grab_dx: u16,
    grab_dy: u16,
    moved: bool,
}

pub struct Launcher {
    pub config: LauncherConfig,
    pub x: u16,
    pub y: u16,
    area: Option<Rect>,
    gesture: Option<Gesture>,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Self {
            x: config.x.unwrap_or(0),
            y: config.y.unwrap_or(0),
            config,
            area: None,
            gesture: None,
        }
    }

    pub fn width(&self) -> u16 {
        self.config.render_size.max(4)
    }

    pub fn height(&self) -> u16 {
        (self.config.render_size / 2).max(3)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width(), self.height())
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.map(|g| g.moved).unwrap_or(false)
    }

    /// Fit the button into `area`. The first call also applies the
    /// configured (or centred) starting position.
    pub fn clamp_to(&mut self, area: Rect) {
        if self.area.is_none() {
            let (w, h) = (self.width(), self.height());
            self.x = self
                .config
                .x
                .unwrap_or_else(|| area.x + area.width.saturating_sub(w) / 2);
            self.y = self
                .config
                .y
                .unwrap_or_else(|| area.y + area.height.saturating_sub(h) / 2);
        }
        self.area = Some(area);
        self.move_to(self.x as i32, self.y as i32);
    }

    fn bounds(&self) -> Bounds {
        let area = self.area.unwrap_or_else(|| Rect::new(0, 0, u16::MAX, u16::MAX));
        let mut bounds = Bounds {
            min_x: area.x,
            max_x: area.right().saturating_sub(self.width()).max(area.x),
            min_y: area.y,
            max_y: area.bottom().saturating_sub(self.height()).max(area.y),
        };
        if let Some(limit) = self.config.bounds {
            bounds.min_x = bounds.min_x.max(limit.min_x);
            bounds.max_x = bounds.max_x.min(limit.max_x).max(bounds.min_x);
            bounds.min_y = bounds.min_y.max(limit.min_y);
            bounds.max_y = bounds.max_y.min(limit.max_y).max(bounds.min_y);
        }
        bounds
    }

    fn move_to(&mut self, x: i32, y: i32) {
        let b = self.bounds();
        self.x = x.clamp(b.min_x as i32, b.max_x as i32) as u16;
        self.y = y.clamp(b.min_y as i32, b.max_y as i32) as u16;
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        let r = self.rect();
        col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
    }

    /// Start a gesture if the point is on the button.
    pub fn press(&mut self, col: u16, row: u16) -> bool {
        if !self.contains(col, row) {
            return false;
        }
        self.gesture = Some(Gesture {
            grab_dx: col - self.x,
            grab_dy: row - self.y,
            moved: false,
        });
        true
    }

    pub fn drag_to(&mut self, col: u16, row: u16) {
        let Some(mut gesture) = self.gesture else {
            return;
        };
        let (old_x, old_y) = (self.x, self.y);
        self.move_to(
            col as i32 - gesture.grab_dx as i32,
            row as i32 - gesture.grab_dy as i32,
        );
        if (self.x, self.y) != (old_x, old_y) {
            gesture.moved = true;
        }
        self.gesture = Some(gesture);
    }

    /// End the gesture; a release without movement is a short press.
    pub fn release(&mut self) -> Option<LauncherEvent> {
        match self.gesture.take() {
            Some(gesture) if !gesture.moved => Some(LauncherEvent::Activated),
            _ => None,
        }
    }

    /// Keyboard movement.
    pub fn nudge(&mut self, dx: i32, dy: i32) {
        self.move_to(self.x as i32 + dx, self.y as i32 + dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher_in(area: Rect) -> Launcher {
        let mut launcher = Launcher::new(LauncherConfig::default());
        launcher.clamp_to(area);
        launcher
    }

    #[test]
    fn test_starts_centred() {
        let launcher = launcher_in(Rect::new(0, 0, 80, 24));
        assert_eq!((launcher.x, launcher.y), (36, 10));
    }

    #[test]
    fn test_short_press_activates() {
        let mut launcher = launcher_in(Rect::new(0, 0, 80, 24));
        assert!(launcher.press(37, 11));
        assert_eq!(launcher.release(), Some(LauncherEvent::Activated));
    }

    #[test]
    fn test_press_outside_does_nothing() {
        let mut launcher = launcher_in(Rect::new(0, 0, 80, 24));
        assert!(!launcher.press(0, 0));
        assert_eq!(launcher.release(), None);
    }

    #[test]
    fn test_drag_moves_without_activating() {
        let mut launcher = launcher_in(Rect::new(0, 0, 80, 24));
        launcher.press(37, 11);
        launcher.drag_to(12, 4);
        assert_eq!((launcher.x, launcher.y), (11, 3));
        assert!(launcher.is_dragging());
        assert_eq!(launcher.release(), None);
    }

    #[test]
    fn test_drag_is_clamped_to_area() {
        let mut launcher = launcher_in(Rect::new(0, 1, 80, 22));
        launcher.press(37, 11);
        launcher.drag_to(200, 200);
        assert_eq!((launcher.x, launcher.y), (72, 19));
        launcher.drag_to(0, 0);
        assert_eq!((launcher.x, launcher.y), (0, 1));
    }

    #[test]
    fn test_configured_bounds_narrow_the_area() {
        let config = LauncherConfig {
            bounds: Some(Bounds { min_x: 10, max_x: 20, min_y: 2, max_y: 5 }),
            ..LauncherConfig::default()
        };
        let mut launcher = Launcher::new(config);
        launcher.clamp_to(Rect::new(0, 0, 80, 24));
        assert_eq!((launcher.x, launcher.y), (20, 5));

        launcher.nudge(-100, -100);
        assert_eq!((launcher.x, launcher.y), (10, 2));
    }

    #[test]
    fn test_resize_keeps_position_inside() {
        let mut launcher = launcher_in(Rect::new(0, 0, 80, 24));
        launcher.nudge(40, 0);
        launcher.clamp_to(Rect::new(0, 0, 40, 24));
        assert_eq!(launcher.x, 32);
    }
}
