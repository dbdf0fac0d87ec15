//! Gesture composition for mobile sessions.
//!
//! A gesture is a [`TouchSequence`]: one descriptor holding N independent
//! contact-point timelines, executed atomically by the backend as a single
//! W3C pointer-actions payload. Builders here are pure geometry — they
//! produce descriptors without touching a device, which keeps swipe math,
//! circle interpolation and rotation arcs unit-testable.
//!
//! Execution is blocking: the remote end replays the whole sequence before
//! responding, so sequential gestures on one handle never overlap, and a
//! started gesture always runs to completion.

use crate::backend::Backend;
use crate::locator::{Locator, Point, Rect};
use crate::page::Page;
use crate::result::PilotResult;
use crate::wait::WaitPolicy;
use serde_json::{json, Value};

/// Settle pause inserted after the initial press of a pattern, in ms
const PATTERN_PRESS_SETTLE_MS: u64 = 100;

/// Angular steps used to interpolate a full circle
const CIRCLE_STEPS: usize = 36;

/// Contact-point offset from center for pinch/zoom, in pixels
const PINCH_SPREAD_PX: i64 = 50;

/// Base amplitude of a shake, in pixels
const SHAKE_AMPLITUDE_PX: f64 = 30.0;

/// One step in a contact-point timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TouchStep {
    /// Touch down at a point
    Press(Point),
    /// Hold position for a duration in milliseconds
    Pause(u64),
    /// Move to a point over a duration in milliseconds
    MoveTo {
        /// Destination
        point: Point,
        /// Travel time in milliseconds
        duration_ms: u64,
    },
    /// Lift the contact
    Release,
}

/// Timeline of one simulated finger
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContactPoint {
    steps: Vec<TouchStep>,
}

impl ContactPoint {
    /// Start a timeline with a press
    #[must_use]
    pub fn press(point: Point) -> Self {
        Self {
            steps: vec![TouchStep::Press(point)],
        }
    }

    /// Hold position
    #[must_use]
    pub fn pause(mut self, ms: u64) -> Self {
        self.steps.push(TouchStep::Pause(ms));
        self
    }

    /// Move to a point instantly
    #[must_use]
    pub fn move_to(self, point: Point) -> Self {
        self.move_over(point, 0)
    }

    /// Move to a point over a duration
    #[must_use]
    pub fn move_over(mut self, point: Point, duration_ms: u64) -> Self {
        self.steps.push(TouchStep::MoveTo {
            point,
            duration_ms,
        });
        self
    }

    /// Lift the contact, completing the timeline
    #[must_use]
    pub fn release(mut self) -> Self {
        self.steps.push(TouchStep::Release);
        self
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[TouchStep] {
        &self.steps
    }
}

/// Multi-contact gesture descriptor, executed atomically
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TouchSequence {
    contacts: Vec<ContactPoint>,
}

impl TouchSequence {
    /// Single-contact sequence
    #[must_use]
    pub fn single(contact: ContactPoint) -> Self {
        Self {
            contacts: vec![contact],
        }
    }

    /// Multi-contact sequence
    #[must_use]
    pub fn multi(contacts: Vec<ContactPoint>) -> Self {
        Self { contacts }
    }

    /// True when the sequence carries no contacts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contact timelines
    #[must_use]
    pub fn contacts(&self) -> &[ContactPoint] {
        &self.contacts
    }

    /// W3C pointer-actions payload for the wire backends
    #[must_use]
    pub fn to_w3c(&self) -> Value {
        let actions: Vec<Value> = self
            .contacts
            .iter()
            .enumerate()
            .map(|(index, contact)| {
                let steps: Vec<Value> = contact.steps.iter().map(step_to_w3c).collect();
                json!({
                    "type": "pointer",
                    "id": format!("finger-{index}"),
                    "parameters": { "pointerType": "touch" },
                    "actions": steps,
                })
            })
            .collect();
        json!({ "actions": actions })
    }
}

fn step_to_w3c(step: &TouchStep) -> Value {
    match step {
        TouchStep::Press(p) => json!({
            // pointerDown carries no coordinates; the jump precedes it
            "type": "pointerMove", "duration": 0, "x": p.x, "y": p.y,
        }),
        TouchStep::Pause(ms) => json!({ "type": "pause", "duration": ms }),
        TouchStep::MoveTo { point, duration_ms } => json!({
            "type": "pointerMove", "duration": duration_ms, "x": point.x, "y": point.y,
        }),
        TouchStep::Release => json!({ "type": "pointerUp", "button": 0 }),
    }
}

/// Swipe direction relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Toward the top of the screen
    Up,
    /// Toward the bottom of the screen
    Down,
    /// Toward the left edge
    Left,
    /// Toward the right edge
    Right,
}

// ---------------------------------------------------------------------------
// Pure geometry builders
// ---------------------------------------------------------------------------

/// Press at `from`, hold for `duration_ms`, slide to `to`, release.
/// One continuous contact point.
#[must_use]
pub fn swipe_sequence(from: Point, to: Point, duration_ms: u64) -> TouchSequence {
    TouchSequence::single(
        ContactPoint::press(from)
            .pause(duration_ms)
            .move_to(to)
            .release(),
    )
}

/// Press-and-hold at a point
#[must_use]
pub fn long_press_sequence(point: Point, duration_ms: u64) -> TouchSequence {
    TouchSequence::single(ContactPoint::press(point).pause(duration_ms).release())
}

/// Swipe endpoints across an element: start at its center, end offset by
/// `percent` of the relevant dimension in `direction`.
#[must_use]
pub fn element_swipe_endpoints(rect: Rect, direction: SwipeDirection, percent: f64) -> (Point, Point) {
    let start = rect.center();
    let dx = (rect.width as f64 * percent) as i64;
    let dy = (rect.height as f64 * percent) as i64;
    let end = match direction {
        SwipeDirection::Up => Point::new(start.x, start.y - dy),
        SwipeDirection::Down => Point::new(start.x, start.y + dy),
        SwipeDirection::Left => Point::new(start.x - dx, start.y),
        SwipeDirection::Right => Point::new(start.x + dx, start.y),
    };
    (start, end)
}

/// Full-screen scroll endpoints: vertical travel between 20% and 80% of the
/// screen height along the center column.
#[must_use]
pub fn screen_scroll_endpoints(width: i64, height: i64, direction: SwipeDirection) -> (Point, Point) {
    let x = width / 2;
    let near = (height as f64 * 0.2) as i64;
    let far = (height as f64 * 0.8) as i64;
    match direction {
        SwipeDirection::Up => (Point::new(x, far), Point::new(x, near)),
        _ => (Point::new(x, near), Point::new(x, far)),
    }
}

/// Two contacts converging on (pinch, `scale` < 1) or diverging from
/// (zoom, `scale` > 1) the center, symmetric about it.
#[must_use]
pub fn pinch_sequence(center: Point, scale: f64, duration_ms: u64) -> TouchSequence {
    let offset = PINCH_SPREAD_PX;
    let scaled = (offset as f64 * scale) as i64;
    let finger = |sign: i64| {
        ContactPoint::press(Point::new(center.x + sign * offset, center.y + sign * offset))
            .move_over(
                Point::new(center.x + sign * scaled, center.y + sign * scaled),
                duration_ms,
            )
            .release()
    };
    TouchSequence::multi(vec![finger(1), finger(-1)])
}

/// Two opposed contacts arcing `degrees` around the center at `radius`
#[must_use]
pub fn rotate_sequence(center: Point, radius: i64, degrees: f64, duration_ms: u64) -> TouchSequence {
    let angle = degrees.to_radians();
    let (sin, cos) = angle.sin_cos();
    let arc_x = (radius as f64 * cos).round() as i64;
    let arc_y = (radius as f64 * sin).round() as i64;
    let finger = |sign: i64| {
        ContactPoint::press(Point::new(center.x + sign * radius, center.y))
            .pause(duration_ms)
            .move_to(Point::new(center.x + sign * arc_x, center.y + sign * arc_y))
            .release()
    };
    TouchSequence::multi(vec![finger(1), finger(-1)])
}

/// Connect `points` with a single contact. Returns `None` below two points
/// — there is nothing to draw and nothing to fail.
#[must_use]
pub fn pattern_sequence(points: &[Point], duration_ms: u64) -> Option<TouchSequence> {
    if points.len() < 2 {
        return None;
    }
    let segment_ms = duration_ms / (points.len() as u64 - 1);
    let mut contact = ContactPoint::press(points[0]).pause(PATTERN_PRESS_SETTLE_MS);
    for point in &points[1..] {
        contact = contact.move_to(*point).pause(segment_ms);
    }
    Some(TouchSequence::single(contact.release()))
}

/// Interpolate a full circle: 36 equal angular steps, 37 points with the
/// seam point repeated.
#[must_use]
pub fn circle_points(center: Point, radius: i64) -> Vec<Point> {
    (0..=CIRCLE_STEPS)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / CIRCLE_STEPS as f64;
            Point::new(
                center.x + (radius as f64 * angle.cos()).round() as i64,
                center.y + (radius as f64 * angle.sin()).round() as i64,
            )
        })
        .collect()
}

/// Oscillate horizontally around the center: out, back, out, back, home
#[must_use]
pub fn shake_sequence(center: Point, intensity: f64) -> TouchSequence {
    let offset = (SHAKE_AMPLITUDE_PX * intensity) as i64;
    let right = Point::new(center.x + offset, center.y);
    let left = Point::new(center.x - offset, center.y);
    TouchSequence::single(
        ContactPoint::press(center)
            .pause(100)
            .move_to(right)
            .pause(50)
            .move_to(left)
            .pause(50)
            .move_to(right)
            .pause(50)
            .move_to(left)
            .pause(50)
            .move_to(center)
            .release(),
    )
}

// ---------------------------------------------------------------------------
// Mobile page object base
// ---------------------------------------------------------------------------

/// Default swipe duration in milliseconds
pub const DEFAULT_SWIPE_MS: u64 = 500;

/// Immediate probe policy used between scroll iterations
const SCROLL_PROBE: WaitPolicy = WaitPolicy::new(0, 50);

/// Page-object base for mobile sessions: the interaction surface of
/// [`Page`] plus gesture composition.
#[derive(Debug)]
pub struct MobilePage<B: Backend> {
    page: Page<B>,
}

impl<B: Backend> MobilePage<B> {
    /// Wrap a backend handle
    pub fn new(handle: B, wait: WaitPolicy) -> Self {
        Self {
            page: Page::new(handle, wait),
        }
    }

    /// The underlying interaction layer
    pub fn page(&mut self) -> &mut Page<B> {
        &mut self.page
    }

    /// Consume the page, returning the handle
    pub fn into_handle(self) -> B {
        self.page.into_handle()
    }

    /// Execute a prepared sequence on the device
    pub fn perform(&mut self, sequence: &TouchSequence) -> PilotResult<()> {
        self.page.handle().perform_touch(sequence)
    }

    /// Swipe between two screen points
    pub fn swipe(&mut self, from: Point, to: Point, duration_ms: u64) -> PilotResult<()> {
        self.perform(&swipe_sequence(from, to, duration_ms))
    }

    /// Swipe across an element by `percent` of its size in `direction`
    pub fn swipe_element(
        &mut self,
        locator: &Locator,
        direction: SwipeDirection,
        percent: f64,
    ) -> PilotResult<()> {
        let rect = self.page.element_rect(locator)?;
        let (from, to) = element_swipe_endpoints(rect, direction, percent);
        self.swipe(from, to, DEFAULT_SWIPE_MS)
    }

    /// Scroll until an element whose text contains `text` is present.
    ///
    /// Bounded: at most `max_swipes` iterations, one full-screen swipe
    /// between probes. Returns whether the text was found — exhaustion is
    /// an answer, not an error.
    pub fn scroll_to_text(
        &mut self,
        text: &str,
        direction: SwipeDirection,
        max_swipes: usize,
    ) -> PilotResult<bool> {
        let target = Locator::text_contains(text);
        for _ in 0..max_swipes {
            if self.page.handle().is_visible(&target, &SCROLL_PROBE) {
                return Ok(true);
            }
            let (width, height) = self.page.window_size()?;
            let (from, to) = screen_scroll_endpoints(width, height, direction);
            self.swipe(from, to, DEFAULT_SWIPE_MS)?;
        }
        Ok(false)
    }

    /// Pinch an element (zoom out), `scale` in (0, 1)
    pub fn pinch(&mut self, locator: &Locator, scale: f64, duration_ms: u64) -> PilotResult<()> {
        let center = self.page.element_rect(locator)?.center();
        self.perform(&pinch_sequence(center, scale, duration_ms))
    }

    /// Zoom an element (zoom in), `scale` > 1
    pub fn zoom(&mut self, locator: &Locator, scale: f64, duration_ms: u64) -> PilotResult<()> {
        let center = self.page.element_rect(locator)?.center();
        self.perform(&pinch_sequence(center, scale, duration_ms))
    }

    /// Rotate an element with a two-finger arc of `degrees`
    pub fn rotate_element(
        &mut self,
        locator: &Locator,
        degrees: f64,
        duration_ms: u64,
    ) -> PilotResult<()> {
        let rect = self.page.element_rect(locator)?;
        let radius = rect.width.min(rect.height) / 4;
        self.perform(&rotate_sequence(rect.center(), radius, degrees, duration_ms))
    }

    /// Draw a pattern through `points`. Fewer than two points is a no-op.
    pub fn draw_pattern(&mut self, points: &[Point], duration_ms: u64) -> PilotResult<()> {
        match pattern_sequence(points, duration_ms) {
            Some(sequence) => self.perform(&sequence),
            None => Ok(()),
        }
    }

    /// Draw a full circle centered at (`cx`, `cy`)
    pub fn draw_circle(
        &mut self,
        cx: i64,
        cy: i64,
        radius: i64,
        duration_ms: u64,
    ) -> PilotResult<()> {
        let points = circle_points(Point::new(cx, cy), radius);
        self.draw_pattern(&points, duration_ms)
    }

    /// Press and hold an element
    pub fn long_press(&mut self, locator: &Locator, duration_ms: u64) -> PilotResult<()> {
        let center = self.page.element_rect(locator)?.center();
        self.perform(&long_press_sequence(center, duration_ms))
    }

    /// Pull-to-refresh: a slow downward drag from the upper screen band
    pub fn pull_to_refresh(&mut self) -> PilotResult<()> {
        let (width, height) = self.page.window_size()?;
        let (from, to) = screen_scroll_endpoints(width, height, SwipeDirection::Down);
        self.swipe(from, to, 1000)
    }

    /// Shake an element horizontally
    pub fn shake_element(&mut self, locator: &Locator, intensity: f64) -> PilotResult<()> {
        let center = self.page.element_rect(locator)?.center();
        self.perform(&shake_sequence(center, intensity))
    }
}
