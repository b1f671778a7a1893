//! Click handling: region-bound handlers over data-space pointer events.
//!
//! The GUI layer converts raw canvas presses into [`ClickEvent`] values and
//! feeds them through here synchronously, one event at a time. Handlers are
//! bound to a single [`RegionId`] and silently ignore everything else, so
//! several independent clickable areas can share one canvas.

use std::collections::VecDeque;

use crate::prelude::{ActionError, ClickEvent, RegionId};
use crate::telemetry::LogManager;

/// Common capability of the click handlers: receive an event, react if it
/// belongs to the bound region.
pub trait ClickHandler {
    fn region(&self) -> RegionId;

    /// Reacts to the event; out-of-region events must be a no-op.
    fn handle(&mut self, event: &ClickEvent);
}

/// Invokes every registered handler on the event, in registration order.
pub fn dispatch(handlers: &mut [&mut dyn ClickHandler], event: &ClickEvent) {
    for handler in handlers {
        handler.handle(event);
    }
}

/// Bounded FIFO of clicked points. On overflow the oldest point is evicted
/// before the new one is appended.
pub struct PointAccumulator {
    region: RegionId,
    capacity: usize,
    points: VecDeque<(f64, f64)>,
    logger: LogManager,
}

impl PointAccumulator {
    pub fn new(region: RegionId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            region,
            capacity,
            points: VecDeque::with_capacity(capacity),
            logger: LogManager::new(),
        }
    }

    /// Appends the click if it belongs to the bound region. Returns whether
    /// the event was accepted.
    pub fn on_click(&mut self, event: &ClickEvent) -> bool {
        if event.region != self.region {
            return false;
        }

        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back((event.x, event.y));
        self.logger.trace(&format!(
            "point accumulator: x={:.3} y={:.3} points_count={}",
            event.x,
            event.y,
            self.points.len()
        ));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl ClickHandler for PointAccumulator {
    fn region(&self) -> RegionId {
        self.region
    }

    fn handle(&mut self, event: &ClickEvent) {
        self.on_click(event);
    }
}

/// Moves a single marker to each in-region click and runs a user-supplied
/// action. A failing action is caught and logged with the triggering
/// coordinates; it never propagates and never blocks later clicks.
pub struct SetPointHandler {
    region: RegionId,
    marker: Option<(f64, f64)>,
    logger: LogManager,
}

impl SetPointHandler {
    pub fn new(region: RegionId) -> Self {
        Self {
            region,
            marker: None,
            logger: LogManager::new(),
        }
    }

    /// Click without an action: the marker moves and the click is logged.
    pub fn on_click(&mut self, event: &ClickEvent) -> bool {
        if event.region != self.region {
            return false;
        }
        self.marker = Some((event.x, event.y));
        self.logger
            .trace(&format!("set-point: x={:.3} y={:.3}", event.x, event.y));
        true
    }

    /// Click with an action. The marker is updated before the action runs,
    /// so a failed action still leaves the marker at the clicked point.
    pub fn on_click_with<F>(&mut self, event: &ClickEvent, action: F) -> bool
    where
        F: FnOnce(f64, f64) -> Result<(), ActionError>,
    {
        if event.region != self.region {
            return false;
        }

        self.marker = Some((event.x, event.y));
        match action(event.x, event.y) {
            Ok(()) => {
                self.logger.trace(&format!(
                    "set-point: x={:.3} y={:.3} ACTION",
                    event.x, event.y
                ));
            }
            Err(err) => {
                self.logger.fail(&format!(
                    "set-point: x={:.3} y={:.3} ACTION failed",
                    event.x, event.y
                ));
                self.logger.fail(&format!("set-point: failure detail: {err:?}"));
            }
        }
        true
    }

    pub fn marker(&self) -> Option<(f64, f64)> {
        self.marker
    }

    /// Forgets the marker, e.g. after the plot layers are rebuilt.
    pub fn reset(&mut self) {
        self.marker = None;
    }
}

impl ClickHandler for SetPointHandler {
    fn region(&self) -> RegionId {
        self.region
    }

    fn handle(&mut self, event: &ClickEvent) {
        self.on_click(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANE: RegionId = RegionId(1);
    const OTHER: RegionId = RegionId(2);

    fn click(region: RegionId, x: f64, y: f64) -> ClickEvent {
        ClickEvent::new(region, x, y)
    }

    #[test]
    fn accumulator_keeps_only_last_capacity_points_in_order() {
        let mut accumulator = PointAccumulator::new(PLANE, 3);
        for i in 0..5 {
            assert!(accumulator.on_click(&click(PLANE, i as f64, -(i as f64))));
        }

        let points: Vec<(f64, f64)> = accumulator.iter().collect();
        assert_eq!(points, vec![(2.0, -2.0), (3.0, -3.0), (4.0, -4.0)]);
        assert_eq!(accumulator.len(), accumulator.capacity());
    }

    #[test]
    fn accumulator_ignores_other_regions() {
        let mut accumulator = PointAccumulator::new(PLANE, 4);
        assert!(!accumulator.on_click(&click(OTHER, 1.0, 1.0)));
        assert!(accumulator.is_empty());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut accumulator = PointAccumulator::new(PLANE, 0);
        assert_eq!(accumulator.capacity(), 1);
        accumulator.on_click(&click(PLANE, 1.0, 2.0));
        accumulator.on_click(&click(PLANE, 3.0, 4.0));
        assert_eq!(accumulator.iter().collect::<Vec<_>>(), vec![(3.0, 4.0)]);
    }

    #[test]
    fn marker_updates_even_when_action_fails() {
        let mut handler = SetPointHandler::new(PLANE);
        let mut ran = false;
        let accepted = handler.on_click_with(&click(PLANE, 2.5, 1.5), |_, _| {
            ran = true;
            Err(ActionError::new("synthetic failure"))
        });

        assert!(accepted);
        assert!(ran);
        assert_eq!(handler.marker(), Some((2.5, 1.5)));
    }

    #[test]
    fn action_receives_click_coordinates() {
        let mut handler = SetPointHandler::new(PLANE);
        let mut seen = None;
        handler.on_click_with(&click(PLANE, 0.25, 4.75), |x, y| {
            seen = Some((x, y));
            Ok(())
        });
        assert_eq!(seen, Some((0.25, 4.75)));
    }

    #[test]
    fn set_point_ignores_other_regions_without_state_change() {
        let mut handler = SetPointHandler::new(PLANE);
        let mut ran = false;
        let accepted = handler.on_click_with(&click(OTHER, 1.0, 1.0), |_, _| {
            ran = true;
            Ok(())
        });

        assert!(!accepted);
        assert!(!ran);
        assert_eq!(handler.marker(), None);
    }

    #[test]
    fn reset_clears_the_marker() {
        let mut handler = SetPointHandler::new(PLANE);
        handler.on_click(&click(PLANE, 1.0, 1.0));
        handler.reset();
        assert_eq!(handler.marker(), None);
    }

    #[test]
    fn dispatch_routes_one_event_to_matching_handlers_only() {
        let mut accumulator = PointAccumulator::new(PLANE, 4);
        let mut set_point = SetPointHandler::new(OTHER);

        {
            let mut handlers: [&mut dyn ClickHandler; 2] = [&mut accumulator, &mut set_point];
            dispatch(&mut handlers, &click(PLANE, 1.0, 2.0));
        }

        assert_eq!(accumulator.len(), 1);
        assert_eq!(set_point.marker(), None);
    }
}
