//! Drag session controller: turns raw pointer events into a single
//! "move application X to column Y" request.
//!
//! States: `Idle -> Pressed -> Dragging -> (dropped | cancelled) -> Idle`.
//! A press only becomes a drag once the pointer has travelled
//! `ACTIVATION_DISTANCE` from where it went down; releasing earlier is a click.
//! Every drag session ends in exactly one terminal outcome.

use uuid::Uuid;

use crate::models::application::ApplicationStatus;

/// Minimum pointer travel, in CSS pixels, before a press is treated as a drag.
pub const ACTIVATION_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Platform-neutral pointer input.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed on a card.
    Down { card: Uuid, at: Point },
    Move { at: Point },
    /// Pointer released; `over` is the id of the drop region under it, if any.
    Up { at: Point, over: Option<String> },
    /// Interaction aborted (focus loss, escape, pointercancel).
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Pressed { card: Uuid, origin: Point },
    Dragging { card: Uuid, pointer: Point },
}

/// Result of feeding an event that ends an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Released over a valid column.
    Dropped {
        application_id: Uuid,
        status: ApplicationStatus,
    },
    /// Released outside any column, over something that is not a column, or aborted.
    Cancelled { application_id: Uuid },
    /// Released before the activation distance: open the card instead.
    Clicked { application_id: Uuid },
}

/// What the renderer needs while a card is in flight: a placeholder in the
/// origin column and a ghost at the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOverlay {
    pub card: Uuid,
    pub pointer: Point,
}

#[derive(Debug)]
pub struct DragController {
    state: DragState,
    activation_distance: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self::with_activation_distance(ACTIVATION_DISTANCE)
    }

    pub fn with_activation_distance(activation_distance: f64) -> Self {
        Self {
            state: DragState::Idle,
            activation_distance,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// The card currently being dragged (past the activation distance).
    pub fn active_card(&self) -> Option<Uuid> {
        match self.state {
            DragState::Dragging { card, .. } => Some(card),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<DragOverlay> {
        match self.state {
            DragState::Dragging { card, pointer } => Some(DragOverlay { card, pointer }),
            _ => None,
        }
    }

    /// Feeds one pointer event. Returns an outcome only when an interaction ends.
    pub fn handle(&mut self, event: PointerEvent) -> Option<DragOutcome> {
        match (self.state, event) {
            (DragState::Idle, PointerEvent::Down { card, at }) => {
                self.state = DragState::Pressed { card, origin: at };
                None
            }
            // One interaction at a time: a second press is ignored until this one resolves.
            (_, PointerEvent::Down { card, .. }) => {
                tracing::debug!("Ignoring press on {card}: another card is in hand");
                None
            }
            (DragState::Pressed { card, origin }, PointerEvent::Move { at }) => {
                if origin.distance_to(at) >= self.activation_distance {
                    tracing::debug!("Drag started for {card}");
                    self.state = DragState::Dragging { card, pointer: at };
                }
                None
            }
            (DragState::Pressed { card, .. }, PointerEvent::Up { .. }) => {
                self.state = DragState::Idle;
                Some(DragOutcome::Clicked {
                    application_id: card,
                })
            }
            (DragState::Pressed { .. }, PointerEvent::Cancel) => {
                self.state = DragState::Idle;
                None
            }
            (DragState::Dragging { card, .. }, PointerEvent::Move { at }) => {
                self.state = DragState::Dragging { card, pointer: at };
                None
            }
            (DragState::Dragging { card, .. }, PointerEvent::Up { over, .. }) => {
                self.state = DragState::Idle;
                Some(resolve_drop(card, over.as_deref()))
            }
            (DragState::Dragging { card, .. }, PointerEvent::Cancel) => {
                self.state = DragState::Idle;
                Some(DragOutcome::Cancelled {
                    application_id: card,
                })
            }
            (DragState::Idle, _) => None,
        }
    }
}

/// Only a column identifier is a valid drop target.
fn resolve_drop(card: Uuid, over: Option<&str>) -> DragOutcome {
    match over.map(str::parse::<ApplicationStatus>) {
        Some(Ok(status)) => DragOutcome::Dropped {
            application_id: card,
            status,
        },
        _ => DragOutcome::Cancelled {
            application_id: card,
        },
    }
}
