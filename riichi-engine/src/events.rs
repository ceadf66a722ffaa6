//! Event fan-out envelope (§4.4, §9 "Dynamic field access"). Routing target
//! lives outside the tagged event variant so dispatch never needs to
//! inspect event payload fields.

use riichi_protocol::messages::ServerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Broadcast,
    Seat(u8),
}

#[derive(Debug, Clone)]
pub struct RoutedEvent {
    pub target: EventTarget,
    pub event: ServerEvent,
}

impl RoutedEvent {
    pub fn broadcast(event: ServerEvent) -> Self {
        Self {
            target: EventTarget::Broadcast,
            event,
        }
    }

    pub fn to_seat(seat: u8, event: ServerEvent) -> Self {
        Self {
            target: EventTarget::Seat(seat),
            event,
        }
    }
}
