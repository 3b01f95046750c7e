use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardRole {
    Active,
    NeighborLeft,
    NeighborRight,
    Hidden,
}

impl CardRole {
    /// Role of `index` when `active` is in front of a stack of `len` cards.
    pub fn for_index(index: usize, active: usize, len: usize) -> Self {
        if len == 0 {
            return CardRole::Hidden;
        }
        match (index % len + len - active % len) % len {
            0 => CardRole::Active,
            1 => CardRole::NeighborLeft,
            2 => CardRole::NeighborRight,
            _ => CardRole::Hidden,
        }
    }

    pub fn is_neighbor(self) -> bool {
        matches!(self, CardRole::NeighborLeft | CardRole::NeighborRight)
    }

    /// Whether the card is drawn at all.
    pub fn is_rendered(self) -> bool {
        !matches!(self, CardRole::Hidden)
    }
}

/// Visual constants for the fanned stack, in logical pixels and degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackGeometry {
    pub neighbor_offset: f32,
    pub neighbor_rotation: f32,
    /// Offset used instead of `neighbor_offset` while the stack is hovered.
    pub hover_offset: f32,
    pub hover_rotation: f32,
    pub active_scale: f32,
    pub neighbor_scale: f32,
    pub hidden_scale: f32,
    pub neighbor_opacity: f32,
}

impl Default for StackGeometry {
    fn default() -> Self {
        Self {
            neighbor_offset: 48.0,
            neighbor_rotation: 6.0,
            hover_offset: 96.0,
            hover_rotation: 12.0,
            active_scale: 1.0,
            neighbor_scale: 0.9,
            hidden_scale: 0.8,
            neighbor_opacity: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPosition {
    pub index: usize,
    pub role: CardRole,
    pub horizontal_offset: f32,
    pub rotation_degrees: f32,
    pub scale: f32,
    /// Higher draws on top.
    pub stack_order: u8,
    pub opacity: f32,
}

/// Lay out every card of a stack of `len` items around `active`.
///
/// Output is indexed like the media list. Hover only widens the fan of the
/// neighbours; roles depend on `active` and `len` alone.
pub fn compute_positions(
    active: usize,
    len: usize,
    hovered: bool,
    geometry: &StackGeometry,
) -> Vec<CardPosition> {
    let (offset, rotation) = if hovered {
        (geometry.hover_offset, geometry.hover_rotation)
    } else {
        (geometry.neighbor_offset, geometry.neighbor_rotation)
    };

    (0..len)
        .map(|index| {
            let role = CardRole::for_index(index, active, len);
            let (horizontal_offset, rotation_degrees, scale, stack_order, opacity) = match role {
                CardRole::Active => (0.0, 0.0, geometry.active_scale, 30, 1.0),
                CardRole::NeighborLeft => {
                    (-offset, -rotation, geometry.neighbor_scale, 20, geometry.neighbor_opacity)
                }
                CardRole::NeighborRight => {
                    (offset, rotation, geometry.neighbor_scale, 10, geometry.neighbor_opacity)
                }
                CardRole::Hidden => (0.0, 0.0, geometry.hidden_scale, 0, 0.0),
            };

            CardPosition {
                index,
                role,
                horizontal_offset,
                rotation_degrees,
                scale,
                stack_order,
                opacity,
            }
        })
        .collect()
}

/// Indices of rendered cards, bottom of the stack first.
pub fn draw_order(positions: &[CardPosition]) -> Vec<usize> {
    let mut rendered: Vec<&CardPosition> = positions.iter().filter(|p| p.role.is_rendered()).collect();
    rendered.sort_by_key(|p| p.stack_order);
    rendered.into_iter().map(|p| p.index).collect()
}
