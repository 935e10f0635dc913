use std::collections::HashMap;

use crate::config::OrthoConfig;

use super::{NodeLayout, Port, Side};

const SLOTS_PER_SIDE: usize = 3;

/// Hands out port slots on rectangle sides for a single layout pass.
///
/// Each side has three slots (center, `-offset`, `+offset`). Once they are
/// taken, further ports reuse the slot positions pushed outward ring by ring
/// with alternating sign. The allocator is built fresh for every pass and
/// dropped with it, so assignments never leak into the next layout.
pub(super) struct PortAllocator<'a> {
    config: &'a OrthoConfig,
    used: HashMap<(String, Side), [bool; SLOTS_PER_SIDE]>,
    overflow: HashMap<(String, Side), usize>,
}

impl<'a> PortAllocator<'a> {
    pub(super) fn new(config: &'a OrthoConfig) -> Self {
        Self {
            config,
            used: HashMap::new(),
            overflow: HashMap::new(),
        }
    }

    pub(super) fn take(&mut self, node: &NodeLayout, side: Side) -> Port {
        let key = (node.id.clone(), side);
        let used = self.used.entry(key.clone()).or_default();
        let (slot, nudge) = match used.iter().position(|taken| !taken) {
            Some(slot) => {
                used[slot] = true;
                (slot, 0.0)
            }
            None => {
                let counter = self.overflow.entry(key).or_insert(0);
                let idx = *counter;
                *counter += 1;
                let ring = (idx / SLOTS_PER_SIDE + 1) as f32;
                let sign = if idx % 2 == 0 { 1.0 } else { -1.0 };
                (idx % SLOTS_PER_SIDE, sign * ring * self.config.overflow_nudge)
            }
        };
        Port {
            side,
            slot,
            nudge,
            point: self.port_point(node, side, slot, nudge),
        }
    }

    fn slot_offset(&self, slot: usize) -> f32 {
        match slot {
            1 => -self.config.slot_offset,
            2 => self.config.slot_offset,
            _ => 0.0,
        }
    }

    fn port_point(&self, node: &NodeLayout, side: Side, slot: usize, nudge: f32) -> (f32, f32) {
        let pad = self.config.port_padding;
        let usable_h = (node.rx * 2.0 - pad * 2.0).max(0.0);
        let usable_v = (node.ry * 2.0 - pad * 2.0).max(0.0);
        let clamp = self.config.slot_clamp;
        let t = (self.slot_offset(slot) + nudge).clamp(-clamp, clamp);
        match side {
            Side::Right => (node.x + node.rx, node.y + t * usable_v),
            Side::Left => (node.x - node.rx, node.y + t * usable_v),
            Side::Top => (node.x + t * usable_h, node.y - node.ry),
            Side::Bottom => (node.x + t * usable_h, node.y + node.ry),
        }
    }
}
