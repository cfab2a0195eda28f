//! Tile batch geometry
//!
//! Converts the visible tile rectangles into per-pass vertex arrays.
//! A single draw call may carry at most [`MAX_PASS_VERTICES`] vertices,
//! so the tile list is split across as many passes as needed; each pass
//! keeps its own backing buffer, grown by doubling and retained across
//! frames so steady-state rendering allocates nothing.

use log::trace;
use serde::{Deserialize, Serialize};

/// Hard per-draw-call vertex ceiling. Index buffers commonly top out at
/// 65,536 vertices and some drivers misbehave right at the limit, so the
/// engine stays 4 short of it.
pub const MAX_PASS_VERTICES: usize = 65_532;
pub const VERTICES_PER_RECT: usize = 4;
pub const INDICES_PER_RECT: usize = 6;
/// Floats per vertex: position (2), texture coordinate (2), clamp frame
/// (4), animation offset (2), texture id (1).
pub const FLOATS_PER_VERTEX: usize = 11;

/// Texture atlas pages are 1024px square; the slot id packs a 2-bit page
/// offset below the sampler index.
const ATLAS_PAGE: f32 = 1024.0;
/// Half-pixel inset on the clamp frame so scaled sampling never bleeds
/// into a neighboring tile.
const FRAME_INSET: f32 = 0.5;

pub const fn max_rects_per_pass() -> usize {
    MAX_PASS_VERTICES / VERTICES_PER_RECT
}

/// One tile quad: where it samples from and where it lands on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileRect {
    pub source_x: f32,
    pub source_y: f32,
    pub dest_x: f32,
    pub dest_y: f32,
    pub width: f32,
    pub height: f32,
    /// Texture-space step applied per animation frame.
    pub anim_x: f32,
    pub anim_y: f32,
    /// Sampler index in the upper bits, 1024px atlas page in the low two.
    pub texture_slot: u32,
}

/// One draw call's worth of vertex data.
#[derive(Debug, Default)]
pub struct BatchPass {
    data: Vec<f32>,
    used: usize,
    rect_count: usize,
    modification_marker: usize,
    needs_upload: bool,
}

impl BatchPass {
    fn new() -> Self {
        Self::default()
    }

    pub fn rect_count(&self) -> usize {
        self.rect_count
    }

    pub fn vertex_count(&self) -> usize {
        self.rect_count * VERTICES_PER_RECT
    }

    pub fn index_count(&self) -> usize {
        self.rect_count * INDICES_PER_RECT
    }

    /// The filled vertex data, `FLOATS_PER_VERTEX` floats per vertex.
    pub fn vertex_data(&self) -> &[f32] {
        &self.data[..self.used]
    }

    /// Allocated floats, for buffer-reuse inspection.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// True once after the pass content changed; the host re-uploads the
    /// buffer and the flag clears.
    pub fn take_upload_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_upload)
    }

    fn fill(&mut self, rects: &[TileRect]) {
        let vertex_count = rects.len() * VERTICES_PER_RECT;
        self.rect_count = rects.len();
        // rectangle count unchanged means the window didn't move; skip the
        // rewrite and the upload entirely
        if self.modification_marker == vertex_count {
            return;
        }
        self.modification_marker = vertex_count;
        let required = vertex_count * FLOATS_PER_VERTEX;
        self.ensure_capacity(required);
        let mut offset = 0;
        for rect in rects {
            let x = rect.dest_x;
            let y = rect.dest_y;
            let w = rect.width;
            let h = rect.height;
            let u = rect.source_x + ATLAS_PAGE * (rect.texture_slot & 1) as f32;
            let v = rect.source_y + ATLAS_PAGE * ((rect.texture_slot >> 1) & 1) as f32;
            let texture_id = (rect.texture_slot >> 2) as f32;
            let frame = [
                u + FRAME_INSET,
                v + FRAME_INSET,
                u + w - FRAME_INSET,
                v + h - FRAME_INSET,
            ];
            let corners = [
                [x, y, u, v],
                [x + w, y, u + w, v],
                [x + w, y + h, u + w, v + h],
                [x, y + h, u, v + h],
            ];
            for corner in &corners {
                self.data[offset..offset + 4].copy_from_slice(corner);
                self.data[offset + 4..offset + 8].copy_from_slice(&frame);
                self.data[offset + 8] = rect.anim_x;
                self.data[offset + 9] = rect.anim_y;
                self.data[offset + 10] = texture_id;
                offset += FLOATS_PER_VERTEX;
            }
        }
        self.used = required;
        self.needs_upload = true;
    }

    fn ensure_capacity(&mut self, required: usize) {
        if self.data.len() < required {
            let mut capacity = FLOATS_PER_VERTEX;
            while capacity < required {
                capacity *= 2;
            }
            trace!(
                "batch pass buffer grows {} -> {} floats",
                self.data.len(),
                capacity
            );
            self.data.resize(capacity, 0.0);
        }
    }
}

/// Splits a tile list into passes and owns their buffers across frames.
#[derive(Debug, Default)]
pub struct TileBatcher {
    passes: Vec<BatchPass>,
    active: usize,
}

impl TileBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the pass list for this frame's tile rectangles. Order is
    /// preserved: concatenating the passes yields the input list.
    pub fn rebuild(&mut self, rects: &[TileRect]) {
        let max_rects = max_rects_per_pass();
        let needed = (rects.len() + max_rects - 1) / max_rects;
        while self.passes.len() < needed {
            self.passes.push(BatchPass::new());
        }
        // spare passes keep their buffers for when the count grows again
        self.active = needed;
        for (pass, chunk) in self.passes.iter_mut().zip(rects.chunks(max_rects)) {
            pass.fill(chunk);
        }
    }

    /// The passes to draw this frame, in order.
    pub fn passes(&self) -> &[BatchPass] {
        &self.passes[..self.active]
    }

    pub fn passes_mut(&mut self) -> &mut [BatchPass] {
        &mut self.passes[..self.active]
    }

    pub fn pass_count(&self) -> usize {
        self.active
    }

    /// Force the next rebuild to rewrite every pass, bypassing the
    /// modification markers. Needed after tile content changes that keep
    /// the rectangle count identical (e.g. an in-place repaint).
    pub fn invalidate(&mut self) {
        for pass in &mut self.passes {
            pass.modification_marker = usize::MAX;
        }
    }
}
