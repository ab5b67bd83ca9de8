/// One-shot shape drawing on top of the tessellator and a dispatcher
///
/// Each helper allocates a transient buffer sized for its shape, calculates
/// into it under a write lock, colors the range, unlocks, and draws it.
use nalgebra::Point2;

use crate::buffer::{AccessMode, VertexBuffer};
use crate::config::PrimConfig;
use crate::dispatch::{draw_indexed_prim, draw_prim, Dispatcher, DrawContext, TextureHandle};
use crate::error::Result;
use crate::geometry::{Color, PrimitiveType};
use crate::tessellate::{self, outline_vertex_count, EllipticArc, Emitted};
use crate::transform::Transform;

pub struct Primitives<D: Dispatcher> {
    dispatcher: D,
    ctx: DrawContext,
}

impl<D: Dispatcher> Primitives<D> {
    pub fn new(dispatcher: D, config: PrimConfig) -> Self {
        Self {
            dispatcher,
            ctx: DrawContext::new(config),
        }
    }

    pub fn context(&self) -> &DrawContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut DrawContext {
        &mut self.ctx
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn into_dispatcher(self) -> D {
        self.dispatcher
    }

    pub fn use_transform(&mut self, transform: &Transform) {
        self.ctx.use_transform(transform);
    }

    pub fn draw_prim(
        &mut self,
        buffer: &VertexBuffer,
        texture: Option<TextureHandle>,
        start: usize,
        end: usize,
        primitive: PrimitiveType,
    ) -> Result<usize> {
        draw_prim(&mut self.dispatcher, &self.ctx, buffer, texture, start, end, primitive)
    }

    pub fn draw_indexed_prim(
        &mut self,
        buffer: &VertexBuffer,
        texture: Option<TextureHandle>,
        indices: &[usize],
        vertex_count: usize,
        primitive: PrimitiveType,
    ) -> Result<usize> {
        draw_indexed_prim(
            &mut self.dispatcher,
            &self.ctx,
            buffer,
            texture,
            indices,
            vertex_count,
            primitive,
        )
    }

    pub fn draw_line_ex(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        thickness: f32,
    ) -> Result<usize> {
        self.draw_transient(outline_vertex_count(2, thickness), color, |buffer| {
            tessellate::calculate_line(
                buffer,
                Point2::new(x1, y1),
                Point2::new(x2, y2),
                thickness,
                0,
            )
        })
    }

    pub fn draw_triangle(
        &mut self,
        corners: [Point2<f32>; 3],
        color: Color,
        thickness: f32,
    ) -> Result<usize> {
        self.draw_transient(outline_vertex_count(4, thickness), color, |buffer| {
            tessellate::calculate_polygon_outline(buffer, &corners, thickness, 0)
        })
    }

    pub fn draw_rectangle_ex(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        thickness: f32,
    ) -> Result<usize> {
        let corners = [
            Point2::new(x1, y1),
            Point2::new(x2, y1),
            Point2::new(x2, y2),
            Point2::new(x1, y2),
        ];
        self.draw_transient(outline_vertex_count(5, thickness), color, |buffer| {
            tessellate::calculate_polygon_outline(buffer, &corners, thickness, 0)
        })
    }

    pub fn draw_circle(&mut self, cx: f32, cy: f32, r: f32, color: Color, thickness: f32) -> Result<usize> {
        self.draw_elliptic_arc(&EllipticArc::circle(cx, cy, r), color, thickness, None)
    }

    pub fn draw_ellipse(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        color: Color,
        thickness: f32,
    ) -> Result<usize> {
        self.draw_elliptic_arc(&EllipticArc::ellipse(cx, cy, rx, ry), color, thickness, None)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_arc(
        &mut self,
        cx: f32,
        cy: f32,
        r: f32,
        start_theta: f32,
        delta_theta: f32,
        color: Color,
        thickness: f32,
    ) -> Result<usize> {
        let arc = EllipticArc::circle(cx, cy, r).with_sweep(start_theta, delta_theta);
        self.draw_elliptic_arc(&arc, color, thickness, None)
    }

    /// Outlines any elliptic arc. `segments` overrides the quality-derived count.
    pub fn draw_elliptic_arc(
        &mut self,
        arc: &EllipticArc,
        color: Color,
        thickness: f32,
        segments: Option<usize>,
    ) -> Result<usize> {
        let segments = segments.unwrap_or_else(|| self.default_arc_segments(arc));
        let count = outline_vertex_count(segments.saturating_add(1), thickness);
        self.draw_transient(count, color, |buffer| {
            tessellate::calculate_arc(buffer, arc, thickness, 0, segments)
        })
    }

    pub fn draw_spline(
        &mut self,
        control_points: &[Point2<f32>; 4],
        color: Color,
        thickness: f32,
    ) -> Result<usize> {
        let length: f32 = control_points
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .sum();
        let points = self
            .ctx
            .config()
            .spline_points(length, self.ctx.transform().scale_estimate());

        self.draw_transient(outline_vertex_count(points, thickness), color, |buffer| {
            tessellate::calculate_spline(buffer, control_points, thickness, 0, points)
        })
    }

    pub fn draw_ribbon(
        &mut self,
        points: &[Point2<f32>],
        color: Color,
        thickness: f32,
        segment_count: usize,
    ) -> Result<usize> {
        let count = outline_vertex_count(segment_count.saturating_add(1), thickness);
        self.draw_transient(count, color, |buffer| {
            tessellate::calculate_ribbon(buffer, points, thickness, 0, segment_count)
        })
    }

    pub fn draw_filled_triangle(&mut self, corners: [Point2<f32>; 3], color: Color) -> Result<usize> {
        self.draw_transient(3, color, |buffer| {
            tessellate::calculate_filled_triangle(buffer, &corners, 0)
        })
    }

    pub fn draw_filled_rectangle(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    ) -> Result<usize> {
        self.draw_transient(4, color, |buffer| {
            tessellate::calculate_filled_rectangle(
                buffer,
                Point2::new(x1, y1),
                Point2::new(x2, y2),
                0,
            )
        })
    }

    pub fn draw_filled_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Color) -> Result<usize> {
        self.draw_filled_ellipse_with(cx, cy, rx, ry, color, None)
    }

    pub fn draw_filled_circle(&mut self, cx: f32, cy: f32, r: f32, color: Color) -> Result<usize> {
        self.draw_filled_ellipse_with(cx, cy, r, r, color, None)
    }

    /// Filled ellipse; `segments` overrides the quality-derived count.
    pub fn draw_filled_ellipse_with(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        color: Color,
        segments: Option<usize>,
    ) -> Result<usize> {
        let segments = segments.unwrap_or_else(|| {
            self.ctx
                .config()
                .ellipse_segments(rx, ry, self.ctx.transform().scale_estimate())
        });
        self.draw_transient(segments.saturating_add(2), color, |buffer| {
            tessellate::calculate_filled_ellipse(buffer, Point2::new(cx, cy), rx, ry, 0, segments)
        })
    }

    fn default_arc_segments(&self, arc: &EllipticArc) -> usize {
        let config = self.ctx.config();
        let scale = self.ctx.transform().scale_estimate();
        if (arc.delta_theta.abs() - std::f32::consts::TAU).abs() < f32::EPSILON {
            config.ellipse_segments(arc.radius_x, arc.radius_y, scale)
        } else {
            let r = (arc.radius_x.abs() + arc.radius_y.abs()) / 2.0;
            config.arc_segments(r, arc.delta_theta, scale)
        }
    }

    fn draw_transient<F>(&mut self, count: usize, color: Color, calculate: F) -> Result<usize>
    where
        F: FnOnce(&VertexBuffer) -> Result<Emitted>,
    {
        let config = self.ctx.config();
        let buffer = VertexBuffer::create(count, config.transient_storage)?
            .with_unlock_policy(config.unlock_policy);

        let lock = buffer.lock(AccessMode::Write)?;
        let written = calculate(&buffer).and_then(|emitted| {
            for index in emitted.start..emitted.end() {
                buffer.set_color(index, color)?;
            }
            Ok(emitted)
        });
        buffer.unlock_range(lock)?;
        let emitted = written?;

        let drawn = draw_prim(
            &mut self.dispatcher,
            &self.ctx,
            &buffer,
            None,
            emitted.start,
            emitted.end(),
            emitted.primitive,
        );
        buffer.destroy()?;
        drawn
    }
}
