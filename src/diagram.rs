//! Static PNG/SVG export of a pathway view, drawn at the entries' positions on
//! the KEGG reference map.

use std::fs;
use std::path::{Path, PathBuf};

use cairo::{Context as CairoContext, Format, ImageSurface, LineCap, SvgSurface};
use pango::{Alignment, FontDescription};
use pangocairo::functions as pangocairo;
use tracing::{debug, info};

use crate::error::{PathwayError, Result};
use crate::graph::{EdgeData, PathwayGraph};
use crate::render::{NodeStyle, VisualGraph};

pub const DEFAULT_PADDING_PX: f64 = 10.0;
const DEFAULT_LINE_WIDTH: f64 = 1.0;
const FONT_MAIN_PX: f64 = 9.0;
const FONT_FAMILY: &str = "Liberation Sans";
const TEXT_OUTLINE_WIDTH: f64 = 0.75;
const ARROW_SIZE: f64 = 6.0;
const BAR_LENGTH: f64 = 8.0;
const ROUND_RECT_RADIUS: f64 = 6.0;
const BORDER_COLOR: (f64, f64, f64) = (0x33 as f64 / 255.0, 0x33 as f64 / 255.0, 0x33 as f64 / 255.0);
const EDGE_COLOR: (f64, f64, f64) = (0x6A as f64 / 255.0, 0x6A as f64 / 255.0, 0x6A as f64 / 255.0);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

/// Top-left origin box in map coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct BBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(Clone, Copy, Debug)]
struct PixelRect {
    x0: f64,
    y0: f64,
    width: f64,
    height: f64,
    center: Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct Transform {
    min_x: f64,
    min_y: f64,
    scale: f64,
}

impl Transform {
    fn map_point(&self, x: f64, y: f64) -> Point {
        Point {
            x: (x - self.min_x) * self.scale,
            y: (y - self.min_y) * self.scale,
        }
    }

    fn scale_scalar(&self, value: f64) -> f64 {
        value * self.scale
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Rectangle,
    RoundRectangle,
    Circle,
}

impl Shape {
    fn from_kgml(value: &str) -> Self {
        match value {
            "circle" => Shape::Circle,
            "roundrectangle" => Shape::RoundRectangle,
            _ => Shape::Rectangle,
        }
    }
}

#[derive(Debug)]
struct DiagramNode {
    id: String,
    bbox: BBox,
    shape: Shape,
    label: String,
    style: NodeStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArrowHead {
    Triangle,
    Bar,
    None,
}

#[derive(Debug)]
struct DiagramEdge {
    from: usize,
    to: usize,
    head: ArrowHead,
    dashed: bool,
}

/// Draw `graph` to a PNG at `output` and an SVG next to it. Returns the SVG
/// path.
pub fn draw_pathway(
    graph: &PathwayGraph,
    visual: &VisualGraph,
    output: &Path,
    padding: f64,
) -> Result<PathBuf> {
    let (nodes, edges) = layout(graph, visual);
    let bounds = compute_bounds(&nodes)?;
    let (transform, width, height) = transform_with_padding(bounds, padding);

    let (surface, ctx) = create_png_surface(width.ceil() as i32, height.ceil() as i32)?;
    render_diagram(&ctx, &transform, &nodes, &edges)?;
    let mut file = fs::File::create(output).map_err(|source| PathwayError::Output {
        path: output.to_path_buf(),
        source,
    })?;
    surface
        .write_to_png(&mut file)
        .map_err(|err| PathwayError::Diagram(format!("failed to write PNG: {err}")))?;

    let svg_path = default_svg_output_path(output);
    render_svg(&svg_path, width, height, |ctx| {
        render_diagram(ctx, &transform, &nodes, &edges)
    })?;
    info!(
        "Drew {} nodes and {} edges to {:?} and {:?}",
        nodes.len(),
        edges.len(),
        output,
        svg_path
    );
    Ok(svg_path)
}

pub fn default_svg_output_path(output: &Path) -> PathBuf {
    let mut svg_path = output.to_path_buf();
    svg_path.set_extension("svg");
    svg_path
}

fn layout(graph: &PathwayGraph, visual: &VisualGraph) -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
    let mut nodes = Vec::new();
    for (node, styled) in graph.nodes().zip(&visual.nodes) {
        let Some(graphics) = node.graphics.as_ref() else {
            continue;
        };
        let (Some(cx), Some(cy)) = (graphics.x, graphics.y) else {
            continue;
        };
        let w = graphics.width.unwrap_or(46.0);
        let h = graphics.height.unwrap_or(17.0);
        nodes.push(DiagramNode {
            id: node.id.clone(),
            bbox: BBox {
                x: cx - w / 2.0,
                y: cy - h / 2.0,
                w,
                h,
            },
            shape: Shape::from_kgml(&graphics.shape),
            label: short_label(&node.label).to_string(),
            style: styled.style,
        });
    }
    let skipped = graph.node_count() - nodes.len();
    if skipped > 0 {
        debug!("{skipped} nodes have no map coordinates and are not drawn");
    }

    let position = |id: &str| nodes.iter().position(|node| node.id == id);
    let edges = graph
        .edges()
        .filter_map(|(from, to, edge)| {
            Some(DiagramEdge {
                from: position(&from.id)?,
                to: position(&to.id)?,
                head: arrow_head(edge),
                dashed: edge.subtype_names().contains(&"indirect effect"),
            })
        })
        .collect();
    (nodes, edges)
}

/// First symbol of a KEGG graphics name such as `APP, AAA, ABETA...`.
fn short_label(label: &str) -> &str {
    label
        .split(',')
        .next()
        .map(|s| s.trim_end_matches("...").trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(label)
}

fn arrow_head(edge: &EdgeData) -> ArrowHead {
    let names = edge.subtype_names();
    if names
        .iter()
        .any(|name| matches!(*name, "inhibition" | "repression"))
    {
        ArrowHead::Bar
    } else if names.iter().any(|name| {
        matches!(
            *name,
            "activation" | "expression" | "indirect effect" | "phosphorylation"
        )
    }) {
        ArrowHead::Triangle
    } else {
        ArrowHead::None
    }
}

fn setup_context(ctx: &CairoContext) -> Result<()> {
    ctx.set_source_rgb(1.0, 1.0, 1.0);
    ctx.paint()?;
    ctx.set_source_rgb(BORDER_COLOR.0, BORDER_COLOR.1, BORDER_COLOR.2);
    ctx.set_line_width(DEFAULT_LINE_WIDTH);
    ctx.set_line_cap(LineCap::Square);
    Ok(())
}

fn create_png_surface(width: i32, height: i32) -> Result<(ImageSurface, CairoContext)> {
    let surface = ImageSurface::create(Format::ARgb32, width.max(1), height.max(1))?;
    let ctx = CairoContext::new(&surface)?;
    setup_context(&ctx)?;
    Ok((surface, ctx))
}

fn render_svg<F>(svg_path: &Path, width: f64, height: f64, render: F) -> Result<()>
where
    F: FnOnce(&CairoContext) -> Result<()>,
{
    let surface = SvgSurface::new(width, height, Some(svg_path))?;
    let ctx = CairoContext::new(&surface)?;
    setup_context(&ctx)?;
    render(&ctx)?;
    surface.finish();
    Ok(())
}

fn render_diagram(
    ctx: &CairoContext,
    transform: &Transform,
    nodes: &[DiagramNode],
    edges: &[DiagramEdge],
) -> Result<()> {
    let rects: Vec<PixelRect> = nodes
        .iter()
        .map(|node| bbox_pixel_rect(transform, node.bbox))
        .collect();

    // Edges first so node shapes sit on top of the lines.
    let arrow_size = transform.scale_scalar(ARROW_SIZE).max(3.0);
    let bar_length = transform.scale_scalar(BAR_LENGTH).max(4.0);
    for edge in edges {
        draw_edge(ctx, rects[edge.from], rects[edge.to], edge, arrow_size, bar_length)?;
    }

    let font_px = transform.scale_scalar(FONT_MAIN_PX).max(6.0);
    for (node, rect) in nodes.iter().zip(&rects) {
        draw_node(ctx, node, *rect, font_px)?;
    }
    Ok(())
}

fn draw_node(ctx: &CairoContext, node: &DiagramNode, rect: PixelRect, font_px: f64) -> Result<()> {
    match node.shape {
        Shape::Rectangle => path_rect(ctx, rect),
        Shape::RoundRectangle => path_round_rect(ctx, rect, ROUND_RECT_RADIUS),
        Shape::Circle => path_ellipse(ctx, rect),
    }
    let (r, g, b) = node.style.rgb();
    ctx.set_source_rgb(r, g, b);
    ctx.fill_preserve()?;
    ctx.set_source_rgb(BORDER_COLOR.0, BORDER_COLOR.1, BORDER_COLOR.2);
    ctx.set_line_width(DEFAULT_LINE_WIDTH);
    ctx.stroke()?;

    // Compound circles are too small to hold text, so their label goes below.
    if node.shape == Shape::Circle {
        let below = Point {
            x: rect.center.x,
            y: rect.y0 + rect.height + font_px * 0.8,
        };
        draw_text_centered(ctx, below, &node.label, font_px)
    } else {
        draw_text_centered(ctx, rect.center, &node.label, font_px)
    }
}

fn draw_edge(
    ctx: &CairoContext,
    from: PixelRect,
    to: PixelRect,
    edge: &DiagramEdge,
    arrow_size: f64,
    bar_length: f64,
) -> Result<()> {
    let start = rect_boundary_point(from, to.center);
    let end = rect_boundary_point(to, from.center);

    ctx.set_source_rgb(EDGE_COLOR.0, EDGE_COLOR.1, EDGE_COLOR.2);
    ctx.set_line_width(DEFAULT_LINE_WIDTH);
    if edge.dashed {
        ctx.set_dash(&[4.0, 3.0], 0.0);
    }
    ctx.move_to(start.x, start.y);
    ctx.line_to(end.x, end.y);
    ctx.stroke()?;
    ctx.set_dash(&[], 0.0);

    match edge.head {
        ArrowHead::Triangle => draw_filled_triangle(ctx, end, start, arrow_size)?,
        ArrowHead::Bar => draw_inhibition_bar(ctx, end, start, bar_length)?,
        ArrowHead::None => {}
    }
    ctx.set_source_rgb(BORDER_COLOR.0, BORDER_COLOR.1, BORDER_COLOR.2);
    Ok(())
}

/// Where the segment from the centre of `rect` towards `toward` leaves the rect.
fn rect_boundary_point(rect: PixelRect, toward: Point) -> Point {
    let dx = toward.x - rect.center.x;
    let dy = toward.y - rect.center.y;
    if dx == 0.0 && dy == 0.0 {
        return rect.center;
    }
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;
    let tx = if dx == 0.0 { f64::INFINITY } else { half_w / dx.abs() };
    let ty = if dy == 0.0 { f64::INFINITY } else { half_h / dy.abs() };
    let t = tx.min(ty).min(1.0);
    Point {
        x: rect.center.x + dx * t,
        y: rect.center.y + dy * t,
    }
}

fn path_rect(ctx: &CairoContext, rect: PixelRect) {
    ctx.new_path();
    ctx.rectangle(rect.x0, rect.y0, rect.width, rect.height);
}

fn path_ellipse(ctx: &CairoContext, rect: PixelRect) {
    let radius_x = (rect.width / 2.0).max(1.0);
    let radius_y = (rect.height / 2.0).max(1.0);
    let _ = ctx.save();
    ctx.new_path();
    ctx.translate(rect.center.x, rect.center.y);
    ctx.scale(radius_x, radius_y);
    ctx.arc(0.0, 0.0, 1.0, 0.0, std::f64::consts::TAU);
    let _ = ctx.restore();
}

fn path_round_rect(ctx: &CairoContext, rect: PixelRect, radius: f64) {
    let radius = radius.min(rect.width / 2.0).min(rect.height / 2.0);
    let (x, y) = (rect.x0, rect.y0);
    let right = x + rect.width;
    let bottom = y + rect.height;

    ctx.new_path();
    ctx.move_to(x + radius, y);
    ctx.line_to(right - radius, y);
    ctx.arc(right - radius, y + radius, radius, -std::f64::consts::FRAC_PI_2, 0.0);
    ctx.line_to(right, bottom - radius);
    ctx.arc(
        right - radius,
        bottom - radius,
        radius,
        0.0,
        std::f64::consts::FRAC_PI_2,
    );
    ctx.line_to(x + radius, bottom);
    ctx.arc(
        x + radius,
        bottom - radius,
        radius,
        std::f64::consts::FRAC_PI_2,
        std::f64::consts::PI,
    );
    ctx.line_to(x, y + radius);
    ctx.arc(
        x + radius,
        y + radius,
        radius,
        std::f64::consts::PI,
        std::f64::consts::FRAC_PI_2 * 3.0,
    );
    ctx.close_path();
}

fn draw_filled_triangle(ctx: &CairoContext, end: Point, prev: Point, size: f64) -> Result<()> {
    let Some((p1, p2, tip)) = triangle_points(end, prev, size) else {
        return Ok(());
    };
    ctx.move_to(p1.x, p1.y);
    ctx.line_to(p2.x, p2.y);
    ctx.line_to(tip.x, tip.y);
    ctx.close_path();
    ctx.fill()?;
    Ok(())
}

fn triangle_points(end: Point, prev: Point, size: f64) -> Option<(Point, Point, Point)> {
    let dx = end.x - prev.x;
    let dy = end.y - prev.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return None;
    }
    let ux = dx / length;
    let uy = dy / length;
    let base_x = end.x - ux * size;
    let base_y = end.y - uy * size;
    let half_width = size * 0.6;
    let p1 = Point {
        x: base_x - uy * half_width,
        y: base_y + ux * half_width,
    };
    let p2 = Point {
        x: base_x + uy * half_width,
        y: base_y - ux * half_width,
    };
    Some((p1, p2, end))
}

fn draw_inhibition_bar(ctx: &CairoContext, end: Point, prev: Point, length: f64) -> Result<()> {
    let dx = end.x - prev.x;
    let dy = end.y - prev.y;
    let seg_len = (dx * dx + dy * dy).sqrt();
    if seg_len == 0.0 {
        return Ok(());
    }
    let half_len = length / 2.0;
    let perp_x = -dy / seg_len;
    let perp_y = dx / seg_len;
    ctx.move_to(end.x - perp_x * half_len, end.y - perp_y * half_len);
    ctx.line_to(end.x + perp_x * half_len, end.y + perp_y * half_len);
    ctx.stroke()?;
    Ok(())
}

fn draw_text_centered(ctx: &CairoContext, center: Point, text: &str, font_px: f64) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let layout = pangocairo::create_layout(ctx);
    let mut font_desc = FontDescription::from_string(FONT_FAMILY);
    font_desc.set_absolute_size(font_px * pango::SCALE as f64);
    layout.set_font_description(Some(&font_desc));
    layout.set_alignment(Alignment::Center);
    layout.set_text(text);

    let (width, height) = layout.pixel_size();
    ctx.move_to(center.x - width as f64 / 2.0, center.y - height as f64 / 2.0);
    pangocairo::layout_path(ctx, &layout);
    if TEXT_OUTLINE_WIDTH > 0.0 {
        ctx.set_source_rgb(1.0, 1.0, 1.0);
        ctx.set_line_width(TEXT_OUTLINE_WIDTH);
        ctx.stroke_preserve()?;
    }
    ctx.set_source_rgb(BORDER_COLOR.0, BORDER_COLOR.1, BORDER_COLOR.2);
    ctx.fill()?;
    ctx.set_line_width(DEFAULT_LINE_WIDTH);
    Ok(())
}

fn bbox_pixel_rect(transform: &Transform, bbox: BBox) -> PixelRect {
    let top_left = transform.map_point(bbox.x, bbox.y);
    let width = transform.scale_scalar(bbox.w).abs();
    let height = transform.scale_scalar(bbox.h).abs();
    PixelRect {
        x0: top_left.x,
        y0: top_left.y,
        width,
        height,
        center: Point {
            x: top_left.x + width / 2.0,
            y: top_left.y + height / 2.0,
        },
    }
}

fn compute_bounds(nodes: &[DiagramNode]) -> Result<Bounds> {
    if nodes.is_empty() {
        return Err(PathwayError::Diagram(
            "no map coordinates found for the selected nodes".to_string(),
        ));
    }
    Ok(nodes.iter().fold(
        Bounds {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        },
        |acc, node| Bounds {
            min_x: acc.min_x.min(node.bbox.x),
            max_x: acc.max_x.max(node.bbox.x + node.bbox.w),
            min_y: acc.min_y.min(node.bbox.y),
            max_y: acc.max_y.max(node.bbox.y + node.bbox.h),
        },
    ))
}

/// Compute a padded transform and canvas size from data bounds. Map units are
/// already pixels on the KEGG reference image, so the scale is 1.
fn transform_with_padding(bounds: Bounds, padding: f64) -> (Transform, f64, f64) {
    let min_x = bounds.min_x - padding;
    let max_x = bounds.max_x + padding;
    let min_y = bounds.min_y - padding;
    let max_y = bounds.max_y + padding;
    let width = (max_x - min_x).abs().max(1.0);
    let height = (max_y - min_y).abs().max(1.0);
    (
        Transform {
            min_x,
            min_y,
            scale: 1.0,
        },
        width,
        height,
    )
}
