use svg::Document;
use svg::node::element::{Circle, Ellipse, Group, Line, Rectangle, Text, Title};

use crate::collision_detection::ZoneOutline;
use crate::entities::{EnvelopeOutline, PackingResult};
use crate::io::svg::svg_util;
use crate::io::svg::svg_util::SvgDrawOptions;

/// Draws the envelope, its reserve zones, the placed tiles and (for grid envelopes) the cell boundaries.
pub fn result_to_svg(result: &PackingResult, options: SvgDrawOptions, title: &str) -> Document {
    let envelope = result.envelope();
    let bbox = envelope.bbox();
    let theme = &options.theme;

    let min_dim = f64::min(bbox.width(), bbox.height());
    let margin = 0.05 * min_dim;
    let stroke_width = min_dim * 0.001 * theme.stroke_width_multiplier;

    let label = {
        //print some information above the top left of the envelope
        let label_content = format!(
            "width: {} | height: {} | tiles: {} | efficiency: {:.3}% | {}",
            envelope.width,
            envelope.height,
            result.tiles().len(),
            result.efficiency() * 100.0,
            title,
        );
        Text::new(label_content)
            .set("x", bbox.x_min)
            .set("y", bbox.y_min - 0.5 * 0.025 * min_dim)
            .set("font-size", 0.025 * min_dim)
            .set("font-family", "monospace")
            .set("font-weight", "500")
    };

    let envelope_group = {
        let group = Group::new().set("id", "envelope").add(Title::new(format!(
            "envelope, {:?}, {}x{}",
            envelope.shape, envelope.width, envelope.height
        )));
        let fill = format!("{}", theme.envelope_fill);
        let stroke = format!("{}", 2.0 * stroke_width);
        match envelope.outline() {
            EnvelopeOutline::Rect(r) => group.add(
                Rectangle::new()
                    .set("x", r.x_min)
                    .set("y", r.y_min)
                    .set("width", r.width())
                    .set("height", r.height())
                    .set("fill", fill)
                    .set("stroke", "black")
                    .set("stroke-width", stroke),
            ),
            EnvelopeOutline::Ellipse(e) => group.add(
                Ellipse::new()
                    .set("cx", e.center.0)
                    .set("cy", e.center.1)
                    .set("rx", e.rx)
                    .set("ry", e.ry)
                    .set("fill", fill)
                    .set("stroke", "black")
                    .set("stroke-width", stroke),
            ),
        }
    };

    let reserve_group = {
        let mut group = Group::new().set("id", "reserves");
        let fill = format!("{}", theme.reserve_fill);
        let stroke_color = format!("{}", svg_util::change_brightness(theme.reserve_fill, 0.5));
        for hazard in result.reserves().iter() {
            let title = Title::new(format!(
                "reserve, {:?}, anchor: {:?}",
                hazard.zone.shape, hazard.zone.anchor
            ));
            let style = [
                ("fill", fill.clone()),
                ("fill-opacity", "0.50".to_string()),
                ("stroke", stroke_color.clone()),
                ("stroke-width", format!("{}", 2.0 * stroke_width)),
                ("stroke-opacity", format!("{}", theme.reserve_stroke_opac)),
                ("stroke-dasharray", format!("{}", 5.0 * stroke_width)),
            ];
            group = match hazard.outline {
                ZoneOutline::Rect(r) => {
                    let mut shape = Rectangle::new()
                        .set("x", r.x_min)
                        .set("y", r.y_min)
                        .set("width", r.width())
                        .set("height", r.height());
                    for (k, v) in style {
                        shape = shape.set(k, v);
                    }
                    group.add(shape.add(title))
                }
                ZoneOutline::Circle(c) => {
                    let mut shape = Circle::new()
                        .set("cx", c.center.0)
                        .set("cy", c.center.1)
                        .set("r", c.radius);
                    for (k, v) in style {
                        shape = shape.set(k, v);
                    }
                    group.add(shape.add(title))
                }
            };
        }
        group
    };

    let tile_group = {
        let mut group = Group::new().set("id", "tiles");
        let fill = format!("{}", theme.tile_fill);
        let stroke_color = format!("{}", svg_util::change_brightness(theme.tile_fill, 0.5));
        for tile in result.tiles() {
            let rect = Rectangle::new()
                .set("x", tile.x)
                .set("y", tile.y)
                .set("width", tile.width)
                .set("height", tile.height)
                .set("fill", fill.as_str())
                .set("stroke", stroke_color.as_str())
                .set("stroke-width", stroke_width)
                .add(Title::new(format!("tile #{} at ({}, {})", tile.seq, tile.x, tile.y)));
            group = group.add(rect);
            if options.tile_labels {
                let font_size = 0.3 * f64::min(tile.width as f64, tile.height as f64);
                group = group.add(
                    Text::new(format!("{}", tile.seq))
                        .set("x", tile.x as f64 + 0.5 * tile.width as f64)
                        .set("y", tile.y as f64 + 0.5 * tile.height as f64)
                        .set("font-size", font_size)
                        .set("font-family", "monospace")
                        .set("text-anchor", "middle")
                        .set("dominant-baseline", "middle"),
                );
            }
        }
        group
    };

    let grid_group = {
        let mut group = Group::new().set("id", "grid_lines");
        if let (true, Some(grid)) = (options.grid_lines, result.grid()) {
            let stroke = format!("{}", theme.grid_stroke);
            let (x_end, y_end) = (grid.cols * grid.cell_width, grid.rows * grid.cell_height);
            let line = |x1: u32, y1: u32, x2: u32, y2: u32| {
                Line::new()
                    .set("x1", x1)
                    .set("y1", y1)
                    .set("x2", x2)
                    .set("y2", y2)
                    .set("stroke", stroke.as_str())
                    .set("stroke-width", 0.5 * stroke_width)
                    .set("stroke-opacity", "0.3")
            };
            for x in grid.col_boundaries() {
                group = group.add(line(x, 0, x, y_end));
            }
            for y in grid.row_boundaries() {
                group = group.add(line(0, y, x_end, y));
            }
        }
        group
    };

    let vbox = (
        bbox.x_min - margin,
        bbox.y_min - margin,
        bbox.width() + 2.0 * margin,
        bbox.height() + 2.0 * margin,
    );

    Document::new()
        .set("viewBox", vbox)
        .add(envelope_group)
        .add(reserve_group)
        .add(tile_group)
        .add(grid_group)
        .add(label)
}
