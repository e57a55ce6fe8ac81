use std::path::Path;

use anyhow::Result;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontStyle, FontTransform};
use plotters_svg::SVGBackend;
use tracing::info;

use crate::analysis::layout::{ChartLayout, SYNONYMOUS_LABEL};
use crate::data_handling::substitution_scores::ChartConfig;
use crate::models::HydropathyClass;

/// 12 x 6 inch figure at 100 dpi.
pub const FIGURE_SIZE: (u32, u32) = (1200, 600);

const Y_MAX: f64 = 1.05;
const Y_TICKS: usize = 6;
const BAR_HALF_WIDTH: f64 = 0.35;
/// Whisker cap width in pixels.
const CAP_WIDTH: i32 = 10;

const X_LABEL_AREA: u32 = 110;
const Y_LABEL_AREA: u32 = 80;
const RIGHT_LABEL_AREA: u32 = 60;
/// Distance of the rotated y description from the left plot edge, in pixels.
const Y_DESC_INSET: i32 = 62;

/// Offsets below the x axis, as fractions of the plot height.
const DIVIDER_DROP: f64 = 0.18;
const GROUP_LABEL_DROP: f64 = 0.15;

const HYDROPHOBIC_BAND: RGBColor = RGBColor(255, 255, 224);
const HYDROPHILIC_BAND: RGBColor = RGBColor(173, 216, 230);

type ScoreChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Text that frames the chart.
#[derive(Debug, Clone)]
pub struct ChartLabels {
    pub title: String,
    pub y_label: String,
}

impl From<&ChartConfig> for ChartLabels {
    fn from(config: &ChartConfig) -> Self {
        ChartLabels {
            title: config.title.clone(),
            y_label: config.y_label.clone(),
        }
    }
}

fn bold(size: u32) -> FontDesc<'static> {
    ("sans-serif", size).into_font().style(FontStyle::Bold)
}

/// Renders the chart to an SVG file, replacing any existing file at `output_path`.
pub fn render_svg(output_path: &Path, layout: &ChartLayout, labels: &ChartLabels) -> Result<()> {
    let root = SVGBackend::new(output_path, FIGURE_SIZE).into_drawing_area();
    draw_median_bar_chart(&root, layout, labels)?;
    root.present()?;

    info!("Median bar chart saved to {}", output_path.display());
    Ok(())
}

/// Draws the grouped median/IQR bar chart onto `root`.
pub fn draw_median_bar_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    labels: &ChartLabels,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let mut chart = build_chart(root, layout, Some(&labels.title))?;
    draw_axes(&mut chart, layout)?;

    // background bands behind each class block
    let divider = layout.divider_x();
    let x_end = layout.bars.len() as f64 - 0.5;
    chart.draw_series([
        Rectangle::new([(-0.5, 0.0), (divider, Y_MAX)], HYDROPHOBIC_BAND.mix(0.5).filled()),
        Rectangle::new([(divider, 0.0), (x_end, Y_MAX)], HYDROPHILIC_BAND.mix(0.5).filled()),
    ])?;

    draw_bars(&mut chart, layout)?;

    let synonymous_style = ("sans-serif", 15)
        .into_font()
        .style(FontStyle::Italic)
        .color(&BLACK)
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(layout.synonymous_bars().map(|bar| {
        Text::new(SYNONYMOUS_LABEL, (bar.x as f64, bar.record.median + 0.05), synonymous_style.clone())
    }))?;

    // everything outside the plot is placed in pixel space on the root area
    let (plot_x, plot_y) = chart.plotting_area().get_pixel_range();
    let plot_height = (plot_y.end - plot_y.start) as f64;
    let below_axis = |fraction: f64| plot_y.end + (plot_height * fraction).round() as i32;

    let y_desc_style = bold(22)
        .color(&BLACK)
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        labels.y_label.as_str(),
        (plot_x.start - Y_DESC_INSET, (plot_y.start + plot_y.end) / 2),
        y_desc_style,
    ))?;

    let (divider_px, _) = chart.backend_coord(&(divider, 0.0));
    root.draw(&PathElement::new(
        vec![(divider_px, plot_y.start), (divider_px, below_axis(DIVIDER_DROP))],
        BLACK.stroke_width(1),
    ))?;

    let group_style = bold(20).color(&BLACK).pos(Pos::new(HPos::Center, VPos::Center));
    for class in [HydropathyClass::Hydrophobic, HydropathyClass::Hydrophilic] {
        if let Some(center) = layout.group_center(class) {
            let (px, _) = chart.backend_coord(&(center, 0.0));
            root.draw(&Text::new(
                class.label(),
                (px, below_axis(GROUP_LABEL_DROP)),
                group_style.clone(),
            ))?;
        }
    }

    Ok(())
}

/// One slot per bar on x, scores on y, label areas on both sides.
fn build_chart<'a, DB>(
    root: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    title: Option<&str>,
) -> Result<ScoreChart<'a, DB>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = layout.bars.len() as f64;
    let mut builder = ChartBuilder::on(root);
    if let Some(title) = title {
        builder.caption(title, bold(26));
    }
    let chart = builder
        .margin(20)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .right_y_label_area_size(RIGHT_LABEL_AREA)
        .build_cartesian_2d(-0.5..(n - 0.5), 0f64..Y_MAX)?;
    Ok(chart)
}

/// Symbol ticks under the bars and one set of score ticks, mirrored on the right.
fn draw_axes<DB>(chart: &mut ScoreChart<'_, DB>, layout: &ChartLayout) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let symbol_label = |v: &f64| layout.symbol_at(*v).map(|aa| aa.to_string()).unwrap_or_default();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(layout.bars.len())
        .x_label_formatter(&symbol_label)
        .x_label_style(bold(20))
        .y_labels(Y_TICKS)
        .y_label_formatter(&|v| format!("{v:.1}"))
        .y_label_style(bold(18))
        .draw()?;
    Ok(())
}

/// Filled bars, their outlines, then the interquartile whiskers on top.
fn draw_bars<DB>(chart: &mut ScoreChart<'_, DB>, layout: &ChartLayout) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    chart.draw_series(layout.bars.iter().map(|bar| {
        let x = bar.x as f64;
        Rectangle::new(
            [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, bar.record.median)],
            bar.color.filled(),
        )
    }))?;
    chart.draw_series(layout.bars.iter().map(|bar| {
        let x = bar.x as f64;
        Rectangle::new(
            [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, bar.record.median)],
            BLACK.stroke_width(1),
        )
    }))?;

    chart.draw_series(layout.bars.iter().map(|bar| {
        let x = bar.x as f64;
        PathElement::new(vec![(x, bar.error_low()), (x, bar.error_high())], BLACK.stroke_width(1))
    }))?;
    let half_cap = CAP_WIDTH / 2;
    chart.draw_series(layout.bars.iter().flat_map(|bar| {
        [bar.error_low(), bar.error_high()].map(|y| {
            EmptyElement::at((bar.x as f64, y))
                + PathElement::new(vec![(-half_cap, 0), (half_cap, 0)], BLACK.stroke_width(1))
        })
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::layout::plan_layout;

    fn bundled() -> (ChartLayout, ChartLabels) {
        let config = ChartConfig::bundled().unwrap();
        let layout = plan_layout(&config.score_table().unwrap());
        (layout, ChartLabels::from(&config))
    }

    /// Axes and bars without the caption, which is the only part that needs system fonts.
    fn render_plot(layout: &ChartLayout, with_axes: bool, with_bars: bool) -> String {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, FIGURE_SIZE).into_drawing_area();
            let mut chart = build_chart(&root, layout, None).unwrap();
            if with_axes {
                draw_axes(&mut chart, layout).unwrap();
            }
            if with_bars {
                draw_bars(&mut chart, layout).unwrap();
            }
            root.present().unwrap();
        }
        svg
    }

    /// `(y attribute, content)` of every `<text>` node.
    fn text_nodes(svg: &str) -> Vec<(String, String)> {
        svg.split("<text ")
            .skip(1)
            .filter_map(|chunk| {
                let (attrs, rest) = chunk.split_once('>')?;
                let body = rest.split("</text>").next()?.trim().to_string();
                let y = attrs.split("y=\"").nth(1)?.split('"').next()?.to_string();
                Some((y, body))
            })
            .collect()
    }

    #[test]
    fn labels_come_from_config() {
        let (_, labels) = bundled();
        assert_eq!(labels.title, "W>amino acid substitutions");
        assert_eq!(labels.y_label, "Scores");
    }

    #[test]
    fn whiskers_are_capped_lines_without_markers() {
        let (layout, _) = bundled();
        let svg = render_plot(&layout, false, true);
        assert_eq!(svg.matches("<circle").count(), 0);
        // one whisker and two caps per bar
        assert_eq!(svg.matches("<polyline").count(), 3 * layout.bars.len());
        // filled bar plus outline
        assert_eq!(svg.matches("<rect").count(), 2 * layout.bars.len());
    }

    #[test]
    fn symbol_ticks_name_every_bar() {
        let (layout, _) = bundled();
        let texts = text_nodes(&render_plot(&layout, true, false));
        assert!(texts.iter().all(|(_, body)| !body.is_empty()));

        let symbols: String = texts
            .iter()
            .filter(|(_, body)| body.len() == 1)
            .map(|(_, body)| body.as_str())
            .collect();
        assert_eq!(symbols, "WFLGVAIMCPYSTHNRQEDK");
    }

    #[test]
    fn score_ticks_line_up_on_both_sides() {
        let (layout, _) = bundled();
        let texts = text_nodes(&render_plot(&layout, true, false));
        for tick in ["0.0", "0.2", "0.4", "0.6", "0.8", "1.0"] {
            let rows: Vec<&String> =
                texts.iter().filter(|(_, body)| body == tick).map(|(y, _)| y).collect();
            assert_eq!(rows.len(), 2, "{tick} should appear on the left and right axis");
            assert_eq!(rows[0], rows[1], "{tick} is drawn at different heights");
        }
    }

    #[test]
    #[ignore = "text layout needs system fonts"]
    fn svg_contains_annotation_and_group_labels() {
        let (layout, labels) = bundled();
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, FIGURE_SIZE).into_drawing_area();
            draw_median_bar_chart(&root, &layout, &labels).unwrap();
            root.present().unwrap();
        }
        assert_eq!(svg.matches(SYNONYMOUS_LABEL).count(), 1);
        assert_eq!(svg.matches("Scores").count(), 1);
        assert!(svg.contains("Hydrophobic amino acids"));
        assert!(svg.contains("Hydrophilic amino acids"));
        assert!(svg.contains("rotate("));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    #[ignore = "text layout needs system fonts"]
    fn render_svg_overwrites_existing_file() {
        let (layout, labels) = bundled();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        std::fs::write(&path, "stale").unwrap();

        render_svg(&path, &layout, &labels).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<svg"));
        assert!(!written.contains("stale"));
    }
}
