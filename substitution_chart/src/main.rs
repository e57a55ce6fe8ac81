use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::analysis::layout::plan_layout;
use crate::analysis::median_bar_chart::{render_svg, ChartLabels};
use crate::data_handling::substitution_scores::SubstitutionDataset;
use crate::helper_functions::open_in_viewer;
use crate::models::Dataset;

mod analysis;
mod data_handling;
mod helper_functions;
mod models;

fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting the substitution chart run");

    // Load and validate the score table
    let config = SubstitutionDataset::discover().load()?;
    let table = config.score_table()?;

    // Order bars within each class and draw
    let layout = plan_layout(&table);
    info!(
        "Planned {} bars, class boundary at {}",
        layout.bars.len(),
        layout.boundary
    );

    render_svg(&config.output, &layout, &ChartLabels::from(&config))?;
    open_in_viewer(&config.output)?;

    Ok(())
}
