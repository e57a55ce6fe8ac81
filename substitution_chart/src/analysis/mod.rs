pub mod layout;
pub mod median_bar_chart;
