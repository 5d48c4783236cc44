//! Result panels for single optimizations, algorithm comparisons and test statistics.
//!
//! The `*View` structs hold pre-formatted rows so the formatting can be tested without a
//! running egui context.

use egui::{ProgressBar, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::network::results::{ComparisonResult, OptimizationResult, TestStatistics};

/// Width of a comparison bar relative to the largest cost in the set, in percent.
pub fn relative_bar_percentage(cost: f64, max_cost: f64) -> f64 {
    if max_cost == 0.0 {
        0.0
    } else {
        cost / max_cost * 100.0
    }
}

fn reliability_percent(reliability: f64) -> String {
    format!("{:.2}%", reliability * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathResultView {
    pub algorithm: String,
    pub path_length: usize,
    pub route: String,
    pub cost: String,
    pub total_delay: String,
    pub total_reliability: String,
    pub resource_cost: String,
    pub execution_time: String,
}

impl From<&OptimizationResult> for PathResultView {
    fn from(result: &OptimizationResult) -> Self {
        Self {
            algorithm: result.algorithm.clone(),
            path_length: result.path.len(),
            route: result.path.to_string(),
            cost: format!("{:.4}", result.cost),
            total_delay: format!("{:.2} ms", result.metrics.total_delay),
            total_reliability: reliability_percent(result.metrics.total_reliability),
            resource_cost: format!("{:.4}", result.metrics.resource_cost),
            execution_time: format!("{:.3} s", result.execution_time),
        }
    }
}

impl PathResultView {
    fn rows(&self) -> [(&'static str, String); 7] {
        [
            ("Algorithm", self.algorithm.clone()),
            ("Path length", format!("{} nodes", self.path_length)),
            ("Cost", self.cost.clone()),
            ("Total delay", self.total_delay.clone()),
            ("Reliability", self.total_reliability.clone()),
            ("Resource cost", self.resource_cost.clone()),
            ("Execution time", self.execution_time.clone()),
        ]
    }

    pub fn show(&self, ui: &mut Ui) {
        egui::Grid::new("path_result_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (name, value) in self.rows() {
                    ui.label(name);
                    ui.label(RichText::new(value).monospace());
                    ui.end_row();
                }
            });
        ui.add_space(4.0);
        ui.label(RichText::new(&self.route).strong());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub algorithm: String,
    pub cost: f64,
    pub total_delay: f64,
    pub total_reliability: f64,
    pub execution_time: f64,
    pub path_length: usize,
    /// Bar width in percent of the largest cost.
    pub bar_percentage: f64,
    pub best: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonView {
    pub rows: Vec<ComparisonRow>,
}

impl From<&ComparisonResult> for ComparisonView {
    fn from(comparison: &ComparisonResult) -> Self {
        let max_cost = comparison.max_cost();
        let best = comparison.best().map(|b| b.algorithm.as_str());
        let rows = comparison
            .iter()
            .map(|r| ComparisonRow {
                algorithm: r.algorithm.clone(),
                cost: r.cost,
                total_delay: r.metrics.total_delay,
                total_reliability: r.metrics.total_reliability,
                execution_time: r.execution_time,
                path_length: r.path.len(),
                bar_percentage: relative_bar_percentage(r.cost, max_cost),
                best: best == Some(r.algorithm.as_str()),
            })
            .collect();
        Self { rows }
    }
}

impl ComparisonView {
    pub fn show(&self, ui: &mut Ui) {
        ui.push_id("comparison_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto())
                .column(Column::auto())
                .column(Column::remainder().at_least(80.0))
                .column(Column::auto())
                .column(Column::auto())
                .column(Column::auto())
                .column(Column::auto())
                .header(20.0, |mut header| {
                    for title in ["Algorithm", "Cost", "", "Delay", "Reliability", "Time", "Hops"] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for row in &self.rows {
                        body.row(18.0, |mut table_row| {
                            table_row.col(|ui| {
                                let name = RichText::new(&row.algorithm);
                                ui.label(if row.best { name.strong() } else { name });
                            });
                            table_row.col(|ui| {
                                ui.monospace(format!("{:.4}", row.cost));
                            });
                            table_row.col(|ui| {
                                ui.add(ProgressBar::new((row.bar_percentage / 100.0) as f32));
                            });
                            table_row.col(|ui| {
                                ui.monospace(format!("{:.2} ms", row.total_delay));
                            });
                            table_row.col(|ui| {
                                ui.monospace(reliability_percent(row.total_reliability));
                            });
                            table_row.col(|ui| {
                                ui.monospace(format!("{:.3} s", row.execution_time));
                            });
                            table_row.col(|ui| {
                                ui.monospace(row.path_length.to_string());
                            });
                        });
                    }
                });
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRow {
    pub algorithm: String,
    pub runs: usize,
    pub mean_cost: f64,
    pub std_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub mean_time: f64,
    pub std_time: f64,
    pub mean_reliability: f64,
    pub mean_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestStatisticsView {
    pub num_tests: usize,
    pub rows: Vec<StatisticsRow>,
}

impl From<&TestStatistics> for TestStatisticsView {
    fn from(stats: &TestStatistics) -> Self {
        let rows = stats
            .entries
            .iter()
            .map(|(name, s)| StatisticsRow {
                algorithm: name.clone(),
                runs: stats.runs_per_algorithm.get(name).copied().unwrap_or(0),
                mean_cost: s.mean_cost,
                std_cost: s.std_cost,
                min_cost: s.min_cost,
                max_cost: s.max_cost,
                mean_time: s.mean_time,
                std_time: s.std_time,
                mean_reliability: s.mean_reliability,
                mean_delay: s.mean_delay,
            })
            .collect();
        Self {
            num_tests: stats.num_tests,
            rows,
        }
    }
}

impl TestStatisticsView {
    /// One summary line per algorithm: runs, mean reliability and mean delay.
    pub fn summary_lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| {
                format!(
                    "{}: {} runs, reliability {}, delay {:.2} ms",
                    r.algorithm,
                    r.runs,
                    reliability_percent(r.mean_reliability),
                    r.mean_delay
                )
            })
            .collect()
    }

    pub fn show(&self, ui: &mut Ui) {
        ui.label(format!("Completed tests: {}", self.num_tests));
        ui.push_id("statistics_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .columns(Column::auto(), 7)
                .header(20.0, |mut header| {
                    let titles = [
                        "Algorithm",
                        "Runs",
                        "Mean cost",
                        "Std",
                        "Min",
                        "Max",
                        "Mean time",
                    ];
                    for title in titles {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for row in &self.rows {
                        body.row(18.0, |mut table_row| {
                            table_row.col(|ui| {
                                ui.label(&row.algorithm);
                            });
                            table_row.col(|ui| {
                                ui.monospace(row.runs.to_string());
                            });
                            for value in [row.mean_cost, row.std_cost, row.min_cost, row.max_cost] {
                                table_row.col(|ui| {
                                    ui.monospace(format!("{value:.4}"));
                                });
                            }
                            table_row.col(|ui| {
                                ui.monospace(format!(
                                    "{:.3} ± {:.3} s",
                                    row.mean_time, row.std_time
                                ));
                            });
                        });
                    }
                });
        });
        ui.add_space(6.0);
        ui.collapsing("Summary", |ui| {
            for line in self.summary_lines() {
                ui.label(line);
            }
        });
    }
}

/// Holds whichever results were produced last; hidden until the first result arrives.
#[derive(Debug, Default)]
pub struct ResultsPanel {
    pub visible: bool,
    pub path: Option<PathResultView>,
    pub comparison: Option<ComparisonView>,
    pub statistics: Option<TestStatisticsView>,
}

impl ResultsPanel {
    pub fn show_path_result(&mut self, result: &OptimizationResult) {
        self.path = Some(result.into());
        self.visible = true;
    }

    pub fn show_comparison(&mut self, comparison: &ComparisonResult) {
        self.comparison = Some(comparison.into());
        self.visible = true;
    }

    pub fn show_test_statistics(&mut self, stats: &TestStatistics) {
        self.statistics = Some(stats.into());
        self.visible = true;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn ui(&mut self, ui: &mut Ui) {
        if !self.visible {
            return;
        }
        if let Some(path) = &self.path {
            ui.heading("Optimized path");
            path.show(ui);
            ui.separator();
        }
        if let Some(comparison) = &self.comparison {
            ui.heading("Algorithm comparison");
            comparison.show(ui);
            ui.separator();
        }
        if let Some(statistics) = &self.statistics {
            ui.heading("Test statistics");
            statistics.show(ui);
        }
    }
}
