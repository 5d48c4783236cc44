use std::sync::Arc;

use eframe::egui;
use egui::{
    CentralPanel, CollapsingHeader, ComboBox, Context, DragValue, RichText, ScrollArea, SidePanel,
    Slider, TopBottomPanel, Ui,
};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::backend::PathBackend;
use crate::backend::wire::GenerateRequest;
use crate::settings::AppConfig;
use crate::gui::edge_sampler::EdgeSampler;
use crate::gui::globe_view::GlobeView;
use crate::gui::render::RenderPipeline;
use crate::network::node::NodeId;
use crate::network::results::{Algorithm, Weights};
use crate::orchestrator::control::Operation;
use crate::orchestrator::state::{AppState, NotificationLevel};
use crate::orchestrator::{Orchestrator, OrchestratorError};

pub fn main(
    rt: Arc<Runtime>,
    config: AppConfig,
    backend: Arc<dyn PathBackend>,
) -> Result<(), eframe::Error> {
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Network Path Optimizer",
        native_options,
        Box::new(move |cc| {
            catppuccin_egui::set_theme(&cc.egui_ctx, catppuccin_egui::MOCHA);
            match App::new(rt, &config, backend) {
                Ok(app) => Ok(Box::new(app) as Box<dyn eframe::App>),
                Err(e) => Err(e.into()),
            }
        }),
    )
}

/// Values of the side panel inputs.
struct Inputs {
    num_nodes: u32,
    connection_prob: f64,
    use_seed: bool,
    seed: u64,
    use_dataset: bool,
    source: NodeId,
    destination: NodeId,
    algorithm: Algorithm,
    weights: Weights,
    num_tests: u32,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            num_nodes: 250,
            connection_prob: 0.4,
            use_seed: false,
            seed: 42,
            use_dataset: false,
            source: 0,
            destination: 1,
            algorithm: Algorithm::default(),
            weights: Weights::default(),
            num_tests: 20,
        }
    }
}

impl Inputs {
    fn generate_request(&self) -> GenerateRequest {
        if self.use_dataset {
            GenerateRequest::dataset()
        } else {
            let seed = self.use_seed.then_some(self.seed);
            GenerateRequest::random(self.num_nodes, self.connection_prob, seed)
        }
    }
}

struct App {
    // Keeps the runtime alive for the spawned backend calls
    _runtime: Arc<Runtime>,
    orchestrator: Orchestrator,
    state: AppState,
    globe: GlobeView,
    inputs: Inputs,
}

impl App {
    fn new(
        runtime: Arc<Runtime>,
        config: &AppConfig,
        backend: Arc<dyn PathBackend>,
    ) -> Result<Self, crate::settings::ConfigError> {
        let settings = config.orchestrator_settings()?;
        let sampler = EdgeSampler::new(config.render.edge_cap, config.render.sampler_seed);
        let pipeline = RenderPipeline::new(sampler, config.focus_settings());
        let orchestrator = Orchestrator::new(backend, runtime.handle().clone(), settings);
        info!(
            "[app] started, request timeout {}",
            humantime::format_duration(settings.request_timeout)
        );

        Ok(Self {
            _runtime: runtime,
            orchestrator,
            state: AppState::new(pipeline),
            globe: GlobeView::default(),
            inputs: Inputs {
                num_tests: settings.max_tests,
                ..Default::default()
            },
        })
    }

    /// Validation failures are already turned into notifications by the orchestrator.
    fn report(result: Result<(), OrchestratorError>) {
        if let Err(err) = result {
            debug!("[app] trigger rejected: {err}");
        }
    }

    fn action_button(&self, ui: &mut Ui, op: Operation) -> bool {
        let controls = self.orchestrator.controls();
        ui.add_enabled(controls.is_enabled(op), egui::Button::new(controls.label(op)))
            .clicked()
    }

    fn render_network_section(&mut self, ui: &mut Ui) {
        CollapsingHeader::new("Network").default_open(true).show(ui, |ui| {
            ui.checkbox(&mut self.inputs.use_dataset, "Use built-in dataset");
            ui.add_enabled_ui(!self.inputs.use_dataset, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Nodes");
                    ui.add(DragValue::new(&mut self.inputs.num_nodes).range(2..=2000));
                });
                ui.add(
                    Slider::new(&mut self.inputs.connection_prob, 0.01..=1.0)
                        .text("Connection probability"),
                );
                ui.horizontal(|ui| {
                    ui.checkbox(&mut self.inputs.use_seed, "Seed");
                    ui.add_enabled(self.inputs.use_seed, DragValue::new(&mut self.inputs.seed));
                });
            });
            if self.action_button(ui, Operation::Generate) {
                info!("[app] Pressed generate button");
                let request = self.inputs.generate_request();
                Self::report(self.orchestrator.generate(&mut self.state, request));
            }
            if let Some(graph) = self.state.store.graph() {
                ui.label(format!("{} nodes, {} edges", graph.nodes().len(), graph.edges().len()));
                let stats = self.state.pipeline.stats();
                ui.label(
                    RichText::new(format!(
                        "Drawing {} of {} edges",
                        stats.path_arcs + stats.background_arcs,
                        graph.edges().len()
                    ))
                    .weak(),
                );
            }
        });
    }

    fn render_path_section(&mut self, ui: &mut Ui) {
        CollapsingHeader::new("Path").default_open(true).show(ui, |ui| {
            let max_id = self.state.store.graph().and_then(|g| g.max_node_id()).unwrap_or(0);
            ui.horizontal(|ui| {
                ui.label("Source");
                ui.add(DragValue::new(&mut self.inputs.source).range(0..=max_id));
                ui.label("Destination");
                ui.add(DragValue::new(&mut self.inputs.destination).range(0..=max_id));
            });
            if let Some((first, last)) = self.state.store.selection_endpoints()
                && ui
                    .small_button("Use selected nodes")
                    .on_hover_text("Lowest selected id becomes the source, highest the destination")
                    .clicked()
            {
                self.inputs.source = first;
                self.inputs.destination = last;
            }

            ComboBox::from_label("Algorithm")
                .selected_text(self.inputs.algorithm.display_name())
                .show_ui(ui, |ui| {
                    for algorithm in Algorithm::ALL {
                        ui.selectable_value(
                            &mut self.inputs.algorithm,
                            algorithm,
                            algorithm.display_name(),
                        );
                    }
                });

            let weights = &mut self.inputs.weights;
            ui.add(Slider::new(&mut weights.delay, 0.0..=1.0).text("Delay weight"));
            ui.add(Slider::new(&mut weights.reliability, 0.0..=1.0).text("Reliability weight"));
            ui.add(Slider::new(&mut weights.resource, 0.0..=1.0).text("Resource weight"));
            let sum = self.inputs.weights.sum();
            let sum_text = RichText::new(format!("Sum: {sum:.2}"));
            ui.label(if self.inputs.weights.is_normalized() {
                sum_text
            } else {
                sum_text.color(catppuccin_egui::MOCHA.red)
            });

            ui.horizontal(|ui| {
                let (source, destination, weights) =
                    (self.inputs.source, self.inputs.destination, self.inputs.weights);
                if self.action_button(ui, Operation::Optimize) {
                    info!("[app] Pressed optimize button");
                    let algorithm = self.inputs.algorithm;
                    Self::report(self.orchestrator.optimize(
                        &mut self.state,
                        source,
                        destination,
                        algorithm,
                        weights,
                    ));
                }
                if self.action_button(ui, Operation::Compare) {
                    info!("[app] Pressed compare button");
                    Self::report(
                        self.orchestrator
                            .compare(&mut self.state, source, destination, weights),
                    );
                }
            });
        });
    }

    fn render_tests_section(&mut self, ui: &mut Ui) {
        let max_tests = self.orchestrator.settings().max_tests;
        CollapsingHeader::new("Batch tests").default_open(false).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("Test cases");
                ui.add(DragValue::new(&mut self.inputs.num_tests).range(1..=max_tests));
            });
            if self.action_button(ui, Operation::RunTests) {
                info!("[app] Pressed run tests button");
                Self::report(self.orchestrator.run_tests(&mut self.state, self.inputs.num_tests));
            }
        });
    }

    fn render_notifications(&mut self, ui: &mut Ui) {
        let mut dismiss = false;
        ui.horizontal(|ui| {
            if let Some(note) = self.state.latest_notification() {
                let color = match note.level {
                    NotificationLevel::Info => catppuccin_egui::MOCHA.green,
                    NotificationLevel::Warning => catppuccin_egui::MOCHA.yellow,
                    NotificationLevel::Error => catppuccin_egui::MOCHA.red,
                };
                ui.label(RichText::new(&note.message).color(color))
                    .on_hover_ui(|ui| {
                        for note in self.state.notifications() {
                            ui.label(format!("{}  {}", note.timestamp(), note.message));
                        }
                    });
                dismiss = ui.small_button("✕").clicked();
            }
        });
        if dismiss {
            self.state.dismiss_notifications();
        }
    }

    fn render(&mut self, ctx: &Context) {
        SidePanel::left("controls").resizable(true).show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Path optimizer");
                ui.separator();
                self.render_network_section(ui);
                ui.separator();
                self.render_path_section(ui);
                ui.separator();
                self.render_tests_section(ui);
            });
        });

        SidePanel::right("results")
            .resizable(true)
            .default_width(380.0)
            .show_animated(ctx, self.state.results.visible, |ui| {
                ScrollArea::vertical().show(ui, |ui| self.state.results.ui(ui));
            });

        TopBottomPanel::bottom("status").show(ctx, |ui| self.render_notifications(ui));

        CentralPanel::default().show(ctx, |ui| {
            let response = self.globe.show(ui);
            if let Some(id) = response.clicked {
                self.state.pipeline.set_selection(&mut self.state.store, id, &mut self.globe);
            }
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &Context, _: &mut eframe::Frame) {
        let applied = self.orchestrator.poll(&mut self.state, &mut self.globe);
        if applied > 0 {
            debug!("[app] applied {applied} completed operations");
        }
        self.render(ctx);
        if self.orchestrator.controls().any_pending() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
