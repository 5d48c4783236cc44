pub mod app;
pub mod edge_sampler;
pub mod globe_view;
pub mod render;
pub mod results_view;
pub mod style;
pub mod surface;
pub mod transition;
