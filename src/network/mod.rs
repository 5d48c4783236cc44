/*
 * This module defines the graph data model shared by the backend client,
 * the render pipeline and the GUI.
 * It also holds the graph store and the optimizer result types.
 */

pub mod node;
pub mod edge;
pub mod path;
pub mod network_graph;
pub mod results;
