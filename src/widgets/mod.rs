pub mod chart;
pub mod controls;
pub mod grid;
pub mod selection_panel;
pub mod text_input;
