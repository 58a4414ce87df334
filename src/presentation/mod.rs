// Presentation layer - rendering and page state
pub mod console;
pub mod detail_page;
pub mod fleet_table;
