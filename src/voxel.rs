pub mod emit;
pub mod grid;
pub mod palette;
pub mod schematic;
