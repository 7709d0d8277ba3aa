pub mod organism;
