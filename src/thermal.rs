pub mod blocks;
pub mod convection;
pub mod cooling;
pub mod diagnostics;
pub mod element;
pub mod lookup;
pub mod material;
pub mod model;
pub mod ode_system;
pub mod state;
pub mod structs;
