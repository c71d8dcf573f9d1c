pub mod mechanic;

pub use mechanic::MechanicService;
