pub mod vehicle;

pub use vehicle::VehicleService;
