pub mod inspection;

pub use inspection::InspectionService;
