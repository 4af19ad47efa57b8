pub mod asset_record;
pub mod asset_tracer;
pub mod sig;
pub mod structs;
