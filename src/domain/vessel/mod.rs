pub mod destination_vessel;
pub mod origin_vessel;
