pub mod campaigns;
pub mod products;
