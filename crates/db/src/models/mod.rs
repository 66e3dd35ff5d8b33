pub mod background_removal_job;
pub mod color_palette;
pub mod link;
pub mod nylon_fabric_design;
pub mod portfolio_item;
