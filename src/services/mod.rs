pub mod catalog;
pub mod checkout_link_service;
pub mod media;
